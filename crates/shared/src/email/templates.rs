//! HTML bodies for transactional emails.

use crate::types::Money;

/// Everything a payment confirmation email needs.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    /// Recipient address.
    pub to: String,
    /// Customer display name.
    pub customer_name: String,
    /// Plan display name (e.g. `Pro`).
    pub plan_name: String,
    /// Amount charged.
    pub amount: Money,
    /// Provider receipt / confirmation code.
    pub receipt_number: Option<String>,
    /// Display name of the payment method (e.g. `M-Pesa`).
    pub payment_method: String,
}

/// Everything a payment failure email needs.
#[derive(Debug, Clone)]
pub struct PaymentFailure {
    /// Recipient address.
    pub to: String,
    /// Customer display name.
    pub customer_name: String,
    /// Plan display name.
    pub plan_name: String,
    /// Amount that was attempted.
    pub amount: Money,
    /// Provider-reported reason.
    pub error_message: Option<String>,
}

/// Escapes text for inclusion in HTML element content and attributes.
pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(app_name: &str, heading: &str, body: &str) -> String {
    let app_name = escape_html(app_name);
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
  </head>
  <body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 30px; text-align: center; border-radius: 10px 10px 0 0;">
      <h1 style="color: white; margin: 0; font-size: 28px;">{heading}</h1>
    </div>
    <div style="background: #ffffff; padding: 30px; border: 1px solid #e5e7eb; border-top: none; border-radius: 0 0 10px 10px;">
{body}
      <p style="color: #6b7280; font-size: 14px;">Best regards,<br>The {app_name} Team</p>
    </div>
  </body>
</html>"#
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"      <div style="text-align: center; margin: 30px 0;">
        <a href="{}" style="background: #2563eb; color: white; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; display: inline-block;">{label}</a>
      </div>"#,
        escape_html(href)
    )
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        r#"        <tr><td style="padding: 12px 0; border-bottom: 1px solid #f3f4f6; color: #6b7280;">{label}</td><td style="padding: 12px 0; border-bottom: 1px solid #f3f4f6; text-align: right; font-weight: bold; color: #111827;">{}</td></tr>"#,
        escape_html(value)
    )
}

/// Email verification body.
pub fn verification(app_name: &str, name: &str, verification_url: &str) -> String {
    let body = format!(
        r#"      <h2 style="color: #1f2937; margin-top: 0;">Hi {name}!</h2>
      <p style="font-size: 16px;">Welcome to {app}! Please verify your email address to get started.</p>
{button}
      <p style="color: #6b7280; font-size: 14px;">Or copy and paste this link into your browser:</p>
      <p style="color: #667eea; font-size: 14px; word-break: break-all;">{url}</p>
      <p style="color: #9ca3af; font-size: 12px;">This link will expire in 24 hours. If you didn't create an account, you can safely ignore this email.</p>"#,
        name = escape_html(name),
        app = escape_html(app_name),
        button = button(verification_url, "Verify Email Address"),
        url = escape_html(verification_url),
    );
    layout(app_name, app_name, &body)
}

/// Password reset body.
pub fn password_reset(app_name: &str, name: &str, reset_url: &str) -> String {
    let body = format!(
        r#"      <h2 style="color: #1f2937; margin-top: 0;">Hi {name}!</h2>
      <p style="font-size: 16px;">We received a request to reset your password. Click the button below to create a new password.</p>
{button}
      <p style="color: #6b7280; font-size: 14px;">Or copy and paste this link into your browser:</p>
      <p style="color: #667eea; font-size: 14px; word-break: break-all;">{url}</p>
      <p style="color: #9ca3af; font-size: 12px;">If you didn't request a password reset, you can safely ignore this email. Your password will not be changed.</p>
      <p style="color: #9ca3af; font-size: 12px;">This link will expire in 1 hour.</p>"#,
        name = escape_html(name),
        button = button(reset_url, "Reset Password"),
        url = escape_html(reset_url),
    );
    layout(app_name, app_name, &body)
}

/// Welcome body sent after verification.
pub fn welcome(app_name: &str, name: &str, dashboard_url: &str) -> String {
    let body = format!(
        r#"      <h2 style="color: #1f2937; margin-top: 0;">Welcome, {name}!</h2>
      <p style="font-size: 16px;">You're all set! Here's what you can do with {app}:</p>
      <ul style="font-size: 16px; line-height: 1.8;">
        <li>Upload videos, podcasts, or webinars</li>
        <li>Generate social media posts automatically</li>
        <li>Create email newsletters from your content</li>
        <li>Build SEO-optimized blog articles</li>
      </ul>
{button}"#,
        name = escape_html(name),
        app = escape_html(app_name),
        button = button(dashboard_url, "Get Started"),
    );
    layout(app_name, app_name, &body)
}

/// Payment confirmation body.
pub fn payment_success(app_name: &str, receipt: &PaymentReceipt, dashboard_url: &str) -> String {
    let mut rows = vec![
        detail_row("Plan", &receipt.plan_name),
        detail_row("Amount", &receipt.amount.display()),
        detail_row("Payment Method", &receipt.payment_method),
    ];
    if let Some(number) = &receipt.receipt_number {
        rows.push(detail_row("Receipt Number", number));
    }

    let body = format!(
        r#"      <p style="font-size: 16px;">Hi {name},</p>
      <p style="font-size: 16px;">Thank you for upgrading to the <strong>{plan}</strong> plan! Your payment has been successfully processed.</p>
      <h2 style="font-size: 18px; color: #111827;">Payment Details</h2>
      <table style="width: 100%; border-collapse: collapse;">
{rows}
      </table>
      <p style="font-size: 14px;">Your account has been upgraded and you now have access to all {plan} features.</p>
{button}"#,
        name = escape_html(&receipt.customer_name),
        plan = escape_html(&receipt.plan_name),
        rows = rows.join("\n"),
        button = button(dashboard_url, "Go to Dashboard"),
    );
    layout(app_name, "Payment Successful!", &body)
}

/// Payment failure body.
pub fn payment_failed(app_name: &str, failure: &PaymentFailure, billing_url: &str) -> String {
    let rows = [
        detail_row("Plan", &failure.plan_name),
        detail_row("Amount", &failure.amount.display()),
    ];
    let reason = failure
        .error_message
        .as_deref()
        .map(|msg| {
            format!(
                r#"      <p style="font-size: 14px; color: #991b1b;"><strong>Error:</strong> {}</p>"#,
                escape_html(msg)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"      <p style="font-size: 16px;">Hi {name},</p>
      <p style="font-size: 16px;">We were unable to process your payment for the <strong>{plan}</strong> plan.</p>
      <table style="width: 100%; border-collapse: collapse;">
{rows}
      </table>
{reason}
{button}
      <p style="font-size: 14px; color: #6b7280;">If you continue to experience issues, please contact our support team for assistance.</p>"#,
        name = escape_html(&failure.customer_name),
        plan = escape_html(&failure.plan_name),
        rows = rows.join("\n"),
        button = button(billing_url, "Try Again"),
    );
    layout(app_name, "Payment Failed", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Money;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_verification_contains_link_and_escapes_name() {
        let html = verification(
            "ContentForge",
            "<script>",
            "https://contentforge.app/verify-email?token=abc",
        );
        assert!(html.contains("https://contentforge.app/verify-email?token=abc"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_payment_success_lists_receipt() {
        let receipt = PaymentReceipt {
            to: "a@example.com".to_string(),
            customer_name: "Achieng".to_string(),
            plan_name: "Pro".to_string(),
            amount: Money::kes(25_000),
            receipt_number: Some("QKJ1ABC2XY".to_string()),
            payment_method: "M-Pesa".to_string(),
        };
        let html = payment_success("ContentForge", &receipt, "https://x/dashboard");
        assert!(html.contains("KSH 25,000"));
        assert!(html.contains("QKJ1ABC2XY"));
        assert!(html.contains("M-Pesa"));
    }

    #[test]
    fn test_payment_success_without_receipt() {
        let receipt = PaymentReceipt {
            to: "a@example.com".to_string(),
            customer_name: "Achieng".to_string(),
            plan_name: "Creator".to_string(),
            amount: Money::usd_dollars(79),
            receipt_number: None,
            payment_method: "Pesapal".to_string(),
        };
        let html = payment_success("ContentForge", &receipt, "https://x/dashboard");
        assert!(html.contains("$79.00"));
        assert!(!html.contains("Receipt Number"));
    }

    #[test]
    fn test_payment_failed_includes_reason() {
        let failure = PaymentFailure {
            to: "a@example.com".to_string(),
            customer_name: "Otieno".to_string(),
            plan_name: "Agency".to_string(),
            amount: Money::kes(63_000),
            error_message: Some("Request cancelled by user".to_string()),
        };
        let html = payment_failed("ContentForge", &failure, "https://x/dashboard/billing");
        assert!(html.contains("Request cancelled by user"));
        assert!(html.contains("Try Again"));
        assert!(html.contains("KSH 63,000"));
    }
}
