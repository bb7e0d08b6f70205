//! Email service for sending transactional emails.
//!
//! Uses `lettre` over SMTP. Production points at the Resend SMTP relay
//! (`smtp.resend.com`, user `resend`, password = API key).

pub mod templates;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

pub use templates::{PaymentFailure, PaymentReceipt};

use crate::config::{AppSettings, EmailConfig};

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    app: AppSettings,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig, app: AppSettings) -> Self {
        Self { config, app }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let builder = if self.config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| EmailError::SendError(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        };

        Ok(builder
            .port(self.config.smtp_port)
            .credentials(creds)
            .build())
    }

    /// Sends an email verification email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_verification_email(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let url = self.app.link(&format!("/verify-email?token={token}"));
        let subject = format!("Verify your {} account", self.app.name);
        let html = templates::verification(&self.app.name, to_name, &url);
        self.send_email(to_email, &subject, &html).await
    }

    /// Sends a password reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let url = self.app.link(&format!("/reset-password?token={token}"));
        let subject = format!("Reset your {} password", self.app.name);
        let html = templates::password_reset(&self.app.name, to_name, &url);
        self.send_email(to_email, &subject, &html).await
    }

    /// Sends the post-verification welcome email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_welcome_email(&self, to_email: &str, to_name: &str) -> Result<(), EmailError> {
        let subject = format!("Welcome to {}!", self.app.name);
        let html = templates::welcome(&self.app.name, to_name, &self.app.link("/dashboard"));
        self.send_email(to_email, &subject, &html).await
    }

    /// Sends a payment confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_payment_success_email(
        &self,
        receipt: &PaymentReceipt,
    ) -> Result<(), EmailError> {
        let subject = format!("Payment Successful - {} Plan", receipt.plan_name);
        let html =
            templates::payment_success(&self.app.name, receipt, &self.app.link("/dashboard"));
        self.send_email(&receipt.to, &subject, &html).await
    }

    /// Sends a payment failure notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_payment_failed_email(
        &self,
        failure: &PaymentFailure,
    ) -> Result<(), EmailError> {
        let subject = format!("Payment Failed - {} Plan", failure.plan_name);
        let html = templates::payment_failed(
            &self.app.name,
            failure,
            &self.app.link("/dashboard/billing"),
        );
        self.send_email(&failure.to, &subject, &html).await
    }

    /// Builds an HTML message without sending it.
    fn build_message(&self, to_email: &str, subject: &str, html: &str) -> Result<Message, EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }

    /// Sends a generic HTML email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_email(&self, to_email: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let email = self.build_message(to_email, subject, html)?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        tracing::debug!(to = %to_email, subject = %subject, "Email sent");
        Ok(())
    }
}
