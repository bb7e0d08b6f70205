//! Fire-and-forget transactional email.
//!
//! Each function spawns the send onto the runtime and returns immediately.
//! Failures are logged and never reach the caller.

use std::sync::Arc;

use contentforge_shared::EmailService;
use contentforge_shared::email::{PaymentFailure, PaymentReceipt};

/// Sends the email verification link.
pub fn verification(email: &Arc<EmailService>, to: String, name: String, token: String) {
    let email = Arc::clone(email);
    tokio::spawn(async move {
        if let Err(e) = email.send_verification_email(&to, &name, &token).await {
            tracing::error!(error = %e, "Failed to send verification email");
        }
    });
}

/// Sends the password reset link.
pub fn password_reset(email: &Arc<EmailService>, to: String, name: String, token: String) {
    let email = Arc::clone(email);
    tokio::spawn(async move {
        if let Err(e) = email.send_password_reset_email(&to, &name, &token).await {
            tracing::error!(error = %e, "Failed to send password reset email");
        }
    });
}

/// Sends the welcome email after verification.
pub fn welcome(email: &Arc<EmailService>, to: String, name: String) {
    let email = Arc::clone(email);
    tokio::spawn(async move {
        if let Err(e) = email.send_welcome_email(&to, &name).await {
            tracing::error!(error = %e, "Failed to send welcome email");
        }
    });
}

/// Sends a payment confirmation.
pub fn payment_success(email: &Arc<EmailService>, receipt: PaymentReceipt) {
    let email = Arc::clone(email);
    tokio::spawn(async move {
        if let Err(e) = email.send_payment_success_email(&receipt).await {
            tracing::error!(error = %e, "Failed to send payment confirmation email");
        }
    });
}

/// Sends a payment failure notice.
pub fn payment_failed(email: &Arc<EmailService>, failure: PaymentFailure) {
    let email = Arc::clone(email);
    tokio::spawn(async move {
        if let Err(e) = email.send_payment_failed_email(&failure).await {
            tracing::error!(error = %e, "Failed to send payment failure email");
        }
    });
}
