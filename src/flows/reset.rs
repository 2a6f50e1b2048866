//! Request a password reset email from the identity provider.

use super::{Failure, FailureKind, FlowError, FormState, UiResult};
use crate::provider::{AuthErrorCode, AuthProvider};
use tracing::{error, instrument};

pub const FIELD_EMAIL: &str = "email";

pub const SENT_MESSAGE: &str = "Password reset email sent. Check your inbox.";
pub const REQUIRED_MESSAGE: &str = "Please enter your email address.";
pub const USER_NOT_FOUND_MESSAGE: &str = "No account exists with that email address.";
pub const INVALID_EMAIL_MESSAGE: &str = "That email address is not valid.";
pub const GENERIC_MESSAGE: &str = "Could not send the password reset email. Please try again.";

/// Ask the provider to send a reset email to `email`.
///
/// # Errors
/// Returns `FlowError::Validation` before any call when the email is blank,
/// and `FlowError::Provider` when the provider refuses or is unreachable.
#[instrument(skip_all, fields(email_len = email.len()))]
pub async fn request_reset(provider: &dyn AuthProvider, email: &str) -> Result<(), FlowError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(FlowError::Validation(FIELD_EMAIL));
    }

    provider.send_password_reset(email).await?;

    Ok(())
}

/// User-facing failure for a reset error.
///
/// Only "user not found" and "invalid email" get their own message.
fn failure_for(err: &FlowError) -> Failure {
    match err {
        FlowError::Validation(_) => Failure::new(FailureKind::Validation, REQUIRED_MESSAGE),
        FlowError::Provider(e) => match e.auth_code() {
            Some(AuthErrorCode::UserNotFound) => {
                Failure::new(FailureKind::NotFound, USER_NOT_FOUND_MESSAGE)
            }
            Some(AuthErrorCode::InvalidEmail) => {
                Failure::new(FailureKind::InvalidEmail, INVALID_EMAIL_MESSAGE)
            }
            _ => {
                error!("Error requesting password reset: {}", e);

                Failure::new(FailureKind::Unavailable, GENERIC_MESSAGE)
            }
        },
    }
}

#[derive(Debug)]
pub struct ResetForm {
    form: FormState,
    result: UiResult<String>,
}

impl Default for ResetForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            form: FormState::new(&[FIELD_EMAIL]),
            result: UiResult::Idle,
        }
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.form.set(FIELD_EMAIL, value);
    }

    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub fn result(&self) -> &UiResult<String> {
        &self.result
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.result.is_loading()
    }

    /// Request the reset and replace the result; success carries the
    /// confirmation message.
    pub async fn submit(&mut self, provider: &dyn AuthProvider) -> &UiResult<String> {
        self.result = UiResult::Loading;

        let email = self.form.get(FIELD_EMAIL).to_string();

        self.result = match request_reset(provider, &email).await {
            Ok(()) => UiResult::Success(SENT_MESSAGE.to_string()),
            Err(err) => UiResult::Failure(failure_for(&err)),
        };

        &self.result
    }
}
