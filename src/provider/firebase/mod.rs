//! Firebase REST backend: Identity Toolkit for auth, Firestore for documents.
//!
//! Both clients share one `reqwest::Client` and append the project's web API
//! key as the `key` query parameter on every request.

pub mod firestore;
pub mod identity;

pub use self::firestore::FirestoreDirectory;
pub use self::identity::IdentityToolkit;

use super::{AuthErrorCode, ProviderError};
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::Value;
use std::{fmt, time::Duration};
use tracing::error;
use url::Url;

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";

#[derive(Clone)]
pub struct FirebaseConfig {
    pub api_key: SecretString,
    pub project_id: String,
    pub identity_url: Url,
    pub firestore_url: Url,
}

impl FirebaseConfig {
    /// Build a config, validating both base URLs.
    ///
    /// # Errors
    /// Returns an error if a base URL does not parse or the project id is empty.
    pub fn new(
        api_key: SecretString,
        project_id: &str,
        identity_url: &str,
        firestore_url: &str,
    ) -> Result<Self> {
        if project_id.trim().is_empty() {
            return Err(anyhow!("Firebase project id must not be empty"));
        }

        Ok(Self {
            api_key,
            project_id: project_id.trim().to_string(),
            identity_url: Url::parse(identity_url)
                .with_context(|| format!("invalid identity URL: {identity_url}"))?,
            firestore_url: Url::parse(firestore_url)
                .with_context(|| format!("invalid firestore URL: {firestore_url}"))?,
        })
    }
}

impl fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"***")
            .field("project_id", &self.project_id)
            .field("identity_url", &self.identity_url.as_str())
            .field("firestore_url", &self.firestore_url.as_str())
            .finish()
    }
}

/// Shared HTTP client for both services.
///
/// # Errors
/// Returns an error if the client cannot be built.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(crate::APP_USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .context("Error creating reqwest client")
}

/// Append path segments to a base URL, percent-encoding each one.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = base.clone();

    url.path_segments_mut()
        .map_err(|()| ProviderError::Decode(format!("cannot use {base} as a base URL")))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Map an Identity Toolkit error message (`EMAIL_NOT_FOUND`,
/// `TOO_MANY_ATTEMPTS_TRY_LATER : ...`) to its `auth/*` code.
#[must_use]
pub fn auth_error_code(message: &str) -> AuthErrorCode {
    let code = message.split(" : ").next().unwrap_or(message).trim();

    match code {
        "EMAIL_NOT_FOUND" => AuthErrorCode::UserNotFound,
        "INVALID_EMAIL" => AuthErrorCode::InvalidEmail,
        "INVALID_PASSWORD" => AuthErrorCode::WrongPassword,
        "INVALID_LOGIN_CREDENTIALS" => AuthErrorCode::InvalidCredential,
        "USER_DISABLED" => AuthErrorCode::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyRequests,
        other => AuthErrorCode::Other(format!(
            "auth/{}",
            other.to_lowercase().replace('_', "-")
        )),
    }
}

/// Turn a non-success response into a `ProviderError`.
///
/// Google APIs answer with `{"error": {"code", "message", "status"}}`.
pub(crate) async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or_default();

    let message = body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    error!("{} - {}", status, message);

    ProviderError::Http {
        status: status.as_u16(),
        message,
    }
}
