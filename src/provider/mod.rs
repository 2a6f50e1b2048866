//! Boundary to the hosted identity provider and document store.
//!
//! The flows only ever see [`AuthProvider`] and [`UserDirectory`]. Both are
//! object safe so the server can hold them as `Arc<dyn _>` and swap the
//! Firebase REST backend for the in-memory one in development and tests.

pub mod firebase;
pub mod memory;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};
use thiserror::Error;

/// Categorized identity provider error codes, in the provider's `auth/*` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthErrorCode {
    UserNotFound,
    InvalidEmail,
    WrongPassword,
    InvalidCredential,
    UserDisabled,
    TooManyRequests,
    Other(String),
}

impl AuthErrorCode {
    /// Parse an `auth/*` code string.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            "auth/user-not-found" => Self::UserNotFound,
            "auth/invalid-email" => Self::InvalidEmail,
            "auth/wrong-password" => Self::WrongPassword,
            "auth/invalid-credential" => Self::InvalidCredential,
            "auth/user-disabled" => Self::UserDisabled,
            "auth/too-many-requests" => Self::TooManyRequests,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::UserNotFound => "auth/user-not-found",
            Self::InvalidEmail => "auth/invalid-email",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::UserDisabled => "auth/user-disabled",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider rejected the request: {0}")]
    Auth(AuthErrorCode),
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// The categorized provider code, if the provider answered with one.
    #[must_use]
    pub fn auth_code(&self) -> Option<&AuthErrorCode> {
        match self {
            Self::Auth(code) => Some(code),
            _ => None,
        }
    }
}

/// An authenticated identity returned by the provider.
#[derive(Clone)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub id_token: SecretString,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"***")
            .finish()
    }
}

/// A document read from the store: its id plus plain JSON fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify an email/password pair and return the signed-in identity.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, ProviderError>;

    /// Ask the provider to email a password reset link to `email`.
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Documents in `collection` whose `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, ProviderError>;

    /// A single document by id, `None` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, ProviderError>;

    /// A single document read as the signed-in `identity`.
    ///
    /// Stores with per-user access rules override this; others ignore the
    /// identity.
    async fn get_as(
        &self,
        _identity: &Identity,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, ProviderError> {
        self.get(collection, id).await
    }
}

/// The pair of services a running server talks to.
#[derive(Clone)]
pub struct Backend {
    pub name: &'static str,
    pub auth: Arc<dyn AuthProvider>,
    pub directory: Arc<dyn UserDirectory>,
}

impl Backend {
    #[must_use]
    pub fn new(
        name: &'static str,
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            name,
            auth,
            directory,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").field("name", &self.name).finish()
    }
}
