//! Session capability passed explicitly to the flows that need it.

use crate::provider::{AuthProvider, Identity, ProviderError};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Exposes "current identity" and "sign in" over an [`AuthProvider`].
///
/// One context is created per request; nothing about the signed-in user is
/// kept in global state.
pub struct SessionContext {
    provider: Arc<dyn AuthProvider>,
    current: RwLock<Option<Identity>>,
}

impl SessionContext {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
        }
    }

    pub async fn current_identity(&self) -> Option<Identity> {
        self.current.read().await.clone()
    }

    /// Authenticate and remember the identity on success.
    ///
    /// # Errors
    /// Returns the provider error unchanged; the current identity is left as is.
    #[instrument(skip_all, fields(email_len = email.len()))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, ProviderError> {
        let identity = self.provider.sign_in_with_password(email, password).await?;

        debug!("signed in as {}", identity.uid);

        *self.current.write().await = Some(identity.clone());

        Ok(identity)
    }

    pub async fn sign_out(&self) {
        self.current.write().await.take();
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::memory::InMemoryBackend;
    use serde_json::Map;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[tokio::test]
    async fn sign_in_sets_current_identity() {
        let backend = Arc::new(InMemoryBackend::new("users"));
        let uid = backend
            .add_account(None, "ada@example.com", secret("pw"), Map::new())
            .await;

        let session = SessionContext::new(backend);
        assert!(session.current_identity().await.is_none());

        let identity = session.sign_in("ada@example.com", &secret("pw")).await.unwrap();
        assert_eq!(identity.uid, uid);
        assert_eq!(session.current_identity().await.map(|i| i.uid), Some(uid));

        session.sign_out().await;
        assert!(session.current_identity().await.is_none());
    }

    #[tokio::test]
    async fn failed_sign_in_leaves_session_empty() {
        let backend = Arc::new(InMemoryBackend::new("users"));
        let session = SessionContext::new(backend);

        assert!(session.sign_in("ghost@example.com", &secret("pw")).await.is_err());
        assert!(session.current_identity().await.is_none());
    }
}
