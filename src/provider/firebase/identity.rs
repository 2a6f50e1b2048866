use super::{FirebaseConfig, auth_error_code, endpoint_url, error_from_response};
use crate::provider::{AuthProvider, Identity, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

/// Identity Toolkit REST client (`accounts:*` endpoints).
#[derive(Clone, Debug)]
pub struct IdentityToolkit {
    client: Client,
    config: FirebaseConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

impl IdentityToolkit {
    #[must_use]
    pub fn new(client: Client, config: FirebaseConfig) -> Self {
        Self { client, config }
    }

    async fn post(&self, method: &str, payload: &Value) -> Result<Value, ProviderError> {
        let url = endpoint_url(&self.config.identity_url, &["v1", method])?;

        debug!("identity toolkit URL: {}", url);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.expose_secret())])
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        match error_from_response(response).await {
            ProviderError::Http { message, .. }
                if status == StatusCode::BAD_REQUEST && !message.is_empty() =>
            {
                Err(ProviderError::Auth(auth_error_code(&message)))
            }
            err => Err(err),
        }
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkit {
    #[instrument(skip_all, fields(email_len = email.len()))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, ProviderError> {
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "returnSecureToken": true,
        });

        let body = self.post("accounts:signInWithPassword", &payload).await?;

        let response: SignInResponse = serde_json::from_value(body)
            .map_err(|e| ProviderError::Decode(format!("signInWithPassword: {e}")))?;

        Ok(Identity {
            uid: response.local_id,
            email: if response.email.is_empty() {
                email.to_string()
            } else {
                response.email
            },
            display_name: response.display_name.filter(|name| !name.is_empty()),
            id_token: SecretString::from(response.id_token),
        })
    }

    #[instrument(skip_all, fields(email_len = email.len()))]
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let payload = json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });

        self.post("accounts:sendOobCode", &payload).await?;

        Ok(())
    }
}
