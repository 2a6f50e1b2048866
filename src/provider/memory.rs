//! In-memory identity provider and document store.
//!
//! Used by `--backend memory` for local development and by the test suite.
//! Accounts are keyed by lowercased email; their profile fields live as a
//! document in the configured users collection, keyed by uid.

use super::{AuthErrorCode, AuthProvider, Document, Identity, ProviderError, UserDirectory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// One account as read from a seed file.
#[derive(Deserialize)]
struct SeedAccount {
    #[serde(default)]
    uid: Option<String>,
    email: String,
    password: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

struct Credential {
    uid: String,
    email: String,
    password: SecretString,
}

pub struct InMemoryBackend {
    credentials: RwLock<HashMap<String, Credential>>,
    collections: RwLock<HashMap<String, BTreeMap<String, Map<String, Value>>>>,
    users_collection: String,
    name_field: String,
    email_field: String,
    reset_requests: Mutex<Vec<String>>,
    sign_in_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryBackend {
    /// Empty backend storing account documents in `users_collection`.
    #[must_use]
    pub fn new(users_collection: impl Into<String>) -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
            collections: RwLock::new(HashMap::new()),
            users_collection: users_collection.into(),
            name_field: "name".to_string(),
            email_field: "email".to_string(),
            reset_requests: Mutex::new(Vec::new()),
            sign_in_calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Store the account's name and email under these document fields
    /// instead of `name` and `email`.
    #[must_use]
    pub fn with_profile_fields(
        mut self,
        name_field: impl Into<String>,
        email_field: impl Into<String>,
    ) -> Self {
        self.name_field = name_field.into();
        self.email_field = email_field.into();
        self
    }

    /// Load accounts from a JSON array of `{uid?, email, password, ...fields}`.
    ///
    /// The email lands in the configured email field; every other key is
    /// stored as is. Returns the number of accounts loaded.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_seed_file(&self, path: &Path) -> Result<usize> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;

        let accounts: Vec<SeedAccount> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

        let count = accounts.len();
        for account in accounts {
            self.add_account(
                account.uid,
                &account.email,
                SecretString::from(account.password),
                account.fields,
            )
            .await;
        }

        info!("Loaded {} accounts from {}", count, path.display());

        Ok(count)
    }

    /// Register an account and store its profile document. Returns the uid.
    ///
    /// The stored document always carries the account's email under the
    /// configured email field; `fields` supply the rest (name, authorization
    /// flag, ...).
    pub async fn add_account(
        &self,
        uid: Option<String>,
        email: &str,
        password: SecretString,
        mut fields: Map<String, Value>,
    ) -> String {
        let uid = uid.unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        fields.insert(self.email_field.clone(), Value::String(email.to_string()));

        self.credentials.write().await.insert(
            email.to_lowercase(),
            Credential {
                uid: uid.clone(),
                email: email.to_string(),
                password,
            },
        );

        let collection = self.users_collection.clone();
        self.insert_document(&collection, &uid, fields).await;

        uid
    }

    /// Put or replace a document.
    pub async fn insert_document(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Remove a document, returning whether it existed.
    pub async fn remove_document(&self, collection: &str, id: &str) -> bool {
        self.collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
            .is_some()
    }

    /// Emails for which a reset was requested, in request order.
    pub async fn reset_requests(&self) -> Vec<String> {
        self.reset_requests.lock().await.clone()
    }

    /// How many sign-in attempts reached the provider.
    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Http {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }

        Ok(())
    }
}

fn well_formed_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, ProviderError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        if !well_formed_email(email) {
            return Err(ProviderError::Auth(AuthErrorCode::InvalidEmail));
        }

        let credentials = self.credentials.read().await;
        let credential = credentials
            .get(&email.to_lowercase())
            .ok_or(ProviderError::Auth(AuthErrorCode::UserNotFound))?;

        if credential.password.expose_secret() != password.expose_secret() {
            debug!("password mismatch for {}", credential.uid);

            return Err(ProviderError::Auth(AuthErrorCode::WrongPassword));
        }

        let display_name = self
            .collections
            .read()
            .await
            .get(&self.users_collection)
            .and_then(|documents| documents.get(&credential.uid))
            .and_then(|fields| fields.get(&self.name_field))
            .and_then(Value::as_str)
            .map(ToString::to_string);

        Ok(Identity {
            uid: credential.uid.clone(),
            email: credential.email.clone(),
            display_name,
            id_token: SecretString::from(format!("memory-{}", Uuid::new_v4().simple())),
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        self.check_available()?;

        if !well_formed_email(email) {
            return Err(ProviderError::Auth(AuthErrorCode::InvalidEmail));
        }

        if !self
            .credentials
            .read()
            .await
            .contains_key(&email.to_lowercase())
        {
            return Err(ProviderError::Auth(AuthErrorCode::UserNotFound));
        }

        info!("password reset send stub");

        self.reset_requests.lock().await.push(email.to_string());

        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryBackend {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, ProviderError> {
        self.check_available()?;

        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(documents
            .iter()
            .filter(|(_, fields)| fields.get(field).and_then(Value::as_str) == Some(value))
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, ProviderError> {
        self.check_available()?;

        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let backend = InMemoryBackend::new("users");
        let uid = backend
            .add_account(
                None,
                "Ada@Example.com",
                secret("hunter2"),
                fields(json!({"name": "Ada Lovelace"})),
            )
            .await;

        let identity = backend
            .sign_in_with_password("ada@example.com", &secret("hunter2"))
            .await
            .unwrap();
        assert_eq!(identity.uid, uid);
        assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));

        let err = backend
            .sign_in_with_password("ada@example.com", &secret("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.auth_code(), Some(&AuthErrorCode::WrongPassword));
        assert_eq!(backend.sign_in_calls(), 2);
    }

    #[tokio::test]
    async fn sign_in_unknown_and_malformed_email() {
        let backend = InMemoryBackend::new("users");

        let err = backend
            .sign_in_with_password("ghost@example.com", &secret("x"))
            .await
            .unwrap_err();
        assert_eq!(err.auth_code(), Some(&AuthErrorCode::UserNotFound));

        let err = backend
            .sign_in_with_password("not-an-email", &secret("x"))
            .await
            .unwrap_err();
        assert_eq!(err.auth_code(), Some(&AuthErrorCode::InvalidEmail));
    }

    #[tokio::test]
    async fn reset_records_known_accounts_only() {
        let backend = InMemoryBackend::new("users");
        backend
            .add_account(None, "ada@example.com", secret("pw"), Map::new())
            .await;

        backend.send_password_reset("ada@example.com").await.unwrap();
        let err = backend
            .send_password_reset("ghost@example.com")
            .await
            .unwrap_err();
        assert_eq!(err.auth_code(), Some(&AuthErrorCode::UserNotFound));

        assert_eq!(backend.reset_requests().await, vec!["ada@example.com"]);
    }

    #[tokio::test]
    async fn find_by_field_matches_exactly() {
        let backend = InMemoryBackend::new("users");
        backend
            .add_account(
                Some("a".to_string()),
                "ada@example.com",
                secret("pw"),
                fields(json!({"name": "Ada Lovelace"})),
            )
            .await;
        backend
            .add_account(
                Some("b".to_string()),
                "ada.l@example.org",
                secret("pw"),
                fields(json!({"name": "Ada Lovelace"})),
            )
            .await;
        backend
            .add_account(
                Some("c".to_string()),
                "grace@example.com",
                secret("pw"),
                fields(json!({"name": "Grace Hopper"})),
            )
            .await;

        let docs = backend
            .find_by_field("users", "name", "Ada Lovelace")
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let docs = backend
            .find_by_field("users", "name", "ada lovelace")
            .await
            .unwrap();
        assert!(docs.is_empty());

        let docs = backend
            .find_by_field("missing", "name", "Ada Lovelace")
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn get_returns_document_or_none() {
        let backend = InMemoryBackend::new("users");
        backend
            .insert_document("roles", "u1", fields(json!({"admin": 1})))
            .await;

        let doc = backend.get("roles", "u1").await.unwrap().unwrap();
        assert_eq!(doc.get("admin"), Some(&json!(1)));

        assert!(backend.remove_document("roles", "u1").await);
        assert!(backend.get("roles", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_backend_fails_every_call() {
        let backend = InMemoryBackend::new("users");
        backend.set_unavailable(true);

        let err = backend.get("users", "u1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 503, .. }));
        assert!(backend.send_password_reset("a@b.c").await.is_err());
    }

    #[tokio::test]
    async fn seed_file_loads_accounts() {
        let path = std::env::temp_dir().join(format!("wicket-seed-{}.json", Uuid::new_v4()));
        tokio::fs::write(
            &path,
            json!([
                {"uid": "u1", "email": "ada@example.com", "password": "pw", "name": "Ada Lovelace", "admin": 1},
                {"email": "grace@example.com", "password": "pw", "name": "Grace Hopper"}
            ])
            .to_string(),
        )
        .await
        .unwrap();

        let backend = InMemoryBackend::new("users");
        assert_eq!(backend.load_seed_file(&path).await.unwrap(), 2);
        let _ = tokio::fs::remove_file(&path).await;

        let doc = backend.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.get_str("email"), Some("ada@example.com"));
        assert_eq!(doc.get("admin"), Some(&json!(1)));
        assert!(!doc.fields.contains_key("password"));

        let docs = backend
            .find_by_field("users", "name", "Grace Hopper")
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn profile_fields_are_configurable() {
        let backend = InMemoryBackend::new("members").with_profile_fields("full_name", "contact");
        let uid = backend
            .add_account(
                None,
                "ada@example.com",
                secret("pw"),
                fields(json!({"full_name": "Ada Lovelace"})),
            )
            .await;

        let doc = backend.get("members", &uid).await.unwrap().unwrap();
        assert_eq!(doc.get_str("contact"), Some("ada@example.com"));
        assert!(doc.get("email").is_none());

        let identity = backend
            .sign_in_with_password("ada@example.com", &secret("pw"))
            .await
            .unwrap();
        assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));
    }
}
