//! The Firebase backend against a mocked Identity Toolkit and Firestore.

#![allow(clippy::unwrap_used)]

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::sync::Arc;
use wicket::{
    flows::{
        FailureKind, LoginConfig, LoginForm, LookupConfig, ResetForm, lookup::find_emails,
        reset::USER_NOT_FOUND_MESSAGE,
    },
    provider::{
        AuthErrorCode, AuthProvider, ProviderError, UserDirectory,
        firebase::{FirebaseConfig, FirestoreDirectory, IdentityToolkit, http_client},
    },
    session::SessionContext,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";
const PROJECT: &str = "demo-project";
const DOCUMENTS: &str = "/v1/projects/demo-project/databases/(default)/documents";

fn config(server: &MockServer) -> Result<FirebaseConfig> {
    FirebaseConfig::new(
        SecretString::from(API_KEY),
        PROJECT,
        &server.uri(),
        &server.uri(),
    )
}

fn identity(server: &MockServer) -> Result<IdentityToolkit> {
    Ok(IdentityToolkit::new(http_client()?, config(server)?))
}

fn firestore(server: &MockServer) -> Result<FirestoreDirectory> {
    Ok(FirestoreDirectory::new(http_client()?, config(server)?))
}

fn google_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": { "code": 400, "message": message, "status": "INVALID_ARGUMENT" }
    }))
}

#[tokio::test]
async fn sign_in_returns_identity() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", API_KEY))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "password": "secret",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "displayName": "Ada Lovelace",
            "idToken": "token-1",
            "registered": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = identity(&server)?
        .sign_in_with_password("ada@example.com", &SecretString::from("secret"))
        .await?;

    assert_eq!(identity.uid, "uid-1");
    assert_eq!(identity.email, "ada@example.com");
    assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(identity.id_token.expose_secret(), "token-1");

    Ok(())
}

#[tokio::test]
async fn sign_in_error_is_categorized() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(google_error("INVALID_LOGIN_CREDENTIALS"))
        .mount(&server)
        .await;

    let err = identity(&server)?
        .sign_in_with_password("ada@example.com", &SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.auth_code(), Some(&AuthErrorCode::InvalidCredential));

    Ok(())
}

#[tokio::test]
async fn reset_request_posts_oob_code() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .and(query_param("key", API_KEY))
        .and(body_partial_json(json!({
            "requestType": "PASSWORD_RESET",
            "email": "ada@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "ada@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = identity(&server)?;
    let mut form = ResetForm::new();
    form.set_email("ada@example.com");

    assert!(form.submit(&provider).await.payload().is_some());

    Ok(())
}

#[tokio::test]
async fn reset_maps_provider_codes_to_messages() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .and(body_partial_json(json!({"email": "ghost@example.com"})))
        .respond_with(google_error("EMAIL_NOT_FOUND"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .and(body_partial_json(json!({"email": "bad@"})))
        .respond_with(google_error("INVALID_EMAIL"))
        .mount(&server)
        .await;

    let provider = identity(&server)?;

    let mut form = ResetForm::new();
    form.set_email("ghost@example.com");
    let failure = form.submit(&provider).await.failure().cloned().unwrap();
    assert_eq!(failure.kind, FailureKind::NotFound);
    assert_eq!(failure.message, USER_NOT_FOUND_MESSAGE);

    form.set_email("bad@");
    let failure = form.submit(&provider).await.failure().cloned().unwrap();
    assert_eq!(failure.kind, FailureKind::InvalidEmail);

    Ok(())
}

#[tokio::test]
async fn server_error_is_not_an_auth_code() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = identity(&server)?
        .send_password_reset("ada@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Http { status: 503, .. }));
    assert!(err.auth_code().is_none());

    Ok(())
}

#[tokio::test]
async fn run_query_decodes_documents() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .and(query_param("key", API_KEY))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "users" }],
                "where": { "fieldFilter": {
                    "field": { "fieldPath": "name" },
                    "op": "EQUAL",
                    "value": { "stringValue": "Ada Lovelace" }
                }}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "document": {
                    "name": format!("projects/{PROJECT}/databases/(default)/documents/users/uid-1"),
                    "fields": {
                        "name": { "stringValue": "Ada Lovelace" },
                        "email": { "stringValue": "ada@example.com" },
                        "admin": { "integerValue": "1" }
                    }
                },
                "readTime": "2024-01-01T00:00:00Z"
            },
            {
                "document": {
                    "name": format!("projects/{PROJECT}/databases/(default)/documents/users/uid-2"),
                    "fields": {
                        "name": { "stringValue": "Ada Lovelace" }
                    }
                },
                "readTime": "2024-01-01T00:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let directory = firestore(&server)?;

    let documents = directory
        .find_by_field("users", "name", "Ada Lovelace")
        .await?;
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id, "uid-1");
    assert_eq!(documents[0].get("admin"), Some(&json!(1)));

    // the second document has no email and is skipped
    let emails = find_emails(&directory, &LookupConfig::default(), "Ada", "Lovelace").await?;
    assert_eq!(emails, vec!["a**@example.com"]);

    Ok(())
}

#[tokio::test]
async fn run_query_without_match_is_empty() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "readTime": "2024-01-01T00:00:00Z" }])),
        )
        .mount(&server)
        .await;

    let documents = firestore(&server)?
        .find_by_field("users", "name", "Nobody Here")
        .await?;
    assert!(documents.is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_document_is_none() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/unknown")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    assert!(firestore(&server)?.get("users", "unknown").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn anonymous_read_is_denied_by_rules() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/uid-1")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let err = firestore(&server)?.get("users", "uid-1").await.unwrap_err();
    assert!(matches!(err, ProviderError::Http { status: 403, .. }));

    Ok(())
}

#[tokio::test]
async fn login_over_firebase_routes_admin() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "idToken": "token-1"
        })))
        .mount(&server)
        .await;

    // security rules only let the signed-in user read their own document
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/uid-1")))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("projects/{PROJECT}/databases/(default)/documents/users/uid-1"),
            "fields": { "admin": { "integerValue": "1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/users/uid-1")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
        })))
        .with_priority(10)
        .mount(&server)
        .await;

    let session = SessionContext::new(Arc::new(identity(&server)?));
    let directory = firestore(&server)?;

    let mut form = LoginForm::new();
    form.set_email("ada@example.com");
    form.set_password("secret");

    let navigation = form
        .submit(&session, &directory, &LoginConfig::default())
        .await
        .payload()
        .cloned()
        .unwrap();

    assert_eq!(navigation.route, "/admin");
    assert_eq!(navigation.uid, "uid-1");
    assert!(session.current_identity().await.is_some());

    Ok(())
}
