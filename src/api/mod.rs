#![allow(clippy::needless_for_each)]

use crate::{flows::FlowConfig, provider::Backend};
use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;

pub use crate::GIT_COMMIT_HASH;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::find_email::find_email,
        handlers::forgot_password::forgot_password,
        handlers::login::login
    ),
    components(schemas(
        handlers::health::Health,
        handlers::Outcome,
        handlers::find_email::FindEmailRequest,
        handlers::find_email::FindEmailResponse,
        handlers::forgot_password::ForgotPasswordRequest,
        handlers::forgot_password::ForgotPasswordResponse,
        handlers::login::LoginRequest,
        handlers::login::LoginResponse
    )),
    tags(
        (name = "wicket", description = "Login, password reset and email lookup API")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router.
pub fn router(backend: Backend, config: FlowConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    Router::new()
        .route("/auth/find-email", post(handlers::find_email))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/login", post(handlers::login))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(Arc::new(config)))
                .layer(Extension(backend.clone())),
        )
        .route("/health", get(handlers::health).options(handlers::health))
        .layer(Extension(backend))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, backend: Backend, config: FlowConfig) -> Result<()> {
    info!("Using {} backend", backend.name);

    let app = router(backend, config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
