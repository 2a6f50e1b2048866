use super::{INVALID_PAYLOAD_MESSAGE, Outcome, status_for};
use crate::{
    flows::{FlowConfig, LoginForm, UiResult, login::INVALID_CREDENTIALS_MESSAGE},
    provider::Backend,
    session::SessionContext,
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub status: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl LoginResponse {
    fn failure(message: &str) -> Self {
        Self {
            status: Outcome::Failure,
            message: Some(message.to_string()),
            route: None,
            uid: None,
        }
    }
}

#[utoipa::path(
    post,
    path= "/auth/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful, route to navigate to", body = [LoginResponse], content_type = "application/json"),
        (status = 400, description = "Email or password missing", body = [LoginResponse]),
        (status = 401, description = "Invalid email or password", body = [LoginResponse]),
    ),
    tag= "login"
)]
#[instrument(skip_all)]
pub async fn login(
    backend: Extension<Backend>,
    config: Extension<Arc<FlowConfig>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Ok(Json(payload)) => payload,
        Err(e) => {
            error!("Invalid payload: {}", e);

            return (
                StatusCode::BAD_REQUEST,
                Json(LoginResponse::failure(INVALID_PAYLOAD_MESSAGE)),
            );
        }
    };

    let session = SessionContext::new(backend.auth.clone());

    let mut form = LoginForm::new();
    form.set_email(request.email);
    form.set_password(request.password);

    match form
        .submit(&session, &*backend.directory, &config.login)
        .await
    {
        UiResult::Success(navigation) => (
            StatusCode::OK,
            Json(LoginResponse {
                status: Outcome::Success,
                message: None,
                route: Some(navigation.route.clone()),
                uid: Some(navigation.uid.clone()),
            }),
        ),
        UiResult::Failure(failure) => (
            status_for(failure.kind),
            Json(LoginResponse::failure(&failure.message)),
        ),
        UiResult::Idle | UiResult::Loading => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LoginResponse::failure(INVALID_CREDENTIALS_MESSAGE)),
        ),
    }
}
