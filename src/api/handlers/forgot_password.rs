use super::{INVALID_PAYLOAD_MESSAGE, Outcome, status_for};
use crate::{
    flows::{ResetForm, UiResult, reset::GENERIC_MESSAGE},
    provider::Backend,
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordResponse {
    pub status: Outcome,
    pub message: String,
}

impl ForgotPasswordResponse {
    fn new(status: Outcome, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path= "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses (
        (status = 200, description = "Reset email requested", body = [ForgotPasswordResponse], content_type = "application/json"),
        (status = 400, description = "Email missing", body = [ForgotPasswordResponse]),
        (status = 404, description = "No account with that email", body = [ForgotPasswordResponse]),
        (status = 422, description = "Email rejected by the provider", body = [ForgotPasswordResponse]),
        (status = 502, description = "Identity provider unavailable", body = [ForgotPasswordResponse]),
    ),
    tag= "forgot-password"
)]
#[instrument(skip_all)]
pub async fn forgot_password(
    backend: Extension<Backend>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request: ForgotPasswordRequest = match payload {
        Ok(Json(payload)) => payload,
        Err(e) => {
            error!("Invalid payload: {}", e);

            return (
                StatusCode::BAD_REQUEST,
                Json(ForgotPasswordResponse::new(
                    Outcome::Failure,
                    INVALID_PAYLOAD_MESSAGE,
                )),
            );
        }
    };

    let mut form = ResetForm::new();
    form.set_email(request.email);

    match form.submit(&*backend.auth).await {
        UiResult::Success(message) => (
            StatusCode::OK,
            Json(ForgotPasswordResponse::new(Outcome::Success, message)),
        ),
        UiResult::Failure(failure) => (
            status_for(failure.kind),
            Json(ForgotPasswordResponse::new(
                Outcome::Failure,
                &failure.message,
            )),
        ),
        UiResult::Idle | UiResult::Loading => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ForgotPasswordResponse::new(Outcome::Failure, GENERIC_MESSAGE)),
        ),
    }
}
