use super::{INVALID_PAYLOAD_MESSAGE, Outcome, status_for};
use crate::{
    flows::{FlowConfig, LookupForm, UiResult, lookup::RETRY_MESSAGE},
    provider::Backend,
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct FindEmailRequest {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FindEmailResponse {
    pub status: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub emails: Vec<String>,
}

impl FindEmailResponse {
    fn failure(message: &str) -> Self {
        Self {
            status: Outcome::Failure,
            message: Some(message.to_string()),
            emails: Vec::new(),
        }
    }
}

#[utoipa::path(
    post,
    path= "/auth/find-email",
    request_body = FindEmailRequest,
    responses (
        (status = 200, description = "Masked emails registered under the name", body = [FindEmailResponse], content_type = "application/json"),
        (status = 400, description = "First or last name missing", body = [FindEmailResponse]),
        (status = 404, description = "No account with that name", body = [FindEmailResponse]),
        (status = 502, description = "Document store unavailable", body = [FindEmailResponse]),
    ),
    tag= "find-email"
)]
#[instrument(skip_all)]
pub async fn find_email(
    backend: Extension<Backend>,
    config: Extension<Arc<FlowConfig>>,
    payload: Result<Json<FindEmailRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request: FindEmailRequest = match payload {
        Ok(Json(payload)) => payload,
        Err(e) => {
            error!("Invalid payload: {}", e);

            return (
                StatusCode::BAD_REQUEST,
                Json(FindEmailResponse::failure(INVALID_PAYLOAD_MESSAGE)),
            );
        }
    };

    let mut form = LookupForm::new();
    form.set_first_name(request.first_name);
    form.set_last_name(request.last_name);

    match form.submit(&*backend.directory, &config.lookup).await {
        UiResult::Success(emails) => (
            StatusCode::OK,
            Json(FindEmailResponse {
                status: Outcome::Success,
                message: None,
                emails: emails.clone(),
            }),
        ),
        UiResult::Failure(failure) => (
            status_for(failure.kind),
            Json(FindEmailResponse::failure(&failure.message)),
        ),
        UiResult::Idle | UiResult::Loading => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(FindEmailResponse::failure(RETRY_MESSAGE)),
        ),
    }
}
