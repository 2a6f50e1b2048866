pub mod health;
pub use self::health::health;

pub mod find_email;
pub use self::find_email::find_email;

pub mod forgot_password;
pub use self::forgot_password::forgot_password;

pub mod login;
pub use self::login::login;

// common types for the flow handlers
use crate::flows::FailureKind;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid request payload";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

#[must_use]
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::InvalidEmail => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Unauthorized => StatusCode::UNAUTHORIZED,
        FailureKind::Unavailable => StatusCode::BAD_GATEWAY,
    }
}
