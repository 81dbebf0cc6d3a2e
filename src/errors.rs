use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::{TransitionError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("Failed to initialize the application")]
    Initialization,

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("There was an error booking your appointment. Please try again.")]
    BookingFailed,

    #[error("invalid input")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Backend(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Initialization => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Auth(_) => StatusCode::BAD_GATEWAY,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::BookingFailed => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Transition(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Validation(fields) => {
                serde_json::json!({ "error": self.to_string(), "fields": fields })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepKind;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Initialization, StatusCode::SERVICE_UNAVAILABLE),
            (AppError::BookingFailed, StatusCode::BAD_GATEWAY),
            (AppError::NotFound("session".into()), StatusCode::NOT_FOUND),
            (
                AppError::Transition(TransitionError::InvalidTransition {
                    step: StepKind::Service,
                    action: "select a professional",
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Validation(ValidationErrors::new()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
