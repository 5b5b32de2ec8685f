use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;
use crate::db::DbError;
use crate::llm::LlmError;
use crate::review::ReviewError;

/// Shown to users for every server-side failure; details stay in the logs.
pub const GENERIC_FAILURE_MESSAGE: &str = "処理に失敗しました。もう一度お試しください。";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateQuestion(_) => AppError::Validation(err.to_string()),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Backend(inner) => inner.into(),
            // Submit reports this like any other server failure.
            other @ ReviewError::InvalidBirthDate(_) => AppError::ExternalService(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Configuration(_) | AppError::ExternalService(_) => {
                error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": GENERIC_FAILURE_MESSAGE }),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "success": false })),
            AppError::Validation(message) | AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, AppError>;
