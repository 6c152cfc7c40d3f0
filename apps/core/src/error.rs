use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::actors::messages::{ActorError, GatewayError};
use crate::models::ErrorBody;

/// Input rejected at the boundary, before any classification or gateway call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The question is empty or whitespace-only.
    #[error("question is empty")]
    Empty,
    /// The question exceeds the configured character limit.
    #[error("question is {actual} characters long, maximum is {max}")]
    TooLong { max: usize, actual: usize },
    /// The request body could not be decoded.
    #[error("malformed request: {0}")]
    Malformed(String),
}

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents data validation errors (empty or oversize input, bad JSON).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Represents configuration-related errors (e.g., missing environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion gateway failed and no fallback path was allowed.
    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] GatewayError),

    /// Represents errors specific to the actor system, such as communication failures.
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl AppError {
    /// HTTP status this error maps to at the boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The body shown to the end user. Internal details stay in the logs.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            AppError::Validation(ValidationError::Empty) => {
                ErrorBody::new("Пустой запрос", Some("Пожалуйста, введите вопрос".to_string()))
            }
            AppError::Validation(ValidationError::TooLong { max, .. }) => ErrorBody::new(
                "Слишком длинный запрос",
                Some(format!("Максимальная длина вопроса: {} символов", max)),
            ),
            AppError::Validation(ValidationError::Malformed(details)) => {
                ErrorBody::new("Некорректный запрос", Some(details.clone()))
            }
            AppError::Config(_) => ErrorBody::new(
                "Сервис ответов не настроен",
                Some("Пожалуйста, обратитесь к администратору сообщества".to_string()),
            ),
            _ => ErrorBody::new(
                "Внутренняя ошибка сервера",
                Some("Пожалуйста, попробуйте еще раз позже".to_string()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(format!("Operation timed out: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(ValidationError::Malformed(format!("JSON error: {}", err)))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Config(format!("Validation errors: {}", err))
    }
}
