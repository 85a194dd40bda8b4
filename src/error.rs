//! Application error types

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown metric field: {0}")]
    InvalidField(String),

    #[error("Update job is already running")]
    AlreadyRunning,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serializable error response for the rendering layer.
///
/// Failures render an inline message in place of the data they replace,
/// never a silent blank state.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Api(_) => "API_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::InvalidField(_) => "INVALID_FIELD",
            AppError::AlreadyRunning => "ALREADY_RUNNING",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        ErrorResponse::from(&err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
