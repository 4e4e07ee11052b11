use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tinylink_core::ShortenerError;
use tinylink_redirector::RedirectorError;
use tracing::{debug, error};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced to HTTP clients.
///
/// Only the variant reaches the client; the carried detail is logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("URL not found: {0}")]
    NotFound(String),
    #[error("server error: {0}")]
    Server(String),
}

impl From<ShortenerError> for AppError {
    fn from(error: ShortenerError) -> Self {
        match error {
            ShortenerError::InvalidUrl(reason) => AppError::InvalidUrl(reason),
            other => AppError::Server(other.to_string()),
        }
    }
}

impl From<RedirectorError> for AppError {
    fn from(error: RedirectorError) -> Self {
        match error {
            RedirectorError::NotFound(code) => AppError::NotFound(code.to_string()),
            other => AppError::Server(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidUrl(reason) => {
                debug!(reason = %reason, "rejecting request");
                (StatusCode::BAD_REQUEST, "Invalid URL")
            }
            AppError::NotFound(code) => {
                debug!(code = %code, "short code not found");
                (StatusCode::NOT_FOUND, "URL not found")
            }
            AppError::Server(cause) => {
                error!(error = %cause, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
