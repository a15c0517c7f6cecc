/// Error types for Post Service
///
/// Every failure leaves the service as a JSON `{"message": ...}` body. The
/// variant picks the status code; handlers and services choose the variant
/// per operation.
use crate::models::MessageResponse;
use actix_web::{error::ResponseError, http::StatusCode, HttpRequest, HttpResponse};
use thiserror::Error;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found, malformed id, or a failed read
    #[error("{0}")]
    NotFound(String),

    /// Store rejected a new post
    #[error("{0}")]
    Conflict(String),

    /// No authenticated user on the request
    #[error("{0}")]
    Unauthorized(String),

    /// Request could not be decoded
    #[error("{0}")]
    BadRequest(String),

    /// Store failure on a write
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn no_post(id: &str) -> Self {
        AppError::NotFound(format!("No post with id: {}", id))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(MessageResponse::new(self.to_string()))
    }
}

/// Maps extractor rejections (bad query string, JSON body or path) into the
/// common error envelope. Registered through `QueryConfig`, `JsonConfig` and
/// `PathConfig`.
pub fn extractor_error<E: std::fmt::Display>(err: E, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}
