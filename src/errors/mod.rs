use axum::extract::rejection::JsonRejection;
use thiserror::Error;

pub mod response;
pub mod store;

pub use store::{StoreError, StoreResult};

/// Failures a handler reports to the caller. Each variant maps to exactly
/// one status code in `response.rs`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// Malformed JSON bodies get the same `{"error": ...}` shape as everything else.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
