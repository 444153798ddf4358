use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use crate::errors::{AppError, StoreError};

// Every error leaves the service as `{"error": "<message>"}` with a matching status.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => error_body(StatusCode::CONFLICT, msg),
            AppError::Unauthorized(msg) => error_body(StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => error_body(StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),

            AppError::Store(err) => convert_store_error(err),
        }
    }
}

fn error_body(status: StatusCode, msg: String) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

// Store errors that reach here were not claimed by a handler.
fn convert_store_error(err: StoreError) -> Response {
    match err {
        StoreError::Constraint(msg) => {
            tracing::warn!("Unhandled constraint violation: {}", msg);
            error_body(StatusCode::CONFLICT, "Constraint violated".to_string())
        }

        _ => {
            tracing::error!("Store failure: {}", err);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", err))
        }
    }
}
