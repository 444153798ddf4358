use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use crate::errors::AppResult;
use crate::services::SqliteService;

// Points and attempts are tolerant reads: an unknown user is reported as
// zero points and no attempts instead of 404.

pub async fn get_user_points(
    State(sqlite_service): State<SqliteService>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let total_points = sqlite_service
        .get_total_points(&username)
        .await?
        .unwrap_or_else(|| json!(0));

    Ok(Json(json!({ "total_points": total_points })).into_response())
}

pub async fn get_user_attempts(
    State(sqlite_service): State<SqliteService>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    // Unknown user gives an empty list
    let attempts = sqlite_service
        .get_attempts(&username)
        .await?
        .unwrap_or_default();

    tracing::debug!("Found {} attempts for user {}", attempts.len(), username);
    Ok(Json(attempts).into_response())
}

/// Users by `total_points`, highest first. Ties keep store order.
pub async fn leaderboard(
    State(sqlite_service): State<SqliteService>,
) -> AppResult<Response> {
    let entries = sqlite_service.leaderboard().await?;
    Ok(Json(entries).into_response())
}
