use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use crate::errors::{AppError, AppResult};
use crate::models::{DeleteUserForm, UpdateProfileForm, ADMIN_ROLE};
use crate::services::{ProfileUpdate, SqliteService};

pub async fn list_all_users(
    State(sqlite_service): State<SqliteService>,
) -> AppResult<Response> {
    let users = sqlite_service.list_users().await?;
    tracing::debug!("Listing {} users", users.len());
    Ok(Json(users).into_response())
}

pub async fn get_user_role(
    State(sqlite_service): State<SqliteService>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let role = sqlite_service
        .get_role(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    // A NULL role is reported as null, not as a missing user
    Ok(Json(json!({ "role": role })).into_response())
}

pub async fn get_user_profile(
    State(sqlite_service): State<SqliteService>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let profile = sqlite_service
        .get_profile(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(profile).into_response())
}

pub async fn update_profile(
    State(sqlite_service): State<SqliteService>,
    WithRejection(Json(form), _): WithRejection<Json<UpdateProfileForm>, AppError>,
) -> AppResult<Response> {
    let current_username = form
        .current_username
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    tracing::info!("Profile update for user: {}", current_username);

    match sqlite_service
        .update_profile(&current_username, form.new_username, form.full_name)
        .await
    {
        Ok(ProfileUpdate::Updated) => {
            Ok(Json(json!({ "message": "Profile updated!" })).into_response())
        }
        Ok(ProfileUpdate::UserMissing) => Err(AppError::NotFound("User not found".into())),
        Ok(ProfileUpdate::UsernameTaken) => {
            tracing::warn!("Rename of {} rejected: username taken", current_username);
            Err(AppError::Conflict("New username is already taken".into()))
        }
        // Lost a race with a concurrent rename or registration.
        Err(e) if e.is_constraint() => {
            tracing::warn!("Rename of {} hit constraint: {}", current_username, e);
            Err(AppError::Conflict("New username is already taken".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Raw dump of the `users` table, passwords included.
pub async fn debug_users(
    State(sqlite_service): State<SqliteService>,
) -> AppResult<Response> {
    tracing::warn!("Debug dump of users table requested");
    let rows = sqlite_service.dump_users().await?;
    Ok(Json(rows).into_response())
}

#[axum::debug_handler]
pub async fn delete_user(
    State(sqlite_service): State<SqliteService>,
    Path(target_username): Path<String>,
    body: Option<Json<DeleteUserForm>>,
) -> AppResult<Response> {
    // Requester must be named in the body
    let requesting_username = body
        .and_then(|Json(form)| form.requesting_username)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("Requesting user not provided".into()))?;

    // Get requester's role
    let role = sqlite_service
        .get_role(&requesting_username)
        .await?
        .ok_or_else(|| AppError::NotFound("Requesting user not found".into()))?;

    // Exact match only; a NULL role is never admin
    if role.as_deref() != Some(ADMIN_ROLE) {
        tracing::warn!("Non-admin {} tried to delete {}", requesting_username, target_username);
        return Err(AppError::Forbidden("Only admins can delete users".into()));
    }

    // Self-delete is checked only after the role
    if requesting_username == target_username {
        return Err(AppError::Forbidden("You cannot delete yourself".into()));
    }

    // Delete target row; a missing target is not an error
    let removed = sqlite_service.delete_user(&target_username).await?;
    tracing::info!(
        "Admin {} deleted user {} ({} row(s))",
        requesting_username, target_username, removed
    );

    Ok(Json(json!({
        "message": format!("User '{}' has been deleted.", target_username)
    })).into_response())
}
