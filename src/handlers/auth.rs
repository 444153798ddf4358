use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use crate::errors::{AppError, AppResult};
use crate::models::{ChangePasswordForm, LoginForm, RegisterForm, DEFAULT_ROLE};
use crate::services::SqliteService;

// Passwords are stored and compared in plaintext. Hashing them would not
// change the request/response contract, but it is not done here.

#[axum::debug_handler]
pub async fn handle_register(
    State(sqlite_service): State<SqliteService>,
    WithRejection(Json(register_form), _): WithRejection<Json<RegisterForm>, AppError>,
) -> AppResult<Response> {
    // Absent or null role falls back to the default
    let role = register_form.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());
    tracing::info!("Registration attempt for user: {:?} as {}", register_form.username, role);

    // A NULL username or password trips the same constraint as a duplicate.
    match sqlite_service
        .insert_user(register_form.username.clone(), register_form.password, role)
        .await
    {
        Ok(()) => {
            tracing::info!("Registered user: {:?}", register_form.username);
            Ok((
                StatusCode::CREATED,
                Json(json!({ "message": "User registered successfully!" })),
            ).into_response())
        }
        Err(e) if e.is_constraint() => {
            tracing::warn!("Registration rejected for {:?}: {}", register_form.username, e);
            Err(AppError::Conflict("Username already exists".into()))
        }
        Err(e) => Err(e.into()),
    }
}

#[axum::debug_handler]
pub async fn handle_login(
    State(sqlite_service): State<SqliteService>,
    WithRejection(Json(login_form), _): WithRejection<Json<LoginForm>, AppError>,
) -> AppResult<Response> {
    let username = login_form
        .username
        .ok_or_else(|| AppError::NotFound("Username does not exist.".into()))?;
    tracing::info!("Login attempt for user: {}", username);

    // Look up the stored password
    let stored_password = sqlite_service
        .get_password(&username)
        .await?
        .ok_or_else(|| {
            tracing::warn!("User not found: {}", username);
            AppError::NotFound("Username does not exist.".into())
        })?;

    // Exact string comparison
    if login_form.password.as_deref() != Some(stored_password.as_str()) {
        tracing::warn!("Invalid password for user: {}", username);
        return Err(AppError::Unauthorized("Incorrect password.".into()));
    }

    tracing::info!("Password verified for user: {}", username);
    Ok(Json(json!({ "message": "Login successful!" })).into_response())
}

pub async fn handle_change_password(
    State(sqlite_service): State<SqliteService>,
    WithRejection(Json(form), _): WithRejection<Json<ChangePasswordForm>, AppError>,
) -> AppResult<Response> {
    let username = form
        .username
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let stored_password = sqlite_service
        .get_password(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if form.old_password.as_deref() != Some(stored_password.as_str()) {
        tracing::warn!("Old password mismatch for user: {}", username);
        return Err(AppError::Forbidden("Old password is incorrect".into()));
    }

    // Save new password
    sqlite_service.update_password(&username, form.new_password).await?;

    tracing::info!("Password changed for user: {}", username);
    Ok(Json(json!({ "message": "Password changed successfully!" })).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use crate::handlers::test_support::spawn_app;

    #[tokio::test]
    async fn register_returns_201_then_409_for_same_username() {
        let app = spawn_app().await;

        assert_eq!(app.register("ada", "pw", None).await, StatusCode::CREATED);
        assert_eq!(app.register("ada", "other", None).await, StatusCode::CONFLICT);

        let (_, users) = app.get("/all-users").await;
        assert_eq!(users, json!([{ "username": "ada", "role": "student" }]));
    }

    #[tokio::test]
    async fn register_reports_messages() {
        let app = spawn_app().await;

        let body = json!({ "username": "ada", "password": "pw", "role": "admin" });
        let (status, created) = app.request(Method::POST, "/register", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created, json!({ "message": "User registered successfully!" }));

        let (status, conflict) = app.request(Method::POST, "/register", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(conflict, json!({ "error": "Username already exists" }));

        let (_, role) = app.get("/role/ada").await;
        assert_eq!(role, json!({ "role": "admin" }));
    }

    #[tokio::test]
    async fn register_without_username_is_409() {
        let app = spawn_app().await;

        let (status, _) = app
            .request(Method::POST, "/register", Some(json!({ "password": "pw" })))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn malformed_json_is_400_with_error_body() {
        let app = spawn_app().await;

        let (status, body) = app
            .request_raw(Method::POST, "/register", "application/json", "{ not json")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_user_and_bad_password() {
        let app = spawn_app().await;
        app.register("ada", "pw", None).await;

        assert_eq!(app.login("ada", "pw").await, StatusCode::OK);
        assert_eq!(app.login("ada", "PW").await, StatusCode::UNAUTHORIZED);
        assert_eq!(app.login("ghost", "pw").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_response_bodies() {
        let app = spawn_app().await;
        app.register("ada", "pw", None).await;

        let (_, ok) = app
            .request(Method::POST, "/login", Some(json!({ "username": "ada", "password": "pw" })))
            .await;
        assert_eq!(ok, json!({ "message": "Login successful!" }));

        let (_, bad) = app
            .request(Method::POST, "/login", Some(json!({ "username": "ada", "password": "x" })))
            .await;
        assert_eq!(bad, json!({ "error": "Incorrect password." }));

        let (status, _) = app
            .request(Method::POST, "/login", Some(json!({ "username": "ada" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn change_password_switches_login_to_new_password() {
        let app = spawn_app().await;
        app.register("ada", "old", None).await;

        let (status, body) = app
            .request(
                Method::PUT,
                "/change-password",
                Some(json!({ "username": "ada", "old_password": "old", "new_password": "new" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Password changed successfully!" }));

        assert_eq!(app.login("ada", "new").await, StatusCode::OK);
        assert_eq!(app.login("ada", "old").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_old_password_and_unknown_user() {
        let app = spawn_app().await;
        app.register("ada", "old", None).await;

        let (status, body) = app
            .request(
                Method::PUT,
                "/change-password",
                Some(json!({ "username": "ada", "old_password": "nope", "new_password": "new" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "Old password is incorrect" }));
        assert_eq!(app.login("ada", "old").await, StatusCode::OK);

        let (status, _) = app
            .request(
                Method::PUT,
                "/change-password",
                Some(json!({ "username": "ghost", "old_password": "x", "new_password": "y" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn change_password_without_new_password_is_409() {
        let app = spawn_app().await;
        app.register("ada", "old", None).await;

        let (status, body) = app
            .request(
                Method::PUT,
                "/change-password",
                Some(json!({ "username": "ada", "old_password": "old" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "error": "Constraint violated" }));
        assert_eq!(app.login("ada", "old").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn register_with_null_role_defaults_to_student() {
        let app = spawn_app().await;

        let body = json!({ "username": "ada", "password": "pw", "role": null });
        let (status, _) = app.request(Method::POST, "/register", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(app.get("/role/ada").await.1, json!({ "role": "student" }));
    }
}
