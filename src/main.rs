mod models;
mod handlers;
mod services;
mod config;
mod errors;

use anyhow::Context;
use axum::{
    routing::{delete, get, post, put},
    Router,
    extract::DefaultBodyLimit,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use crate::{
    services::SqliteService,
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize SqliteService
    let db_path = config.database.resolved_path();
    tracing::info!("Using database at {}", db_path.display());
    let sqlite_service = SqliteService::new(db_path);

    // Create missing tables, never alter existing ones
    if config.database.create_schema {
        sqlite_service
            .init_schema()
            .await
            .context("Failed to create database schema")?;
    }

    // Create router with all routes
    let app = build_router(sqlite_service, config.limits.max_body_size);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", config.server.host, config.server.port)
    )
    .await
    .context("Failed to bind server")?;
    tracing::info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Failed to start server")?;

    Ok(())
}

pub fn build_router(sqlite_service: SqliteService, max_body_size: usize) -> Router {
    Router::new()
        // Account routes
        .route("/register", post(handlers::handle_register))
        .route("/login", post(handlers::handle_login))
        .route("/change-password", put(handlers::handle_change_password))
        .route("/update-profile", put(handlers::update_profile))

        // User lookups
        .route("/all-users", get(handlers::list_all_users))
        .route("/role/:username", get(handlers::get_user_role))
        .route("/user/:username", get(handlers::get_user_profile))
        .route("/debug/users", get(handlers::debug_users))
        .route("/delete-user/:target_username", delete(handlers::delete_user))

        // Scores
        .route("/points/:username", get(handlers::get_user_points))
        .route("/user-attempts/:username", get(handlers::get_user_attempts))
        .route("/leaderboard", get(handlers::leaderboard))

        // Request spans
        .layer(TraceLayer::new_for_http())

        // Body size limit from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))

        // Add state
        .with_state(sqlite_service)
}
