use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rusqlite::Connection;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use crate::build_router;
use crate::services::SqliteService;

pub struct TestApp {
    pub router: Router,
    pub sqlite_service: SqliteService,
    _db_dir: TempDir,
}

/// Full router over a fresh database file that lives as long as the app.
pub async fn spawn_app() -> TestApp {
    let db_dir = TempDir::new().unwrap();
    let sqlite_service = SqliteService::new(db_dir.path().join("test.db"));
    sqlite_service.init_schema().await.unwrap();

    TestApp {
        router: build_router(sqlite_service.clone(), 64 * 1024),
        sqlite_service,
        _db_dir: db_dir,
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        body: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_owned()))
            .unwrap();

        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn register(&self, username: &str, password: &str, role: Option<&str>) -> StatusCode {
        let mut body = json!({ "username": username, "password": password });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.request(Method::POST, "/register", Some(body)).await.0
    }

    pub async fn login(&self, username: &str, password: &str) -> StatusCode {
        let body = json!({ "username": username, "password": password });
        self.request(Method::POST, "/login", Some(body)).await.0
    }

    /// Direct SQL for rows the quiz subsystem would normally write.
    pub fn seed(&self, sql: &str) {
        Connection::open(self.sqlite_service.db_path())
            .unwrap()
            .execute_batch(sql)
            .unwrap();
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}
