use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use courier_api::{
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    AppState,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Helper harness for spinning up an application router backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub db: Arc<DbPool>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // Single connection so the in-memory database survives the pool.
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("connect test database");
        db::run_migrations(&pool).await.expect("run migrations");

        let db = Arc::new(pool);
        let config = AppConfig::new("sqlite::memory:", "127.0.0.1", 0, "test");
        let state = AppState {
            db: db.clone(),
            config,
        };

        Self {
            router: courier_api::build_router(state),
            db,
        }
    }

    /// Issue a request; a JSON body is attached when provided.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.send(method, uri, None, body).await
    }

    /// Issue a request carrying an `X-Forwarded-For` header, the way the
    /// service sees client addresses behind a proxy.
    pub async fn request_from_ip(
        &self,
        method: Method,
        uri: &str,
        ip: &str,
        body: Option<Value>,
    ) -> Response {
        self.send(method, uri, Some(ip), body).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        forwarded_for: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("send request")
    }
}

/// Read and parse a JSON response body.
pub async fn read_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse response body")
}
