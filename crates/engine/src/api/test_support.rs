//! In-process server backed by a temporary SQLite file.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use grupa_domain::UserId;

use super::{router, ApiState, ConnectionManager};
use crate::app::App;
use crate::infrastructure::{
    blob_store::FsBlobStore,
    clock::{FixedClock, FixedRandom},
    config::AppConfig,
    mailer::LogMailer,
    sqlite::SqliteRepositories,
};

/// FixedRandom(7) makes every sign-in code "7777".
pub const SIGN_IN_CODE: &str = "7777";
/// Join code of every workspace created under FixedRandom(7).
pub const JOIN_CODE: &str = "777777";
pub const MAX_UPLOAD_BYTES: usize = 1024;

pub struct TestServer {
    pub state: Arc<ApiState>,
    pub router: Router,
    _dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repos = SqliteRepositories::connect(&dir.path().join("grupa.db"))
            .await
            .unwrap();
        let blobs = FsBlobStore::new(dir.path().join("uploads")).await.unwrap();
        let config = AppConfig {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            ..AppConfig::default()
        };
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 5, 4, 10, 30, 0).unwrap());

        let app = App::new(
            repos,
            Arc::new(LogMailer),
            Arc::new(blobs),
            Arc::new(clock),
            Arc::new(FixedRandom(7)),
            config,
        );
        let state = ApiState::new(Arc::new(app), Arc::new(ConnectionManager::new()));
        let router = router(state.clone());
        Self {
            state,
            router,
            _dir: dir,
        }
    }

    /// Sign in through the use case layer and return the bearer token.
    pub async fn sign_in(&self, email: &str, name: &str) -> (String, UserId) {
        let auth = &self.state.app.use_cases.auth;
        auth.request_code(email).await.unwrap();
        let session = auth
            .verify_code(email, SIGN_IN_CODE, Some(name.to_string()))
            .await
            .unwrap();
        (session.token, session.user.id)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
