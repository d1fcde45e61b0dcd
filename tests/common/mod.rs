//! Shared harness for the router-level integration tests: an in-memory
//! application, login helpers and form-post plumbing.

// Each test binary uses a different slice of the harness.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt; // for `oneshot`

use d8tl::api::{create_router, AppState};
use d8tl::auth;
use d8tl::config::{Config, Layout, Paths, APP_NAME, VERSION};
use d8tl::logging::LogControl;
use d8tl::notifier::CollectingNotifier;
use d8tl_core::Database;

pub const COACH_PASSWORD: &str = "GoRockets2025!";
pub const ADMIN_PASSWORD: &str = "Commissioner-D8-2025";

pub struct TestApp {
    pub state: AppState,
    pub notifier: Arc<CollectingNotifier>,
    // Holds the temp data directory for the app's lifetime.
    _tmp: tempfile::TempDir,
}

pub fn test_app() -> TestApp {
    test_app_with(true)
}

pub fn test_app_with(coach_portal_enabled: bool) -> TestApp {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = Database::open_in_memory().expect("open db");
    db.migrate().expect("migrate");
    db.put_setting(
        "coach_password_hash",
        &auth::hash_password(COACH_PASSWORD).expect("hash"),
    )
    .expect("seed coach password");
    db.put_setting(
        "admin_password_hash",
        &auth::hash_password(ADMIN_PASSWORD).expect("hash"),
    )
    .expect("seed admin password");

    let paths = Paths {
        data_dir: tmp.path().to_path_buf(),
        db_path: tmp.path().join("d8tl.db"),
        log_dir: tmp.path().join("logs"),
        backup_dir: tmp.path().join("backups"),
    };
    std::fs::create_dir_all(&paths.log_dir).expect("log dir");

    let log_dir = paths.log_dir.clone();
    let config = Arc::new(Config {
        app_name: APP_NAME,
        version: VERSION,
        bind: "127.0.0.1".into(),
        port: 0,
        paths,
        layout: Layout::Development,
        coach_portal_enabled,
        notifications_enabled: true,
    });

    let notifier = Arc::new(CollectingNotifier::default());
    let state = AppState {
        db,
        config,
        notifier: notifier.clone(),
        log_ctl: LogControl::noop(log_dir),
    };
    TestApp {
        state,
        notifier,
        _tmp: tmp,
    }
}

/// A logged-in portal session: the cookie to send and the CSRF token
/// that must ride along on every form post.
#[derive(Debug, Clone)]
pub struct Session {
    pub cookie: String,
    pub csrf_token: String,
}

impl TestApp {
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn login(&self, role: &str, password: &str) -> Session {
        let (status, headers, body) = self
            .post_form_raw("/api/login", &[("role", role), ("password", password)], None)
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        let cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .expect("session cookie")
            .to_string();
        let csrf_token = body["csrf_token"].as_str().expect("csrf token").to_string();
        Session { cookie, csrf_token }
    }

    pub async fn get(&self, uri: &str, session: Option<&Session>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri(uri).method("GET");
        if let Some(session) = session {
            builder = builder.header(header::COOKIE, &session.cookie);
        }
        let request = builder.body(Body::empty()).expect("request");
        self.send(request).await
    }

    /// Form post with the session's CSRF token appended automatically.
    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        session: &Session,
    ) -> (StatusCode, serde_json::Value) {
        let mut fields: Vec<(&str, &str)> = fields.to_vec();
        fields.push(("csrf_token", session.csrf_token.as_str()));
        let (status, _headers, body) = self.post_form_raw(uri, &fields, Some(session)).await;
        (status, body)
    }

    pub async fn post_form_raw(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        session: Option<&Session>,
    ) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(session) = session {
            builder = builder.header(header::COOKIE, &session.cookie);
        }
        let request = builder.body(Body::from(body)).expect("request");

        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, headers, json)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
