//! The admin log-viewer JSON API (`/api/admin/logs?action=...`).

mod common;

use axum::http::StatusCode;
use common::{test_app, ADMIN_PASSWORD};

#[tokio::test]
async fn log_api_requires_an_admin_session() {
    let app = test_app();
    let (status, _) = app
        .get("/api/admin/logs?action=get_log_stats", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_log_level_persists_and_validates() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, body) = app
        .get("/api/admin/logs?action=set_log_level&level=debug", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["level"], "debug");
    assert_eq!(
        app.state.db.setting("log_level").unwrap().as_deref(),
        Some("debug")
    );

    let (status, _) = app
        .get(
            "/api/admin/logs?action=set_log_level&level=verbose",
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn log_content_with_no_files_is_empty() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, body) = app
        .get("/api/admin/logs?action=get_log_content", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["file"].is_null());
    assert_eq!(body["lines"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn stats_and_cleanup_cover_dated_files() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;
    let log_dir = app.state.log_ctl.log_dir().to_path_buf();

    let today = chrono::Utc::now().date_naive();
    std::fs::write(
        log_dir.join(format!("d8tl-{today}.log")),
        "2025-08-06T12:00:00Z  INFO d8tl: score recorded\n2025-08-06T12:00:01Z  WARN d8tl: slow query\n",
    )
    .unwrap();
    std::fs::write(log_dir.join("d8tl-2020-01-01.log"), "ancient\n").unwrap();

    let (status, stats) = app
        .get("/api/admin/logs?action=get_log_stats", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["files"].as_array().unwrap().len(), 2);
    assert_eq!(stats["levels"]["warn"], 1);

    let (status, cleaned) = app
        .get(
            "/api/admin/logs?action=cleanup_logs&keep_days=30",
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleaned["deleted"], 1);
    assert!(!log_dir.join("d8tl-2020-01-01.log").exists());
    assert!(log_dir.join(format!("d8tl-{today}.log")).exists());

    let (status, tail) = app
        .get("/api/admin/logs?action=get_log_content&lines=1", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tail["total_lines"], 2);
    let lines = tail["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].as_str().unwrap().contains("slow query"));
}

#[tokio::test]
async fn unknown_log_action_is_rejected() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, _) = app
        .get("/api/admin/logs?action=rotate", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
