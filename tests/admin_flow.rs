//! Back-office flows driven through the router.

mod common;

use axum::http::StatusCode;
use common::{test_app, ADMIN_PASSWORD, COACH_PASSWORD};

#[tokio::test]
async fn program_lifecycle_add_list_delete() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, program) = app
        .post_form(
            "/api/admin/programs",
            &[
                ("action", "add"),
                ("name", "Baseball 12U"),
                ("code", "BB12U"),
                ("sport", "Baseball"),
                ("min_age", "8"),
                ("max_age", "12"),
            ],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{program}");
    let program_id = program["id"].as_str().unwrap().to_string();

    let (status, listed) = app.get("/api/admin/programs", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["code"], "BB12U");
    assert_eq!(rows[0]["season_count"], 0);

    let (status, body) = app
        .post_form(
            "/api/admin/programs",
            &[("action", "delete"), ("id", &program_id)],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, listed) = app.get("/api/admin/programs", Some(&admin)).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn program_delete_blocked_message_enumerates_dependents() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (_, program) = app
        .post_form(
            "/api/admin/programs",
            &[
                ("action", "add"),
                ("name", "Softball 10U"),
                ("code", "SB10U"),
                ("sport", "Softball"),
                ("min_age", "7"),
                ("max_age", "10"),
            ],
            &admin,
        )
        .await;
    let program_id = program["id"].as_str().unwrap().to_string();

    let (status, season) = app
        .post_form(
            "/api/admin/seasons",
            &[
                ("action", "add"),
                ("program_id", &program_id),
                ("name", "Spring 2025"),
                ("start_date", "2025-04-01"),
                ("end_date", "2025-06-30"),
            ],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{season}");

    let (status, body) = app
        .post_form(
            "/api/admin/programs",
            &[("action", "delete"), ("id", &program_id)],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("1 season"), "unexpected message: {message}");
    assert!(!message.contains("team"), "unexpected message: {message}");
    assert!(!message.contains("game"), "unexpected message: {message}");
}

#[tokio::test]
async fn mutations_require_a_valid_csrf_token() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, _, body) = app
        .post_form_raw(
            "/api/admin/programs",
            &[
                ("action", "add"),
                ("name", "Baseball 12U"),
                ("code", "BB12U"),
                ("sport", "Baseball"),
                ("min_age", "8"),
                ("max_age", "12"),
                ("csrf_token", "00000000-0000-0000-0000-000000000000"),
            ],
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(body["error"], "Invalid CSRF token");
}

#[tokio::test]
async fn back_office_is_admin_only() {
    let app = test_app();

    let (status, _) = app.get("/api/admin/programs", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let coach = app.login("coach", COACH_PASSWORD).await;
    let (status, _) = app.get("/api/admin/programs", Some(&coach)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn static_email_recipient_requires_an_address() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (_, templates) = app.get("/api/admin/email-templates", Some(&admin)).await;
    let template_id = templates
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["template_name"] == "score_posted")
        .and_then(|t| t["id"].as_str())
        .unwrap()
        .to_string();

    let (status, body) = app
        .post_form(
            "/api/admin/email-recipients",
            &[
                ("action", "add"),
                ("template_id", &template_id),
                ("recipient_type", "static_to"),
                ("recipient_source", "static_email"),
                ("email_address", ""),
            ],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .post_form(
            "/api/admin/email-recipients",
            &[
                ("action", "add"),
                ("template_id", &template_id),
                ("recipient_type", "static_to"),
                ("recipient_source", "static_email"),
                ("email_address", "commissioner@d8tl.org"),
            ],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn settings_updates_validate_before_writing() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, _) = app
        .post_form(
            "/api/admin/settings",
            &[("action", "update_timezone"), ("timezone", "Mars/Olympus")],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_form(
            "/api/admin/settings",
            &[("action", "update_timezone"), ("timezone", "America/Chicago")],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, settings) = app.get("/api/admin/settings", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["timezone"], "America/Chicago");
    assert!(
        settings.as_object().unwrap().keys().all(|k| !k.ends_with("_hash")),
        "password hashes leaked into the settings listing"
    );

    let (status, body) = app
        .post_form(
            "/api/admin/settings",
            &[
                ("action", "update_league"),
                ("contact_email", "not-an-address"),
            ],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn password_change_requires_matching_confirmation() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, body) = app
        .post_form(
            "/api/admin/settings",
            &[
                ("action", "change_coach_password"),
                ("password", "NewCoachSecret1"),
                ("confirm", "NewCoachSecret2"),
            ],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");

    let (status, _) = app
        .post_form(
            "/api/admin/settings",
            &[
                ("action", "change_coach_password"),
                ("password", "NewCoachSecret1"),
                ("confirm", "NewCoachSecret1"),
            ],
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old coach password no longer works, new one does.
    let (status, _, _) = app
        .post_form_raw(
            "/api/login",
            &[("role", "coach"), ("password", COACH_PASSWORD)],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    app.login("coach", "NewCoachSecret1").await;
}

#[tokio::test]
async fn unknown_actions_are_rejected() {
    let app = test_app();
    let admin = app.login("admin", ADMIN_PASSWORD).await;

    let (status, body) = app
        .post_form("/api/admin/programs", &[("action", "upsert")], &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unknown action"));
}
