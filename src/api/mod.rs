pub mod admin;
pub mod coach;
pub mod error;
pub mod logs;
pub mod public;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use d8tl_core::notify::{self, Notifier};
use d8tl_core::Database;

use crate::auth;
use crate::config::Config;
use crate::logging::LogControl;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub notifier: Arc<dyn Notifier>,
    pub log_ctl: LogControl,
}

/// Build the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let public_router = Router::new()
        .route("/api/health", get(public::health))
        .route("/api/schedule", get(public::schedule))
        .route("/api/standings", get(public::standings))
        .route("/api/programs", get(public::list_programs))
        .route("/api/divisions", get(public::list_divisions))
        .route("/api/login", post(public::login))
        .with_state(state.clone());

    let coach_router = Router::new()
        .route("/api/logout", post(coach::logout))
        .route("/api/coach/games/{id}/score", post(coach::submit_score))
        .route(
            "/api/coach/games/{id}/change-request",
            post(coach::file_change_request),
        )
        .route(
            "/api/coach/change-requests",
            get(coach::list_change_requests),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_coach,
        ))
        .with_state(state.clone());

    let admin_router = Router::new()
        .route(
            "/api/admin/programs",
            get(admin::list_programs).post(admin::programs_action),
        )
        .route(
            "/api/admin/seasons",
            get(admin::list_seasons).post(admin::seasons_action),
        )
        .route(
            "/api/admin/divisions",
            get(admin::list_divisions).post(admin::divisions_action),
        )
        .route(
            "/api/admin/teams",
            get(admin::list_teams).post(admin::teams_action),
        )
        .route(
            "/api/admin/locations",
            get(admin::list_locations).post(admin::locations_action),
        )
        .route(
            "/api/admin/games",
            get(admin::list_games).post(admin::games_action),
        )
        .route(
            "/api/admin/email-templates",
            get(admin::list_templates).post(admin::templates_action),
        )
        .route(
            "/api/admin/email-recipients",
            get(admin::list_recipients).post(admin::recipients_action),
        )
        .route(
            "/api/admin/change-requests",
            get(admin::list_change_requests).post(admin::change_requests_action),
        )
        .route(
            "/api/admin/settings",
            get(admin::list_settings).post(admin::settings_action),
        )
        .route("/api/admin/logs", get(logs::logs_api))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ))
        .with_state(state);

    // Cookie auth needs credentialed CORS, which rules out a wildcard
    // origin; only local development origins are allowed.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let origin = origin.to_str().unwrap_or("");
            origin.starts_with("http://localhost:") || origin.starts_with("http://127.0.0.1:")
        }));

    Router::new()
        .merge(public_router)
        .merge(coach_router)
        .merge(admin_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Assemble and hand off a game notification. Failures are logged, not
/// surfaced: the triggering request already succeeded.
pub(crate) fn fire_game_notification(state: &AppState, template: &str, game_id: Uuid) {
    if !state.config.notifications_enabled {
        return;
    }
    match notify::build_game_message(&state.db, template, game_id) {
        Ok(Some(message)) => state.notifier.deliver(&message),
        Ok(None) => {}
        Err(err) => tracing::warn!(
            template,
            %game_id,
            error = %format!("{err:#}"),
            "failed to assemble notification"
        ),
    }
}
