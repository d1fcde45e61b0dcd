use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Form, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use d8tl_core::models::{PortalRole, ScheduleFilter};
use d8tl_core::standings;

use crate::auth::{self, SESSION_COOKIE};

use super::error::ApiError;
use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app: &'static str,
    pub version: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        app: state.config.app_name,
        version: state.config.version,
    })
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub division_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ScheduleFilter {
        division_id: query.division_id,
        team_id: query.team_id,
        from: query.from,
        to: query.to,
    };
    Ok(Json(state.db.list_schedule(&filter)?))
}

#[derive(Debug, Deserialize)]
pub struct StandingsQuery {
    pub division_id: Uuid,
}

pub async fn standings(
    State(state): State<AppState>,
    Query(query): Query<StandingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_division(query.division_id)?.is_none() {
        return Err(ApiError::not_found("Division not found"));
    }
    let teams = state.db.list_teams(Some(query.division_id))?;
    let games = state.db.list_games(Some(query.division_id))?;
    Ok(Json(standings::compute(&teams, &games)))
}

pub async fn list_programs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_programs()?))
}

#[derive(Debug, Deserialize)]
pub struct DivisionsQuery {
    pub season_id: Option<Uuid>,
}

pub async fn list_divisions(
    State(state): State<AppState>,
    Query(query): Query<DivisionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_divisions(query.season_id)?))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub role: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub role: PortalRole,
    pub csrf_token: Uuid,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let role = PortalRole::from_str(form.role.trim())
        .ok_or_else(|| ApiError::bad_request("Unknown portal role"))?;
    if role == PortalRole::Coach && !state.config.coach_portal_enabled {
        return Err(ApiError::forbidden("Coach portal is disabled"));
    }
    if !auth::verify_portal_password(&state, role, &form.password)? {
        return Err(ApiError::unauthorized("Invalid password"));
    }

    // Opportunistic housekeeping; logins are rare enough.
    state.db.purge_expired_sessions()?;

    let ttl = auth::session_ttl();
    let session = state.db.create_portal_session(role, ttl)?;
    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id,
        ttl.num_seconds()
    );
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            role: session.role,
            csrf_token: session.csrf_token,
            expires_at: session.expires_at,
        }),
    ))
}
