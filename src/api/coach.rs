use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Form, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use d8tl_core::models::{CreateChangeRequestInput, PortalSession};

use crate::auth::{check_csrf, SESSION_COOKIE};

use super::admin::{opt_date_field, opt_time_field, opt_uuid_field};
use super::error::ApiError;
use super::{fire_game_notification, AppState};

#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    pub csrf_token: String,
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<LogoutForm>,
) -> Result<impl IntoResponse, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    state.db.delete_portal_session(session.id)?;
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "logged_out": true })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ScoreForm {
    pub home_score: String,
    pub away_score: String,
    pub csrf_token: String,
}

fn parse_score(raw: &str, name: &str) -> Result<i64, ApiError> {
    let score: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{name} must be a whole number")))?;
    if !(0..=200).contains(&score) {
        return Err(ApiError::bad_request(format!(
            "{name} must be between 0 and 200"
        )));
    }
    Ok(score)
}

pub async fn submit_score(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Path(game_id): Path<Uuid>,
    Form(form): Form<ScoreForm>,
) -> Result<impl IntoResponse, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    let home_score = parse_score(&form.home_score, "Home score")?;
    let away_score = parse_score(&form.away_score, "Away score")?;

    if !state.db.record_score(game_id, home_score, away_score)? {
        return Err(ApiError::not_found("Game not found"));
    }
    tracing::info!(%game_id, home_score, away_score, "score recorded");
    fire_game_notification(&state, "score_posted", game_id);

    let game = state
        .db
        .get_game(game_id)?
        .ok_or_else(|| ApiError::not_found("Game not found"))?;
    Ok(Json(game))
}

#[derive(Debug, Deserialize)]
pub struct ChangeRequestForm {
    pub requested_date: Option<String>,
    pub requested_time: Option<String>,
    pub requested_location_id: Option<String>,
    pub reason: Option<String>,
    pub csrf_token: String,
}

pub async fn file_change_request(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Path(game_id): Path<Uuid>,
    Form(form): Form<ChangeRequestForm>,
) -> Result<impl IntoResponse, ApiError> {
    check_csrf(&session, &form.csrf_token)?;

    if state.db.get_game(game_id)?.is_none() {
        return Err(ApiError::not_found("Game not found"));
    }

    let input = CreateChangeRequestInput {
        game_id,
        requested_date: opt_date_field(form.requested_date, "requested_date")?,
        requested_time: opt_time_field(form.requested_time)?,
        requested_location_id: opt_uuid_field(form.requested_location_id, "requested_location_id")?,
        reason: form.reason.unwrap_or_default().trim().to_string(),
    };
    input.validate().map_err(ApiError::bad_request)?;

    if let Some(location_id) = input.requested_location_id {
        if state.db.get_location(location_id)?.is_none() {
            return Err(ApiError::bad_request("Requested location does not exist"));
        }
    }

    if !state
        .db
        .list_change_requests(
            Some(d8tl_core::models::ChangeRequestStatus::Pending),
            Some(game_id),
        )?
        .is_empty()
    {
        return Err(ApiError::conflict(
            "A change request is already pending for this game",
        ));
    }

    let request = state.db.create_change_request(input)?;
    tracing::info!(%game_id, request_id = %request.id, "schedule change requested");
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
pub struct ChangeRequestsQuery {
    pub game_id: Option<Uuid>,
}

pub async fn list_change_requests(
    State(state): State<AppState>,
    Query(query): Query<ChangeRequestsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_change_requests(None, query.game_id)?))
}
