//! Admin back office. Every entity endpoint keeps the classic shape:
//! `GET` lists, `POST` dispatches on an `action` form field to one of
//! add/update/delete. Form fields arrive as strings and are parsed
//! here; the store trusts its callers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use d8tl_core::models::*;

use crate::auth::{self, check_csrf};

use super::error::{ensure_deleted, ApiError};
use super::{fire_game_notification, AppState};

/// Zones the league operates in. The settings store itself does not
/// validate; this handler does.
pub const SUPPORTED_TIMEZONES: &[&str] = &[
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Phoenix",
    "America/Los_Angeles",
    "UTC",
];

// ---- form field parsing ------------------------------------------------

pub(crate) fn text_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn require_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    text_field(value).ok_or_else(|| ApiError::bad_request(format!("Missing required field: {name}")))
}

pub(crate) fn uuid_field(value: Option<String>, name: &str) -> Result<Uuid, ApiError> {
    let raw = require_field(value, name)?;
    Uuid::parse_str(&raw).map_err(|_| ApiError::bad_request(format!("{name} is not a valid id")))
}

pub(crate) fn opt_uuid_field(value: Option<String>, name: &str) -> Result<Option<Uuid>, ApiError> {
    text_field(value)
        .map(|raw| {
            Uuid::parse_str(&raw)
                .map_err(|_| ApiError::bad_request(format!("{name} is not a valid id")))
        })
        .transpose()
}

pub(crate) fn date_field(value: Option<String>, name: &str) -> Result<NaiveDate, ApiError> {
    let raw = require_field(value, name)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{name} must be a YYYY-MM-DD date")))
}

pub(crate) fn opt_date_field(
    value: Option<String>,
    name: &str,
) -> Result<Option<NaiveDate>, ApiError> {
    text_field(value)
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request(format!("{name} must be a YYYY-MM-DD date")))
        })
        .transpose()
}

pub(crate) fn opt_time_field(value: Option<String>) -> Result<Option<String>, ApiError> {
    text_field(value)
        .map(|raw| {
            chrono::NaiveTime::parse_from_str(&raw, "%H:%M")
                .map(|_| raw)
                .map_err(|_| ApiError::bad_request("Game time must be HH:MM"))
        })
        .transpose()
}

pub(crate) fn time_field(value: Option<String>) -> Result<String, ApiError> {
    opt_time_field(Some(require_field(value, "game_time")?))?
        .ok_or_else(|| ApiError::bad_request("Missing required field: game_time"))
}

fn age_field(value: Option<String>, name: &str) -> Result<u8, ApiError> {
    require_field(value, name)?
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{name} must be an age")))
}

fn opt_age_field(value: Option<String>, name: &str) -> Result<Option<u8>, ApiError> {
    text_field(value)
        .map(|raw| {
            raw.parse()
                .map_err(|_| ApiError::bad_request(format!("{name} must be an age")))
        })
        .transpose()
}

fn opt_f64_field(value: Option<String>, name: &str) -> Result<Option<f64>, ApiError> {
    text_field(value)
        .map(|raw| {
            raw.parse()
                .map_err(|_| ApiError::bad_request(format!("{name} must be a number")))
        })
        .transpose()
}

fn opt_bool_field(value: Option<String>, name: &str) -> Result<Option<bool>, ApiError> {
    match text_field(value).as_deref() {
        None => Ok(None),
        Some("true" | "1" | "on" | "yes") => Ok(Some(true)),
        Some("false" | "0" | "off" | "no") => Ok(Some(false)),
        Some(_) => Err(ApiError::bad_request(format!("{name} must be a boolean"))),
    }
}

// ---- programs ----------------------------------------------------------

pub async fn list_programs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_programs()?))
}

#[derive(Debug, Deserialize)]
pub struct ProgramForm {
    pub action: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub sport: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub is_active: Option<String>,
    pub csrf_token: String,
}

pub async fn programs_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<ProgramForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let min_age = age_field(form.min_age, "min_age")?;
            let max_age = age_field(form.max_age, "max_age")?;
            if min_age > max_age {
                return Err(ApiError::bad_request("min_age cannot exceed max_age"));
            }
            let program = state.db.create_program(CreateProgramInput {
                name: require_field(form.name, "name")?,
                code: require_field(form.code, "code")?,
                sport: require_field(form.sport, "sport")?,
                min_age,
                max_age,
            })?;
            tracing::info!(program = %program.code, "program added");
            Ok((StatusCode::CREATED, Json(program)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            let updated = state.db.update_program(
                id,
                UpdateProgramInput {
                    name: text_field(form.name),
                    code: text_field(form.code),
                    sport: text_field(form.sport),
                    min_age: opt_age_field(form.min_age, "min_age")?,
                    max_age: opt_age_field(form.max_age, "max_age")?,
                    is_active: opt_bool_field(form.is_active, "is_active")?,
                },
            )?;
            if !updated {
                return Err(ApiError::not_found("Program not found"));
            }
            let program = state
                .db
                .get_program(id)?
                .ok_or_else(|| ApiError::not_found("Program not found"))?;
            Ok(Json(program).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            let program = state
                .db
                .get_program(id)?
                .ok_or_else(|| ApiError::not_found("Program not found"))?;
            ensure_deleted(state.db.delete_program(id)?, "program", &program.name)?;
            tracing::info!(program = %program.code, "program deleted");
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- seasons -----------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SeasonsQuery {
    pub program_id: Option<Uuid>,
}

pub async fn list_seasons(
    State(state): State<AppState>,
    Query(query): Query<SeasonsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_seasons(query.program_id)?))
}

#[derive(Debug, Deserialize)]
pub struct SeasonForm {
    pub action: String,
    pub id: Option<String>,
    pub program_id: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub csrf_token: String,
}

pub async fn seasons_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<SeasonForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let program_id = uuid_field(form.program_id, "program_id")?;
            if state.db.get_program(program_id)?.is_none() {
                return Err(ApiError::bad_request("Program does not exist"));
            }
            let start_date = date_field(form.start_date, "start_date")?;
            let end_date = date_field(form.end_date, "end_date")?;
            if end_date < start_date {
                return Err(ApiError::bad_request("end_date is before start_date"));
            }
            let season = state.db.create_season(CreateSeasonInput {
                program_id,
                name: require_field(form.name, "name")?,
                start_date,
                end_date,
            })?;
            Ok((StatusCode::CREATED, Json(season)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            let status = text_field(form.status)
                .map(|raw| {
                    SeasonStatus::from_str(&raw)
                        .ok_or_else(|| ApiError::bad_request("Unknown season status"))
                })
                .transpose()?;
            let updated = state.db.update_season(
                id,
                UpdateSeasonInput {
                    name: text_field(form.name),
                    start_date: opt_date_field(form.start_date, "start_date")?,
                    end_date: opt_date_field(form.end_date, "end_date")?,
                    status,
                },
            )?;
            if !updated {
                return Err(ApiError::not_found("Season not found"));
            }
            let season = state
                .db
                .get_season(id)?
                .ok_or_else(|| ApiError::not_found("Season not found"))?;
            Ok(Json(season).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            let season = state
                .db
                .get_season(id)?
                .ok_or_else(|| ApiError::not_found("Season not found"))?;
            ensure_deleted(state.db.delete_season(id)?, "season", &season.name)?;
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- divisions ---------------------------------------------------------

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
pub struct DivisionForm {
    pub action: String,
    pub id: Option<String>,
    pub season_id: Option<String>,
    pub name: Option<String>,
    pub csrf_token: String,
}

pub async fn divisions_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<DivisionForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let season_id = uuid_field(form.season_id, "season_id")?;
            if state.db.get_season(season_id)?.is_none() {
                return Err(ApiError::bad_request("Season does not exist"));
            }
            let division = state.db.create_division(CreateDivisionInput {
                season_id,
                name: require_field(form.name, "name")?,
            })?;
            Ok((StatusCode::CREATED, Json(division)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            let updated = state.db.update_division(
                id,
                UpdateDivisionInput {
                    name: text_field(form.name),
                },
            )?;
            if !updated {
                return Err(ApiError::not_found("Division not found"));
            }
            let division = state
                .db
                .get_division(id)?
                .ok_or_else(|| ApiError::not_found("Division not found"))?;
            Ok(Json(division).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            let division = state
                .db
                .get_division(id)?
                .ok_or_else(|| ApiError::not_found("Division not found"))?;
            ensure_deleted(state.db.delete_division(id)?, "division", &division.name)?;
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- teams -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TeamsQuery {
    pub division_id: Option<Uuid>,
}

pub async fn list_teams(
    State(state): State<AppState>,
    Query(query): Query<TeamsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_teams(query.division_id)?))
}

#[derive(Debug, Deserialize)]
pub struct TeamForm {
    pub action: String,
    pub id: Option<String>,
    pub division_id: Option<String>,
    pub name: Option<String>,
    pub manager_name: Option<String>,
    pub manager_email: Option<String>,
    pub manager_phone: Option<String>,
    pub csrf_token: String,
}

pub async fn teams_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<TeamForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let division_id = uuid_field(form.division_id, "division_id")?;
            if state.db.get_division(division_id)?.is_none() {
                return Err(ApiError::bad_request("Division does not exist"));
            }
            let team = state.db.create_team(CreateTeamInput {
                division_id,
                name: require_field(form.name, "name")?,
                manager_name: require_field(form.manager_name, "manager_name")?,
                manager_email: text_field(form.manager_email),
                manager_phone: text_field(form.manager_phone),
            })?;
            Ok((StatusCode::CREATED, Json(team)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            let updated = state.db.update_team(
                id,
                UpdateTeamInput {
                    name: text_field(form.name),
                    manager_name: text_field(form.manager_name),
                    manager_email: text_field(form.manager_email),
                    manager_phone: text_field(form.manager_phone),
                },
            )?;
            if !updated {
                return Err(ApiError::not_found("Team not found"));
            }
            let team = state
                .db
                .get_team(id)?
                .ok_or_else(|| ApiError::not_found("Team not found"))?;
            Ok(Json(team).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            let team = state
                .db
                .get_team(id)?
                .ok_or_else(|| ApiError::not_found("Team not found"))?;
            ensure_deleted(state.db.delete_team(id)?, "team", &team.name)?;
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- locations ---------------------------------------------------------

pub async fn list_locations(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_locations()?))
}

#[derive(Debug, Deserialize)]
pub struct LocationForm {
    pub action: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub csrf_token: String,
}

pub async fn locations_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<LocationForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let location = state.db.create_location(CreateLocationInput {
                name: require_field(form.name, "name")?,
                address: require_field(form.address, "address")?,
                latitude: opt_f64_field(form.latitude, "latitude")?,
                longitude: opt_f64_field(form.longitude, "longitude")?,
                notes: text_field(form.notes),
            })?;
            Ok((StatusCode::CREATED, Json(location)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            let status = text_field(form.status)
                .map(|raw| {
                    LocationStatus::from_str(&raw)
                        .ok_or_else(|| ApiError::bad_request("Unknown location status"))
                })
                .transpose()?;
            let updated = state.db.update_location(
                id,
                UpdateLocationInput {
                    name: text_field(form.name),
                    address: text_field(form.address),
                    latitude: opt_f64_field(form.latitude, "latitude")?,
                    longitude: opt_f64_field(form.longitude, "longitude")?,
                    notes: text_field(form.notes),
                    status,
                },
            )?;
            if !updated {
                return Err(ApiError::not_found("Location not found"));
            }
            let location = state
                .db
                .get_location(id)?
                .ok_or_else(|| ApiError::not_found("Location not found"))?;
            Ok(Json(location).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            let location = state
                .db
                .get_location(id)?
                .ok_or_else(|| ApiError::not_found("Location not found"))?;
            ensure_deleted(state.db.delete_location(id)?, "location", &location.name)?;
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- games -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GamesQuery {
    pub division_id: Option<Uuid>,
}

pub async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<GamesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ScheduleFilter {
        division_id: query.division_id,
        ..Default::default()
    };
    Ok(Json(state.db.list_schedule(&filter)?))
}

#[derive(Debug, Deserialize)]
pub struct GameForm {
    pub action: String,
    pub id: Option<String>,
    pub division_id: Option<String>,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub location_id: Option<String>,
    pub game_date: Option<String>,
    pub game_time: Option<String>,
    pub status: Option<String>,
    pub csrf_token: String,
}

pub async fn games_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<GameForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let division_id = uuid_field(form.division_id, "division_id")?;
            let home_team_id = uuid_field(form.home_team_id, "home_team_id")?;
            let away_team_id = uuid_field(form.away_team_id, "away_team_id")?;
            if home_team_id == away_team_id {
                return Err(ApiError::bad_request("Home and away teams must differ"));
            }
            for (team_id, side) in [(home_team_id, "Home"), (away_team_id, "Away")] {
                match state.db.get_team(team_id)? {
                    Some(team) if team.division_id == division_id => {}
                    Some(_) => {
                        return Err(ApiError::bad_request(format!(
                            "{side} team is not in that division"
                        )))
                    }
                    None => return Err(ApiError::bad_request(format!("{side} team does not exist"))),
                }
            }
            let location_id = uuid_field(form.location_id, "location_id")?;
            if state.db.get_location(location_id)?.is_none() {
                return Err(ApiError::bad_request("Location does not exist"));
            }
            let game = state.db.create_game(CreateGameInput {
                division_id,
                home_team_id,
                away_team_id,
                location_id,
                game_date: date_field(form.game_date, "game_date")?,
                game_time: time_field(form.game_time)?,
            })?;
            Ok((StatusCode::CREATED, Json(game)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            if state.db.get_game(id)?.is_none() {
                return Err(ApiError::not_found("Game not found"));
            }
            if let Some(raw) = text_field(form.status) {
                let status = GameStatus::from_str(&raw)
                    .ok_or_else(|| ApiError::bad_request("Unknown game status"))?;
                state.db.set_game_status(id, status)?;
            }
            let location_id = opt_uuid_field(form.location_id, "location_id")?;
            let game_date = opt_date_field(form.game_date, "game_date")?;
            let game_time = opt_time_field(form.game_time)?;
            if location_id.is_some() || game_date.is_some() || game_time.is_some() {
                state.db.reschedule_game(id, location_id, game_date, game_time)?;
            }
            let game = state
                .db
                .get_game(id)?
                .ok_or_else(|| ApiError::not_found("Game not found"))?;
            Ok(Json(game).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            ensure_deleted(state.db.delete_game(id)?, "game", "game")?;
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- email templates ---------------------------------------------------

pub async fn list_templates(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_templates()?))
}

#[derive(Debug, Deserialize)]
pub struct TemplateForm {
    pub action: String,
    pub id: Option<String>,
    pub template_name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub csrf_token: String,
}

pub async fn templates_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<TemplateForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let name = require_field(form.template_name, "template_name")?;
            if state.db.get_template_by_name(&name)?.is_some() {
                return Err(ApiError::conflict("A template with that name already exists"));
            }
            let template = state.db.create_template(CreateTemplateInput {
                template_name: name,
                subject: require_field(form.subject, "subject")?,
                body: require_field(form.body, "body")?,
            })?;
            Ok((StatusCode::CREATED, Json(template)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            let updated = state.db.update_template(
                id,
                UpdateTemplateInput {
                    subject: text_field(form.subject),
                    body: text_field(form.body),
                },
            )?;
            if !updated {
                return Err(ApiError::not_found("Template not found"));
            }
            Ok(Json(json!({ "updated": true })).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            ensure_deleted(state.db.delete_template(id)?, "template", "template")?;
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- email recipients --------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecipientsQuery {
    pub template_id: Option<Uuid>,
}

pub async fn list_recipients(
    State(state): State<AppState>,
    Query(query): Query<RecipientsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.db.list_recipients(query.template_id)?))
}

#[derive(Debug, Deserialize)]
pub struct RecipientForm {
    pub action: String,
    pub id: Option<String>,
    pub template_id: Option<String>,
    pub recipient_type: Option<String>,
    pub recipient_source: Option<String>,
    pub email_address: Option<String>,
    pub is_active: Option<String>,
    pub csrf_token: String,
}

pub async fn recipients_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<RecipientForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "add" => {
            let recipient_type = require_field(form.recipient_type, "recipient_type")?;
            let recipient_type = RecipientType::from_str(&recipient_type)
                .ok_or_else(|| ApiError::bad_request("Unknown recipient type"))?;
            let recipient_source = require_field(form.recipient_source, "recipient_source")?;
            let recipient_source = RecipientSource::from_str(&recipient_source)
                .ok_or_else(|| ApiError::bad_request("Unknown recipient source"))?;

            let input = CreateRecipientInput {
                template_id: uuid_field(form.template_id, "template_id")?,
                recipient_type,
                recipient_source,
                email_address: text_field(form.email_address),
            };
            input.validate().map_err(ApiError::bad_request)?;

            let recipient = state.db.create_recipient(input)?;
            Ok((StatusCode::CREATED, Json(recipient)).into_response())
        }
        "update" => {
            let id = uuid_field(form.id, "id")?;
            let recipient_type = text_field(form.recipient_type)
                .map(|raw| {
                    RecipientType::from_str(&raw)
                        .ok_or_else(|| ApiError::bad_request("Unknown recipient type"))
                })
                .transpose()?;
            let recipient_source = text_field(form.recipient_source)
                .map(|raw| {
                    RecipientSource::from_str(&raw)
                        .ok_or_else(|| ApiError::bad_request("Unknown recipient source"))
                })
                .transpose()?;
            let updated = state.db.update_recipient(
                id,
                UpdateRecipientInput {
                    recipient_type,
                    recipient_source,
                    email_address: text_field(form.email_address),
                    is_active: opt_bool_field(form.is_active, "is_active")?,
                },
            )?;
            if !updated {
                return Err(ApiError::not_found("Recipient not found"));
            }
            Ok(Json(json!({ "updated": true })).into_response())
        }
        "delete" => {
            let id = uuid_field(form.id, "id")?;
            if !state.db.delete_recipient(id)? {
                return Err(ApiError::not_found("Recipient not found"));
            }
            Ok(Json(json!({ "deleted": true })).into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

// ---- schedule change requests ------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AdminRequestsQuery {
    pub status: Option<String>,
}

pub async fn list_change_requests(
    State(state): State<AppState>,
    Query(query): Query<AdminRequestsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            ChangeRequestStatus::from_str(raw)
                .ok_or_else(|| ApiError::bad_request("Unknown request status"))?,
        ),
    };
    Ok(Json(state.db.list_change_requests(status, None)?))
}

#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    pub action: String,
    pub id: Option<String>,
    pub csrf_token: String,
}

pub async fn change_requests_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<DecisionForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    let approve = match form.action.as_str() {
        "approve" => true,
        "deny" => false,
        other => return Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    };

    let id = uuid_field(form.id, "id")?;
    let request = state
        .db
        .decide_change_request(id, approve)?
        .ok_or_else(|| ApiError::conflict("Request not found or already decided"))?;

    let template = if approve {
        "schedule_change_approved"
    } else {
        "schedule_change_denied"
    };
    tracing::info!(request_id = %request.id, game_id = %request.game_id, decision = template, "change request decided");
    fire_game_notification(&state, template, request.game_id);
    Ok(Json(request).into_response())
}

// ---- settings ----------------------------------------------------------

pub async fn list_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let mut map = serde_json::Map::new();
    for (key, value) in state.db.all_settings()? {
        // Password hashes stay out of the response.
        if !key.ends_with("_hash") {
            map.insert(key, serde_json::Value::String(value));
        }
    }
    Ok(Json(serde_json::Value::Object(map)))
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub action: String,
    pub league_name: Option<String>,
    pub contact_email: Option<String>,
    pub timezone: Option<String>,
    pub password: Option<String>,
    pub confirm: Option<String>,
    pub csrf_token: String,
}

fn change_password(
    state: &AppState,
    role: PortalRole,
    password: Option<String>,
    confirm: Option<String>,
) -> Result<(), ApiError> {
    let password = password.unwrap_or_default();
    let confirm = confirm.unwrap_or_default();
    if password != confirm {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    if password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }
    let hash = auth::hash_password(&password)
        .map_err(|e| ApiError::from(anyhow::Error::new(e).context("password hashing")))?;
    state.db.put_setting(auth::password_setting_key(role), &hash)?;
    Ok(())
}

pub async fn settings_action(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Form(form): Form<SettingsForm>,
) -> Result<Response, ApiError> {
    check_csrf(&session, &form.csrf_token)?;
    match form.action.as_str() {
        "update_league" => {
            let league_name = text_field(form.league_name);
            let contact_email = text_field(form.contact_email);
            if league_name.is_none() && contact_email.is_none() {
                return Err(ApiError::bad_request("Nothing to update"));
            }
            if let Some(name) = league_name {
                state.db.put_setting("league_name", &name)?;
            }
            if let Some(email) = contact_email {
                if !email.contains('@') {
                    return Err(ApiError::bad_request("contact_email is not an e-mail address"));
                }
                state.db.put_setting("contact_email", &email)?;
            }
        }
        "update_timezone" => {
            let timezone = require_field(form.timezone, "timezone")?;
            if !SUPPORTED_TIMEZONES.contains(&timezone.as_str()) {
                return Err(ApiError::bad_request(format!(
                    "Unsupported timezone \"{timezone}\""
                )));
            }
            state.db.put_setting("timezone", &timezone)?;
        }
        "change_coach_password" => {
            change_password(&state, PortalRole::Coach, form.password, form.confirm)?;
            tracing::info!("coach portal password changed");
        }
        "change_admin_password" => {
            change_password(&state, PortalRole::Admin, form.password, form.confirm)?;
            tracing::info!("admin portal password changed");
        }
        other => return Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
    Ok(Json(json!({ "updated": true })).into_response())
}
