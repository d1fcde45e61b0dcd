//! Log-viewer JSON API: one endpoint dispatching on `?action=`, the
//! shape the original admin tooling expects.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::logging::{LogControl, LEVELS};

use super::error::ApiError;
use super::AppState;

const DEFAULT_TAIL_LINES: usize = 200;
const MAX_TAIL_LINES: usize = 2000;
const DEFAULT_KEEP_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub action: String,
    pub lines: Option<usize>,
    pub keep_days: Option<i64>,
    pub level: Option<String>,
}

pub async fn logs_api(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    match query.action.as_str() {
        "get_log_content" => get_log_content(&state.log_ctl, query.lines),
        "get_log_stats" => get_log_stats(&state.log_ctl),
        "cleanup_logs" => cleanup_logs(&state.log_ctl, query.keep_days),
        "set_log_level" => set_log_level(&state, query.level),
        other => Err(ApiError::bad_request(format!("Unknown action \"{other}\""))),
    }
}

fn get_log_content(
    log_ctl: &LogControl,
    lines: Option<usize>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let wanted = lines.unwrap_or(DEFAULT_TAIL_LINES).min(MAX_TAIL_LINES);
    let Some(latest) = log_ctl.log_files()?.into_iter().next() else {
        return Ok(Json(json!({ "file": null, "lines": [] })));
    };

    let content = std::fs::read_to_string(&latest)
        .map_err(|e| ApiError::from(anyhow::Error::new(e).context("reading log file")))?;
    let all: Vec<&str> = content.lines().collect();
    let tail: Vec<&str> = all[all.len().saturating_sub(wanted)..].to_vec();

    Ok(Json(json!({
        "file": latest.file_name().and_then(|n| n.to_str()),
        "total_lines": all.len(),
        "lines": tail,
    })))
}

fn get_log_stats(log_ctl: &LogControl) -> Result<Json<serde_json::Value>, ApiError> {
    let files = log_ctl.log_files()?;
    let mut total_bytes = 0u64;
    let mut file_entries = Vec::new();
    for path in &files {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        total_bytes += size;
        file_entries.push(json!({
            "file": path.file_name().and_then(|n| n.to_str()),
            "size_bytes": size,
            "date": LogControl::file_date(path).map(|d| d.to_string()),
        }));
    }

    // Per-level counts over the newest file only; older files are
    // history, not operational signal.
    let mut levels = serde_json::Map::new();
    if let Some(latest) = files.first() {
        let content = std::fs::read_to_string(latest).unwrap_or_default();
        for level in LEVELS {
            let marker = level.to_uppercase();
            let count = content
                .lines()
                .filter(|line| line.contains(&marker))
                .count();
            levels.insert(level.to_string(), json!(count));
        }
    }

    Ok(Json(json!({
        "files": file_entries,
        "total_bytes": total_bytes,
        "levels": levels,
    })))
}

fn cleanup_logs(
    log_ctl: &LogControl,
    keep_days: Option<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let keep_days = keep_days.unwrap_or(DEFAULT_KEEP_DAYS).max(1);
    let cutoff = chrono::Utc::now().date_naive() - chrono::Duration::days(keep_days);

    let mut deleted = 0;
    for path in log_ctl.log_files()? {
        let Some(date) = LogControl::file_date(&path) else {
            continue;
        };
        if date < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(file = %path.display(), error = %e, "failed to delete log file"),
            }
        }
    }
    tracing::info!(deleted, keep_days, "log cleanup ran");
    Ok(Json(json!({ "deleted": deleted, "keep_days": keep_days })))
}

fn set_log_level(
    state: &AppState,
    level: Option<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let level = level
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: level"))?;
    if !LEVELS.contains(&level) {
        return Err(ApiError::bad_request(format!(
            "Unknown log level \"{level}\" (expected one of {})",
            LEVELS.join(", ")
        )));
    }

    state
        .log_ctl
        .set_level(level)
        .map_err(ApiError::from)?;
    // Persisted so the level survives a restart.
    state.db.put_setting("log_level", level)?;
    tracing::info!(level, "log level changed");
    Ok(Json(json!({ "level": level })))
}
