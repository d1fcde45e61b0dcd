//! Portal authentication: Argon2id password hashing, session cookies
//! and per-session CSRF tokens.
//!
//! There are no user accounts. The coach portal and the admin back
//! office each have one shared password whose hash lives in the
//! settings table (`coach_password_hash` / `admin_password_hash`).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Duration;
use thiserror::Error;
use uuid::Uuid;

use d8tl_core::models::{PortalRole, PortalSession};

use crate::api::error::ApiError;
use crate::api::AppState;

pub const SESSION_COOKIE: &str = "session_token";

pub fn session_ttl() -> Duration {
    Duration::hours(12)
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),
}

/// Argon2id with the crate defaults, PHC string output.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashingFailed(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AuthError::InvalidHashFormat(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::VerificationFailed(e.to_string())),
    }
}

/// Key in the settings table holding the password hash for a role.
pub fn password_setting_key(role: PortalRole) -> &'static str {
    match role {
        PortalRole::Coach => "coach_password_hash",
        PortalRole::Admin => "admin_password_hash",
    }
}

/// Check a login attempt against the stored hash. A role without a
/// stored hash cannot log in at all.
pub fn verify_portal_password(
    state: &AppState,
    role: PortalRole,
    password: &str,
) -> Result<bool, ApiError> {
    let Some(hash) = state.db.setting(password_setting_key(role))? else {
        return Ok(false);
    };
    verify_password(password, &hash)
        .map_err(|e| ApiError::from(anyhow::Error::new(e).context("password verification")))
}

fn session_from_request(state: &AppState, request: &Request) -> Result<PortalSession, ApiError> {
    let prefix = format!("{SESSION_COOKIE}=");
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix(prefix.as_str()))
        })
        .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;

    let id = Uuid::parse_str(token).map_err(|_| ApiError::unauthorized("Invalid session"))?;
    state
        .db
        .get_portal_session(id)?
        .ok_or_else(|| ApiError::unauthorized("Session expired, log in again"))
}

/// Coach portal gate: any logged-in role may pass.
pub async fn require_coach(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = session_from_request(&state, &request)?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Back office gate: admins only.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = session_from_request(&state, &request)?;
    if session.role != PortalRole::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Every state-changing form must echo the session's CSRF token.
pub fn check_csrf(session: &PortalSession, token: &str) -> Result<(), ApiError> {
    let supplied =
        Uuid::parse_str(token.trim()).map_err(|_| ApiError::forbidden("Invalid CSRF token"))?;
    if supplied != session.csrf_token {
        return Err(ApiError::forbidden("Invalid CSRF token"));
    }
    Ok(())
}
