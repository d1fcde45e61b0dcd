use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logged-in coach or admin portal session. The CSRF token is issued
/// alongside the session and must accompany every state-changing form
/// submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSession {
    pub id: Uuid,
    pub role: PortalRole,
    pub csrf_token: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PortalRole {
    Coach,
    Admin,
}

impl PortalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coach => "coach",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "coach" => Some(Self::Coach),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}
