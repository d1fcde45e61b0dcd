use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::game::GameStatus;

/// One scheduling slot per game: where and when it is played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: Uuid,
    pub game_id: Uuid,
    pub location_id: Uuid,
    pub game_date: NaiveDate,
    pub game_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Joined row for the public schedule listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub game_id: Uuid,
    pub division_id: Uuid,
    pub division_name: String,
    pub home_team: String,
    pub away_team: String,
    pub status: GameStatus,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub location: String,
    pub game_date: NaiveDate,
    pub game_time: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub division_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub game_id: Uuid,
    pub requested_date: Option<NaiveDate>,
    pub requested_time: Option<String>,
    pub requested_location_id: Option<Uuid>,
    pub reason: String,
    pub status: ChangeRequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Denied,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChangeRequestInput {
    pub game_id: Uuid,
    pub requested_date: Option<NaiveDate>,
    pub requested_time: Option<String>,
    pub requested_location_id: Option<Uuid>,
    pub reason: String,
}

impl CreateChangeRequestInput {
    /// A request has to ask for at least one change.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.requested_date.is_none()
            && self.requested_time.is_none()
            && self.requested_location_id.is_none()
        {
            return Err("A schedule change request must propose a new date, time or location");
        }
        if self.reason.trim().is_empty() {
            return Err("A reason is required");
        }
        Ok(())
    }
}
