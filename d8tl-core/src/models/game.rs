use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub division_id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub status: GameStatus,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    Played,
    Postponed,
    Cancelled,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Played => "played",
            Self::Postponed => "postponed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "played" => Some(Self::Played),
            "postponed" => Some(Self::Postponed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Creating a game also creates its schedule slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameInput {
    pub division_id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub location_id: Uuid,
    pub game_date: NaiveDate,
    pub game_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGameInput {
    pub status: Option<GameStatus>,
    pub location_id: Option<Uuid>,
    pub game_date: Option<NaiveDate>,
    pub game_time: Option<String>,
}

/// Manager e-mail addresses for the two teams of a game, as far as they
/// are on file. Input to recipient resolution.
#[derive(Debug, Clone, Default)]
pub struct GameManagers {
    pub home: Option<String>,
    pub away: Option<String>,
}
