use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Division {
    pub id: Uuid,
    pub season_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDivisionInput {
    pub season_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDivisionInput {
    pub name: Option<String>,
}

/// Listing row for the admin divisions table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionSummary {
    #[serde(flatten)]
    pub division: Division,
    pub team_count: i64,
}
