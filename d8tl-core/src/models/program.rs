use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub sport: String,
    pub min_age: u8,
    pub max_age: u8,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProgramInput {
    pub name: String,
    pub code: String,
    pub sport: String,
    pub min_age: u8,
    pub max_age: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProgramInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub sport: Option<String>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
    pub is_active: Option<bool>,
}

/// Listing row for the admin programs table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSummary {
    #[serde(flatten)]
    pub program: Program,
    pub season_count: i64,
}
