use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub division_id: Uuid,
    pub name: String,
    pub manager_name: String,
    pub manager_email: Option<String>,
    pub manager_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamInput {
    pub division_id: Uuid,
    pub name: String,
    pub manager_name: String,
    pub manager_email: Option<String>,
    pub manager_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTeamInput {
    pub name: Option<String>,
    pub manager_name: Option<String>,
    pub manager_email: Option<String>,
    pub manager_phone: Option<String>,
}
