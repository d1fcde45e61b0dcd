use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub template_name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateInput {
    pub template_name: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTemplateInput {
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub id: Uuid,
    pub template_id: Uuid,
    pub recipient_type: RecipientType,
    pub recipient_source: RecipientSource,
    pub email_address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Where a resolved address lands in the assembled message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    TeamBased,
    StaticTo,
    StaticCc,
    StaticBcc,
}

impl RecipientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeamBased => "team_based",
            Self::StaticTo => "static_to",
            Self::StaticCc => "static_cc",
            Self::StaticBcc => "static_bcc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "team_based" => Some(Self::TeamBased),
            "static_to" => Some(Self::StaticTo),
            "static_cc" => Some(Self::StaticCc),
            "static_bcc" => Some(Self::StaticBcc),
            _ => None,
        }
    }
}

/// How the address is obtained: stored verbatim, or derived from the
/// managers of the game's teams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecipientSource {
    HomeTeamManager,
    AwayTeamManager,
    BothTeamManagers,
    StaticEmail,
}

impl RecipientSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HomeTeamManager => "home_team_manager",
            Self::AwayTeamManager => "away_team_manager",
            Self::BothTeamManagers => "both_team_managers",
            Self::StaticEmail => "static_email",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "home_team_manager" => Some(Self::HomeTeamManager),
            "away_team_manager" => Some(Self::AwayTeamManager),
            "both_team_managers" => Some(Self::BothTeamManagers),
            "static_email" => Some(Self::StaticEmail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecipientInput {
    pub template_id: Uuid,
    pub recipient_type: RecipientType,
    pub recipient_source: RecipientSource,
    pub email_address: Option<String>,
}

impl CreateRecipientInput {
    /// Enforced at submission time, not by the table.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.recipient_source == RecipientSource::StaticEmail
            && self
                .email_address
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err("A static e-mail recipient requires an e-mail address");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecipientInput {
    pub recipient_type: Option<RecipientType>,
    pub recipient_source: Option<RecipientSource>,
    pub email_address: Option<String>,
    pub is_active: Option<bool>,
}
