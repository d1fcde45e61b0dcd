//! Notification recipient resolution and message assembly.
//!
//! Templates are addressed by name. Recipient rows either carry a
//! static address or a rule deriving one from the game's team managers.
//! Delivery itself is an external concern behind [`Notifier`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::models::{EmailRecipient, GameManagers, RecipientSource, RecipientType};

/// Which header a resolved address lands in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    pub kind: RecipientKind,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub template: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivery seam. The server wires this to the log; a real mail
/// transport would implement it the same way.
pub trait Notifier: Send + Sync {
    fn deliver(&self, message: &OutboundMessage);
}

fn kind_of(recipient_type: RecipientType) -> RecipientKind {
    match recipient_type {
        RecipientType::TeamBased | RecipientType::StaticTo => RecipientKind::To,
        RecipientType::StaticCc => RecipientKind::Cc,
        RecipientType::StaticBcc => RecipientKind::Bcc,
    }
}

/// Turn recipient rows into concrete `(kind, address)` pairs.
///
/// Rows whose rule cannot produce an address (no static address stored,
/// or the team has no manager e-mail on file) are skipped silently.
pub fn resolve(rows: &[EmailRecipient], managers: &GameManagers) -> Vec<ResolvedRecipient> {
    fn usable(address: Option<&str>) -> Option<&str> {
        address.map(str::trim).filter(|a| !a.is_empty())
    }

    let mut resolved = Vec::new();
    for row in rows {
        let kind = kind_of(row.recipient_type);
        let addresses: Vec<&str> = match row.recipient_source {
            RecipientSource::StaticEmail => {
                usable(row.email_address.as_deref()).into_iter().collect()
            }
            RecipientSource::HomeTeamManager => {
                usable(managers.home.as_deref()).into_iter().collect()
            }
            RecipientSource::AwayTeamManager => {
                usable(managers.away.as_deref()).into_iter().collect()
            }
            RecipientSource::BothTeamManagers => usable(managers.home.as_deref())
                .into_iter()
                .chain(usable(managers.away.as_deref()))
                .collect(),
        };
        for address in addresses {
            resolved.push(ResolvedRecipient {
                kind,
                address: address.to_string(),
            });
        }
    }
    resolved
}

fn substitute(text: &str, pairs: &[(&str, String)]) -> String {
    let mut out = text.to_string();
    for (key, value) in pairs {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

/// Assemble the notification for a game event, or `None` when there is
/// no such template or nobody to send it to.
pub fn build_game_message(
    db: &Database,
    template_name: &str,
    game_id: Uuid,
) -> Result<Option<OutboundMessage>> {
    let Some(template) = db.get_template_by_name(template_name)? else {
        return Ok(None);
    };

    let rows = db.active_recipients_for_template(template_name)?;
    let managers = db.game_managers(game_id)?.unwrap_or_default();
    let resolved = resolve(&rows, &managers);
    if resolved.is_empty() {
        return Ok(None);
    }

    let game = db
        .get_game(game_id)?
        .context("game vanished while assembling notification")?;
    let home = db.get_team(game.home_team_id)?;
    let away = db.get_team(game.away_team_id)?;
    let slot = db.get_schedule_slot(game_id)?;
    let location = match &slot {
        Some(slot) => db.get_location(slot.location_id)?,
        None => None,
    };

    let score = |value: Option<i64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    let pairs = [
        ("league_name", db.setting_or("league_name", "D8TL")?),
        ("home_team", home.map_or_else(String::new, |t| t.name)),
        ("away_team", away.map_or_else(String::new, |t| t.name)),
        ("home_score", score(game.home_score)),
        ("away_score", score(game.away_score)),
        (
            "game_date",
            slot.as_ref()
                .map_or_else(String::new, |s| s.game_date.to_string()),
        ),
        (
            "game_time",
            slot.as_ref().map_or_else(String::new, |s| s.game_time.clone()),
        ),
        ("location", location.map_or_else(String::new, |l| l.name)),
    ];

    let mut message = OutboundMessage {
        template: template.template_name,
        to: Vec::new(),
        cc: Vec::new(),
        bcc: Vec::new(),
        subject: substitute(&template.subject, &pairs),
        body: substitute(&template.body, &pairs),
    };
    for recipient in resolved {
        match recipient.kind {
            RecipientKind::To => message.to.push(recipient.address),
            RecipientKind::Cc => message.cc.push(recipient.address),
            RecipientKind::Bcc => message.bcc.push(recipient.address),
        }
    }
    Ok(Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;
    use crate::models::{CreateRecipientInput, UpdateTeamInput};
    use chrono::Utc;

    fn recipient(
        recipient_type: RecipientType,
        source: RecipientSource,
        address: Option<&str>,
    ) -> EmailRecipient {
        EmailRecipient {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            recipient_type,
            recipient_source: source,
            email_address: address.map(String::from),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn static_plus_home_manager_yields_two_addresses() {
        let rows = vec![
            recipient(
                RecipientType::StaticTo,
                RecipientSource::StaticEmail,
                Some("commissioner@d8tl.org"),
            ),
            recipient(RecipientType::TeamBased, RecipientSource::HomeTeamManager, None),
        ];
        let managers = GameManagers {
            home: Some("rockets@d8tl.org".into()),
            away: None,
        };

        let resolved = resolve(&rows, &managers);
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|r| r.kind == RecipientKind::To));
    }

    #[test]
    fn missing_manager_email_is_skipped_silently() {
        let rows = vec![
            recipient(
                RecipientType::StaticTo,
                RecipientSource::StaticEmail,
                Some("commissioner@d8tl.org"),
            ),
            recipient(RecipientType::TeamBased, RecipientSource::HomeTeamManager, None),
        ];
        let managers = GameManagers::default();

        let resolved = resolve(&rows, &managers);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].address, "commissioner@d8tl.org");
    }

    #[test]
    fn both_team_managers_emit_two_pairs() {
        let rows = vec![recipient(
            RecipientType::TeamBased,
            RecipientSource::BothTeamManagers,
            None,
        )];
        let managers = GameManagers {
            home: Some("rockets@d8tl.org".into()),
            away: Some("comets@d8tl.org".into()),
        };
        assert_eq!(resolve(&rows, &managers).len(), 2);
    }

    #[test]
    fn cc_and_bcc_keep_their_groups() {
        let rows = vec![
            recipient(
                RecipientType::StaticCc,
                RecipientSource::StaticEmail,
                Some("scorekeeper@d8tl.org"),
            ),
            recipient(
                RecipientType::StaticBcc,
                RecipientSource::StaticEmail,
                Some("archive@d8tl.org"),
            ),
        ];
        let resolved = resolve(&rows, &GameManagers::default());
        assert_eq!(resolved[0].kind, RecipientKind::Cc);
        assert_eq!(resolved[1].kind, RecipientKind::Bcc);
    }

    #[test]
    fn build_message_substitutes_game_details() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);
        db.record_score(fixture.game.id, 5, 3).unwrap();

        let template = db.get_template_by_name("score_posted").unwrap().unwrap();
        db.create_recipient(CreateRecipientInput {
            template_id: template.id,
            recipient_type: RecipientType::TeamBased,
            recipient_source: RecipientSource::BothTeamManagers,
            email_address: None,
        })
        .unwrap();

        let message = build_game_message(&db, "score_posted", fixture.game.id)
            .unwrap()
            .unwrap();
        assert_eq!(message.to.len(), 2);
        assert!(message.subject.contains("Rockets"));
        assert!(message.body.contains("5-3"));
        assert!(message.body.contains("2025-05-10"));
    }

    #[test]
    fn build_message_without_recipients_is_none() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);
        assert!(build_game_message(&db, "score_posted", fixture.game.id)
            .unwrap()
            .is_none());
        assert!(build_game_message(&db, "no_such_template", fixture.game.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn away_only_rule_follows_team_record_changes() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);
        let template = db.get_template_by_name("score_posted").unwrap().unwrap();
        db.create_recipient(CreateRecipientInput {
            template_id: template.id,
            recipient_type: RecipientType::TeamBased,
            recipient_source: RecipientSource::AwayTeamManager,
            email_address: None,
        })
        .unwrap();

        // Blank out the away manager's e-mail: nothing left to send.
        db.update_team(
            fixture.away.id,
            UpdateTeamInput {
                name: None,
                manager_name: None,
                manager_email: Some(String::new()),
                manager_phone: None,
            },
        )
        .unwrap();

        assert!(build_game_message(&db, "score_posted", fixture.game.id)
            .unwrap()
            .is_none());
    }
}
