use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{now, ts_col, uuid_col, Database, DeleteOutcome};
use crate::models::{
    CreateRecipientInput, CreateTemplateInput, EmailRecipient, EmailTemplate, RecipientSource,
    RecipientType, UpdateRecipientInput, UpdateTemplateInput,
};

/// Notification templates a fresh install starts with. Admins edit the
/// wording in place; recipients are attached through the admin UI.
const DEFAULT_TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "score_posted",
        "Final score: {{home_team}} vs {{away_team}}",
        "The {{game_date}} game between {{home_team}} and {{away_team}} finished {{home_score}}-{{away_score}}.",
    ),
    (
        "schedule_change_approved",
        "Schedule change approved: {{home_team}} vs {{away_team}}",
        "The {{home_team}} vs {{away_team}} game has been moved to {{game_date}} {{game_time}} at {{location}}.",
    ),
    (
        "schedule_change_denied",
        "Schedule change denied: {{home_team}} vs {{away_team}}",
        "The requested change for the {{home_team}} vs {{away_team}} game on {{game_date}} was not approved.",
    ),
];

pub(super) fn seed_default_templates(conn: &Connection) -> Result<()> {
    for (name, subject, body) in DEFAULT_TEMPLATES {
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM email_templates WHERE template_name = ?1",
            [name],
            |r| r.get(0),
        )?;
        if exists == 0 {
            let ts = now().to_rfc3339();
            conn.execute(
                "INSERT INTO email_templates (id, template_name, subject, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![Uuid::new_v4().to_string(), name, subject, body, ts],
            )?;
        }
    }
    Ok(())
}

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<EmailTemplate> {
    Ok(EmailTemplate {
        id: uuid_col(row, 0)?,
        template_name: row.get(1)?,
        subject: row.get(2)?,
        body: row.get(3)?,
        created_at: ts_col(row, 4)?,
        updated_at: ts_col(row, 5)?,
    })
}

fn row_to_recipient(row: &Row<'_>) -> rusqlite::Result<EmailRecipient> {
    let rtype: String = row.get(2)?;
    let source: String = row.get(3)?;
    Ok(EmailRecipient {
        id: uuid_col(row, 0)?,
        template_id: uuid_col(row, 1)?,
        recipient_type: RecipientType::from_str(&rtype).unwrap_or(RecipientType::StaticTo),
        recipient_source: RecipientSource::from_str(&source)
            .unwrap_or(RecipientSource::StaticEmail),
        email_address: row.get(4)?,
        is_active: row.get(5)?,
        created_at: ts_col(row, 6)?,
    })
}

const TEMPLATE_COLS: &str = "id, template_name, subject, body, created_at, updated_at";
const RECIPIENT_COLS: &str =
    "id, template_id, recipient_type, recipient_source, email_address, is_active, created_at";

impl Database {
    pub fn create_template(&self, input: CreateTemplateInput) -> Result<EmailTemplate> {
        let template = EmailTemplate {
            id: Uuid::new_v4(),
            template_name: input.template_name,
            subject: input.subject,
            body: input.body,
            created_at: now(),
            updated_at: now(),
        };
        self.conn()
            .execute(
                "INSERT INTO email_templates (id, template_name, subject, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    template.id.to_string(),
                    template.template_name,
                    template.subject,
                    template.body,
                    template.created_at.to_rfc3339(),
                    template.updated_at.to_rfc3339(),
                ],
            )
            .context("failed to create template (is the name taken?)")?;
        Ok(template)
    }

    pub fn get_template_by_name(&self, name: &str) -> Result<Option<EmailTemplate>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEMPLATE_COLS} FROM email_templates WHERE template_name = ?1"
        ))?;
        let mut rows = stmt.query_map([name], row_to_template)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_templates(&self) -> Result<Vec<EmailTemplate>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEMPLATE_COLS} FROM email_templates ORDER BY template_name"
        ))?;
        let rows = stmt.query_map([], row_to_template)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_template(&self, id: Uuid, input: UpdateTemplateInput) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE email_templates SET
                subject = COALESCE(?2, subject),
                body = COALESCE(?3, body),
                updated_at = ?4
             WHERE id = ?1",
            params![id.to_string(), input.subject, input.body, now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// A template owns its recipient rows; they are deleted with it.
    pub fn delete_template(&self, id: Uuid) -> Result<DeleteOutcome> {
        let changed = self
            .conn()
            .execute("DELETE FROM email_templates WHERE id = ?1", [id.to_string()])?;
        Ok(if changed > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    pub fn create_recipient(&self, input: CreateRecipientInput) -> Result<EmailRecipient> {
        let recipient = EmailRecipient {
            id: Uuid::new_v4(),
            template_id: input.template_id,
            recipient_type: input.recipient_type,
            recipient_source: input.recipient_source,
            email_address: input.email_address,
            is_active: true,
            created_at: now(),
        };
        self.conn()
            .execute(
                "INSERT INTO email_recipients (id, template_id, recipient_type, recipient_source, email_address, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    recipient.id.to_string(),
                    recipient.template_id.to_string(),
                    recipient.recipient_type.as_str(),
                    recipient.recipient_source.as_str(),
                    recipient.email_address,
                    recipient.is_active,
                    recipient.created_at.to_rfc3339(),
                ],
            )
            .context("failed to create recipient (does the template exist?)")?;
        Ok(recipient)
    }

    pub fn list_recipients(&self, template_id: Option<Uuid>) -> Result<Vec<EmailRecipient>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECIPIENT_COLS} FROM email_recipients
             WHERE (?1 IS NULL OR template_id = ?1)
             ORDER BY created_at"
        ))?;
        let rows = stmt.query_map([template_id.map(|id| id.to_string())], row_to_recipient)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Active recipient rows for a template, addressed by name. This is
    /// the resolver's input.
    pub fn active_recipients_for_template(&self, name: &str) -> Result<Vec<EmailRecipient>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.template_id, r.recipient_type, r.recipient_source,
                    r.email_address, r.is_active, r.created_at
             FROM email_recipients r
             JOIN email_templates t ON r.template_id = t.id
             WHERE t.template_name = ?1 AND r.is_active = 1
             ORDER BY r.created_at",
        )?;
        let rows = stmt.query_map([name], row_to_recipient)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_recipient(&self, id: Uuid, input: UpdateRecipientInput) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE email_recipients SET
                recipient_type = COALESCE(?2, recipient_type),
                recipient_source = COALESCE(?3, recipient_source),
                email_address = COALESCE(?4, email_address),
                is_active = COALESCE(?5, is_active)
             WHERE id = ?1",
            params![
                id.to_string(),
                input.recipient_type.map(|t| t.as_str()),
                input.recipient_source.map(|s| s.as_str()),
                input.email_address,
                input.is_active,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_recipient(&self, id: Uuid) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM email_recipients WHERE id = ?1", [id.to_string()])?;
        Ok(changed > 0)
    }
}
