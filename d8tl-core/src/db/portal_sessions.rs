use anyhow::Result;
use chrono::Duration;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now, ts_col, uuid_col, Database};
use crate::models::{PortalRole, PortalSession};

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<PortalSession> {
    let role: String = row.get(1)?;
    Ok(PortalSession {
        id: uuid_col(row, 0)?,
        role: PortalRole::from_str(&role).unwrap_or(PortalRole::Coach),
        csrf_token: uuid_col(row, 2)?,
        created_at: ts_col(row, 3)?,
        expires_at: ts_col(row, 4)?,
    })
}

impl Database {
    pub fn create_portal_session(&self, role: PortalRole, ttl: Duration) -> Result<PortalSession> {
        let created_at = now();
        let session = PortalSession {
            id: Uuid::new_v4(),
            role,
            csrf_token: Uuid::new_v4(),
            created_at,
            expires_at: created_at + ttl,
        };
        self.conn().execute(
            "INSERT INTO portal_sessions (id, role, csrf_token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id.to_string(),
                session.role.as_str(),
                session.csrf_token.to_string(),
                session.created_at.to_rfc3339(),
                session.expires_at.to_rfc3339(),
            ],
        )?;
        Ok(session)
    }

    /// Expired sessions are treated as absent.
    pub fn get_portal_session(&self, id: Uuid) -> Result<Option<PortalSession>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, role, csrf_token, created_at, expires_at
             FROM portal_sessions WHERE id = ?1 AND expires_at > ?2",
        )?;
        let mut rows = stmt.query_map(
            params![id.to_string(), now().to_rfc3339()],
            row_to_session,
        )?;
        Ok(rows.next().transpose()?)
    }

    pub fn delete_portal_session(&self, id: Uuid) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM portal_sessions WHERE id = ?1", [id.to_string()])?;
        Ok(changed > 0)
    }

    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let purged = self.conn().execute(
            "DELETE FROM portal_sessions WHERE expires_at <= ?1",
            [now().to_rfc3339()],
        )?;
        Ok(purged)
    }
}
