use anyhow::{Context, Result};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now, opt_date_col, opt_ts_col, opt_uuid_col, ts_col, uuid_col, Database};
use crate::models::{ChangeRequest, ChangeRequestStatus, CreateChangeRequestInput};

fn row_to_request(row: &Row<'_>) -> rusqlite::Result<ChangeRequest> {
    let status: String = row.get(6)?;
    Ok(ChangeRequest {
        id: uuid_col(row, 0)?,
        game_id: uuid_col(row, 1)?,
        requested_date: opt_date_col(row, 2)?,
        requested_time: row.get(3)?,
        requested_location_id: opt_uuid_col(row, 4)?,
        reason: row.get(5)?,
        status: ChangeRequestStatus::from_str(&status).unwrap_or(ChangeRequestStatus::Pending),
        created_at: ts_col(row, 7)?,
        decided_at: opt_ts_col(row, 8)?,
    })
}

const REQUEST_COLS: &str = "id, game_id, requested_date, requested_time, requested_location_id, reason, status, created_at, decided_at";

impl Database {
    /// Files a pending request. At most one pending request per game is
    /// allowed; a second submission fails on the unique index.
    pub fn create_change_request(&self, input: CreateChangeRequestInput) -> Result<ChangeRequest> {
        let request = ChangeRequest {
            id: Uuid::new_v4(),
            game_id: input.game_id,
            requested_date: input.requested_date,
            requested_time: input.requested_time,
            requested_location_id: input.requested_location_id,
            reason: input.reason,
            status: ChangeRequestStatus::Pending,
            created_at: now(),
            decided_at: None,
        };
        self.conn()
            .execute(
                "INSERT INTO schedule_change_requests
                 (id, game_id, requested_date, requested_time, requested_location_id, reason, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    request.id.to_string(),
                    request.game_id.to_string(),
                    request.requested_date.map(|d| d.to_string()),
                    request.requested_time,
                    request.requested_location_id.map(|id| id.to_string()),
                    request.reason,
                    request.status.as_str(),
                    request.created_at.to_rfc3339(),
                ],
            )
            .context("failed to file change request (is one already pending for this game?)")?;
        Ok(request)
    }

    pub fn get_change_request(&self, id: Uuid) -> Result<Option<ChangeRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REQUEST_COLS} FROM schedule_change_requests WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map([id.to_string()], row_to_request)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_change_requests(
        &self,
        status: Option<ChangeRequestStatus>,
        game_id: Option<Uuid>,
    ) -> Result<Vec<ChangeRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REQUEST_COLS} FROM schedule_change_requests
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR game_id = ?2)
             ORDER BY created_at"
        ))?;
        let rows = stmt.query_map(
            params![
                status.map(|s| s.as_str()),
                game_id.map(|id| id.to_string()),
            ],
            row_to_request,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Decide a pending request. Approval applies the requested fields
    /// to the game's schedule slot in the same transaction. Returns the
    /// decided request, or `None` if it does not exist or was already
    /// decided.
    pub fn decide_change_request(
        &self,
        id: Uuid,
        approve: bool,
    ) -> Result<Option<ChangeRequest>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let key = id.to_string();

        let mut request = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {REQUEST_COLS} FROM schedule_change_requests WHERE id = ?1 AND status = 'pending'"
            ))?;
            let mut rows = stmt.query_map([&key], row_to_request)?;
            match rows.next().transpose()? {
                Some(request) => request,
                None => return Ok(None),
            }
        };

        let decided_at = now();
        let status = if approve {
            ChangeRequestStatus::Approved
        } else {
            ChangeRequestStatus::Denied
        };
        tx.execute(
            "UPDATE schedule_change_requests SET status = ?2, decided_at = ?3 WHERE id = ?1",
            params![key, status.as_str(), decided_at.to_rfc3339()],
        )?;

        if approve {
            tx.execute(
                "UPDATE schedules SET
                    location_id = COALESCE(?2, location_id),
                    game_date = COALESCE(?3, game_date),
                    game_time = COALESCE(?4, game_time),
                    updated_at = ?5
                 WHERE game_id = ?1",
                params![
                    request.game_id.to_string(),
                    request.requested_location_id.map(|id| id.to_string()),
                    request.requested_date.map(|d| d.to_string()),
                    request.requested_time.clone(),
                    decided_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        request.status = status;
        request.decided_at = Some(decided_at);
        Ok(Some(request))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::*;
    use chrono::NaiveDate;

    fn request_input(game_id: Uuid, date: Option<NaiveDate>) -> CreateChangeRequestInput {
        CreateChangeRequestInput {
            game_id,
            requested_date: date,
            requested_time: None,
            requested_location_id: None,
            reason: "Field conflict".into(),
        }
    }

    #[test]
    fn approving_applies_requested_fields_to_schedule() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);
        let new_date = NaiveDate::from_ymd_opt(2025, 5, 24).unwrap();

        let request = db
            .create_change_request(request_input(fixture.game.id, Some(new_date)))
            .unwrap();
        let decided = db
            .decide_change_request(request.id, true)
            .unwrap()
            .unwrap();

        assert_eq!(decided.status, ChangeRequestStatus::Approved);
        assert!(decided.decided_at.is_some());

        let slot = db.get_schedule_slot(fixture.game.id).unwrap().unwrap();
        assert_eq!(slot.game_date, new_date);
        // Unrequested fields stay put.
        assert_eq!(slot.location_id, fixture.location.id);
        assert_eq!(slot.game_time, "17:30");
    }

    #[test]
    fn denial_leaves_schedule_untouched() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);
        let new_date = NaiveDate::from_ymd_opt(2025, 5, 24).unwrap();

        let request = db
            .create_change_request(request_input(fixture.game.id, Some(new_date)))
            .unwrap();
        let decided = db
            .decide_change_request(request.id, false)
            .unwrap()
            .unwrap();

        assert_eq!(decided.status, ChangeRequestStatus::Denied);
        let slot = db.get_schedule_slot(fixture.game.id).unwrap().unwrap();
        assert_eq!(slot.game_date, NaiveDate::from_ymd_opt(2025, 5, 10).unwrap());
        assert_ne!(slot.game_date, new_date);
    }

    #[test]
    fn second_pending_request_for_same_game_is_rejected() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);

        db.create_change_request(request_input(fixture.game.id, None))
            .unwrap();
        assert!(db
            .create_change_request(request_input(fixture.game.id, None))
            .is_err());
    }

    #[test]
    fn deciding_twice_returns_none() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);

        let request = db
            .create_change_request(request_input(fixture.game.id, None))
            .unwrap();
        assert!(db.decide_change_request(request.id, false).unwrap().is_some());
        assert!(db.decide_change_request(request.id, true).unwrap().is_none());
    }
}
