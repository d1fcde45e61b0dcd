use anyhow::{Context, Result};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{date_col, now, ts_col, uuid_col, Database, DeleteOutcome, Dependent};
use crate::models::{CreateSeasonInput, Season, SeasonStatus, UpdateSeasonInput};

fn row_to_season(row: &Row<'_>) -> rusqlite::Result<Season> {
    let status: String = row.get(5)?;
    Ok(Season {
        id: uuid_col(row, 0)?,
        program_id: uuid_col(row, 1)?,
        name: row.get(2)?,
        start_date: date_col(row, 3)?,
        end_date: date_col(row, 4)?,
        status: SeasonStatus::from_str(&status).unwrap_or(SeasonStatus::Upcoming),
        created_at: ts_col(row, 6)?,
        updated_at: ts_col(row, 7)?,
    })
}

const SEASON_COLS: &str = "id, program_id, name, start_date, end_date, status, created_at, updated_at";

impl Database {
    pub fn create_season(&self, input: CreateSeasonInput) -> Result<Season> {
        let season = Season {
            id: Uuid::new_v4(),
            program_id: input.program_id,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            status: SeasonStatus::Upcoming,
            created_at: now(),
            updated_at: now(),
        };
        self.conn()
            .execute(
                "INSERT INTO seasons (id, program_id, name, start_date, end_date, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    season.id.to_string(),
                    season.program_id.to_string(),
                    season.name,
                    season.start_date.to_string(),
                    season.end_date.to_string(),
                    season.status.as_str(),
                    season.created_at.to_rfc3339(),
                    season.updated_at.to_rfc3339(),
                ],
            )
            .context("failed to create season (does the program exist?)")?;
        Ok(season)
    }

    pub fn get_season(&self, id: Uuid) -> Result<Option<Season>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {SEASON_COLS} FROM seasons WHERE id = ?1"))?;
        let mut rows = stmt.query_map([id.to_string()], row_to_season)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_seasons(&self, program_id: Option<Uuid>) -> Result<Vec<Season>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SEASON_COLS} FROM seasons
             WHERE (?1 IS NULL OR program_id = ?1)
             ORDER BY start_date DESC"
        ))?;
        let rows = stmt.query_map([program_id.map(|id| id.to_string())], row_to_season)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_season(&self, id: Uuid, input: UpdateSeasonInput) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE seasons SET
                name = COALESCE(?2, name),
                start_date = COALESCE(?3, start_date),
                end_date = COALESCE(?4, end_date),
                status = COALESCE(?5, status),
                updated_at = ?6
             WHERE id = ?1",
            params![
                id.to_string(),
                input.name,
                input.start_date.map(|d| d.to_string()),
                input.end_date.map(|d| d.to_string()),
                input.status.map(|s| s.as_str()),
                now().to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_season(&self, id: Uuid) -> Result<DeleteOutcome> {
        let conn = self.conn();
        let key = id.to_string();

        let exists: i64 =
            conn.query_row("SELECT COUNT(*) FROM seasons WHERE id = ?1", [&key], |r| {
                r.get(0)
            })?;
        if exists == 0 {
            return Ok(DeleteOutcome::NotFound);
        }

        let divisions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM divisions WHERE season_id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        if divisions > 0 {
            return Ok(DeleteOutcome::Blocked(vec![Dependent {
                kind: "division",
                count: divisions,
            }]));
        }

        conn.execute("DELETE FROM seasons WHERE id = ?1", [&key])?;
        Ok(DeleteOutcome::Deleted)
    }
}
