use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{date_col, now, ts_col, uuid_col, Database};
use crate::models::{GameStatus, ScheduleFilter, ScheduleSlot, ScheduledGame};

fn row_to_slot(row: &Row<'_>) -> rusqlite::Result<ScheduleSlot> {
    Ok(ScheduleSlot {
        id: uuid_col(row, 0)?,
        game_id: uuid_col(row, 1)?,
        location_id: uuid_col(row, 2)?,
        game_date: date_col(row, 3)?,
        game_time: row.get(4)?,
        created_at: ts_col(row, 5)?,
        updated_at: ts_col(row, 6)?,
    })
}

impl Database {
    pub fn get_schedule_slot(&self, game_id: Uuid) -> Result<Option<ScheduleSlot>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, game_id, location_id, game_date, game_time, created_at, updated_at
             FROM schedules WHERE game_id = ?1",
        )?;
        let mut rows = stmt.query_map([game_id.to_string()], row_to_slot)?;
        Ok(rows.next().transpose()?)
    }

    /// Move a game: any of location, date or time may change.
    pub fn reschedule_game(
        &self,
        game_id: Uuid,
        location_id: Option<Uuid>,
        game_date: Option<chrono::NaiveDate>,
        game_time: Option<String>,
    ) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE schedules SET
                location_id = COALESCE(?2, location_id),
                game_date = COALESCE(?3, game_date),
                game_time = COALESCE(?4, game_time),
                updated_at = ?5
             WHERE game_id = ?1",
            params![
                game_id.to_string(),
                location_id.map(|id| id.to_string()),
                game_date.map(|d| d.to_string()),
                game_time,
                now().to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// The public schedule: games joined with teams, division and
    /// location, filterable by division, team and date range.
    pub fn list_schedule(&self, filter: &ScheduleFilter) -> Result<Vec<ScheduledGame>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT g.id, g.division_id, d.name, home.name, away.name, g.status,
                    g.home_score, g.away_score, l.name, s.game_date, s.game_time
             FROM schedules s
             JOIN games g ON s.game_id = g.id
             JOIN divisions d ON g.division_id = d.id
             JOIN teams home ON g.home_team_id = home.id
             JOIN teams away ON g.away_team_id = away.id
             JOIN locations l ON s.location_id = l.id
             WHERE (?1 IS NULL OR g.division_id = ?1)
               AND (?2 IS NULL OR g.home_team_id = ?2 OR g.away_team_id = ?2)
               AND (?3 IS NULL OR s.game_date >= ?3)
               AND (?4 IS NULL OR s.game_date <= ?4)
             ORDER BY s.game_date, s.game_time",
        )?;
        let rows = stmt.query_map(
            params![
                filter.division_id.map(|id| id.to_string()),
                filter.team_id.map(|id| id.to_string()),
                filter.from.map(|d| d.to_string()),
                filter.to.map(|d| d.to_string()),
            ],
            |row| {
                let status: String = row.get(5)?;
                Ok(ScheduledGame {
                    game_id: uuid_col(row, 0)?,
                    division_id: uuid_col(row, 1)?,
                    division_name: row.get(2)?,
                    home_team: row.get(3)?,
                    away_team: row.get(4)?,
                    status: GameStatus::from_str(&status).unwrap_or(GameStatus::Scheduled),
                    home_score: row.get(6)?,
                    away_score: row.get(7)?,
                    location: row.get(8)?,
                    game_date: date_col(row, 9)?,
                    game_time: row.get(10)?,
                })
            },
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
