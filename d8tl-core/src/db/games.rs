use anyhow::{Context, Result};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now, ts_col, uuid_col, Database, DeleteOutcome};
use crate::models::{CreateGameInput, Game, GameManagers, GameStatus};

fn row_to_game(row: &Row<'_>) -> rusqlite::Result<Game> {
    let status: String = row.get(4)?;
    Ok(Game {
        id: uuid_col(row, 0)?,
        division_id: uuid_col(row, 1)?,
        home_team_id: uuid_col(row, 2)?,
        away_team_id: uuid_col(row, 3)?,
        status: GameStatus::from_str(&status).unwrap_or(GameStatus::Scheduled),
        home_score: row.get(5)?,
        away_score: row.get(6)?,
        created_at: ts_col(row, 7)?,
        updated_at: ts_col(row, 8)?,
    })
}

const GAME_COLS: &str = "id, division_id, home_team_id, away_team_id, status, home_score, away_score, created_at, updated_at";

impl Database {
    /// Creates the game and its schedule slot in one transaction.
    pub fn create_game(&self, input: CreateGameInput) -> Result<Game> {
        let game = Game {
            id: Uuid::new_v4(),
            division_id: input.division_id,
            home_team_id: input.home_team_id,
            away_team_id: input.away_team_id,
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
            created_at: now(),
            updated_at: now(),
        };

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO games (id, division_id, home_team_id, away_team_id, status, home_score, away_score, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, ?6, ?7)",
            params![
                game.id.to_string(),
                game.division_id.to_string(),
                game.home_team_id.to_string(),
                game.away_team_id.to_string(),
                game.status.as_str(),
                game.created_at.to_rfc3339(),
                game.updated_at.to_rfc3339(),
            ],
        )
        .context("failed to create game (do the division and teams exist?)")?;
        tx.execute(
            "INSERT INTO schedules (id, game_id, location_id, game_date, game_time, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Uuid::new_v4().to_string(),
                game.id.to_string(),
                input.location_id.to_string(),
                input.game_date.to_string(),
                input.game_time,
                game.created_at.to_rfc3339(),
                game.updated_at.to_rfc3339(),
            ],
        )
        .context("failed to schedule game (does the location exist?)")?;
        tx.commit()?;
        Ok(game)
    }

    pub fn get_game(&self, id: Uuid) -> Result<Option<Game>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {GAME_COLS} FROM games WHERE id = ?1"))?;
        let mut rows = stmt.query_map([id.to_string()], row_to_game)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_games(&self, division_id: Option<Uuid>) -> Result<Vec<Game>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GAME_COLS} FROM games
             WHERE (?1 IS NULL OR division_id = ?1)
             ORDER BY created_at"
        ))?;
        let rows = stmt.query_map([division_id.map(|id| id.to_string())], row_to_game)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Record a final score and mark the game played.
    pub fn record_score(&self, game_id: Uuid, home_score: i64, away_score: i64) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE games SET home_score = ?2, away_score = ?3, status = 'played', updated_at = ?4
             WHERE id = ?1",
            params![
                game_id.to_string(),
                home_score,
                away_score,
                now().to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn set_game_status(&self, game_id: Uuid, status: GameStatus) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE games SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![game_id.to_string(), status.as_str(), now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// Manager e-mail addresses of the two teams, for recipient resolution.
    pub fn game_managers(&self, game_id: Uuid) -> Result<Option<GameManagers>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT h.manager_email, a.manager_email
             FROM games g
             JOIN teams h ON g.home_team_id = h.id
             JOIN teams a ON g.away_team_id = a.id
             WHERE g.id = ?1",
        )?;
        let mut rows = stmt.query_map([game_id.to_string()], |row| {
            Ok(GameManagers {
                home: row.get(0)?,
                away: row.get(1)?,
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    /// The schedule slot and any change requests go with the game.
    pub fn delete_game(&self, id: Uuid) -> Result<DeleteOutcome> {
        let changed = self
            .conn()
            .execute("DELETE FROM games WHERE id = ?1", [id.to_string()])?;
        Ok(if changed > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }
}
