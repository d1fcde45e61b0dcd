use anyhow::{Context, Result};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now, ts_col, uuid_col, Database, DeleteOutcome, Dependent};
use crate::models::{CreateTeamInput, Team, UpdateTeamInput};

fn row_to_team(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: uuid_col(row, 0)?,
        division_id: uuid_col(row, 1)?,
        name: row.get(2)?,
        manager_name: row.get(3)?,
        manager_email: row.get(4)?,
        manager_phone: row.get(5)?,
        created_at: ts_col(row, 6)?,
        updated_at: ts_col(row, 7)?,
    })
}

const TEAM_COLS: &str =
    "id, division_id, name, manager_name, manager_email, manager_phone, created_at, updated_at";

impl Database {
    pub fn create_team(&self, input: CreateTeamInput) -> Result<Team> {
        let team = Team {
            id: Uuid::new_v4(),
            division_id: input.division_id,
            name: input.name,
            manager_name: input.manager_name,
            manager_email: input.manager_email,
            manager_phone: input.manager_phone,
            created_at: now(),
            updated_at: now(),
        };
        self.conn()
            .execute(
                "INSERT INTO teams (id, division_id, name, manager_name, manager_email, manager_phone, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    team.id.to_string(),
                    team.division_id.to_string(),
                    team.name,
                    team.manager_name,
                    team.manager_email,
                    team.manager_phone,
                    team.created_at.to_rfc3339(),
                    team.updated_at.to_rfc3339(),
                ],
            )
            .context("failed to create team (does the division exist?)")?;
        Ok(team)
    }

    pub fn get_team(&self, id: Uuid) -> Result<Option<Team>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {TEAM_COLS} FROM teams WHERE id = ?1"))?;
        let mut rows = stmt.query_map([id.to_string()], row_to_team)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_teams(&self, division_id: Option<Uuid>) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEAM_COLS} FROM teams
             WHERE (?1 IS NULL OR division_id = ?1)
             ORDER BY name"
        ))?;
        let rows = stmt.query_map([division_id.map(|id| id.to_string())], row_to_team)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_team(&self, id: Uuid, input: UpdateTeamInput) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE teams SET
                name = COALESCE(?2, name),
                manager_name = COALESCE(?3, manager_name),
                manager_email = COALESCE(?4, manager_email),
                manager_phone = COALESCE(?5, manager_phone),
                updated_at = ?6
             WHERE id = ?1",
            params![
                id.to_string(),
                input.name,
                input.manager_name,
                input.manager_email,
                input.manager_phone,
                now().to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_team(&self, id: Uuid) -> Result<DeleteOutcome> {
        let conn = self.conn();
        let key = id.to_string();

        let exists: i64 =
            conn.query_row("SELECT COUNT(*) FROM teams WHERE id = ?1", [&key], |r| {
                r.get(0)
            })?;
        if exists == 0 {
            return Ok(DeleteOutcome::NotFound);
        }

        let games: i64 = conn.query_row(
            "SELECT COUNT(*) FROM games WHERE home_team_id = ?1 OR away_team_id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        if games > 0 {
            return Ok(DeleteOutcome::Blocked(vec![Dependent {
                kind: "game",
                count: games,
            }]));
        }

        conn.execute("DELETE FROM teams WHERE id = ?1", [&key])?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::*;

    #[test]
    fn team_delete_blocked_by_games() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);

        match db.delete_team(fixture.home.id).unwrap() {
            DeleteOutcome::Blocked(deps) => {
                assert_eq!(deps[0].kind, "game");
                assert_eq!(deps[0].count, 1);
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn manager_email_is_optional() {
        let db = testutil::test_db();
        let program = testutil::program(&db);
        let season = testutil::season(&db, program.id);
        let division = testutil::division(&db, season.id);

        let team = testutil::team(&db, division.id, "Rockets", None);
        assert_eq!(db.get_team(team.id).unwrap().unwrap().manager_email, None);
    }
}
