use anyhow::{Context, Result};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now, ts_col, uuid_col, Database, DeleteOutcome, Dependent};
use crate::models::{CreateDivisionInput, Division, DivisionSummary, UpdateDivisionInput};

fn row_to_division(row: &Row<'_>) -> rusqlite::Result<Division> {
    Ok(Division {
        id: uuid_col(row, 0)?,
        season_id: uuid_col(row, 1)?,
        name: row.get(2)?,
        created_at: ts_col(row, 3)?,
        updated_at: ts_col(row, 4)?,
    })
}

impl Database {
    pub fn create_division(&self, input: CreateDivisionInput) -> Result<Division> {
        let division = Division {
            id: Uuid::new_v4(),
            season_id: input.season_id,
            name: input.name,
            created_at: now(),
            updated_at: now(),
        };
        self.conn()
            .execute(
                "INSERT INTO divisions (id, season_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    division.id.to_string(),
                    division.season_id.to_string(),
                    division.name,
                    division.created_at.to_rfc3339(),
                    division.updated_at.to_rfc3339(),
                ],
            )
            .context("failed to create division (does the season exist?)")?;
        Ok(division)
    }

    pub fn get_division(&self, id: Uuid) -> Result<Option<Division>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, season_id, name, created_at, updated_at FROM divisions WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id.to_string()], row_to_division)?;
        Ok(rows.next().transpose()?)
    }

    /// Divisions with their team counts, optionally scoped to a season.
    pub fn list_divisions(&self, season_id: Option<Uuid>) -> Result<Vec<DivisionSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT d.id, d.season_id, d.name, d.created_at, d.updated_at,
                    (SELECT COUNT(*) FROM teams t WHERE t.division_id = d.id) AS team_count
             FROM divisions d
             WHERE (?1 IS NULL OR d.season_id = ?1)
             ORDER BY d.name",
        )?;
        let rows = stmt.query_map([season_id.map(|id| id.to_string())], |row| {
            Ok(DivisionSummary {
                division: row_to_division(row)?,
                team_count: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_division(&self, id: Uuid, input: UpdateDivisionInput) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE divisions SET name = COALESCE(?2, name), updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), input.name, now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// Refuses while teams or games still belong to the division.
    pub fn delete_division(&self, id: Uuid) -> Result<DeleteOutcome> {
        let conn = self.conn();
        let key = id.to_string();

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM divisions WHERE id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        if exists == 0 {
            return Ok(DeleteOutcome::NotFound);
        }

        let teams: i64 = conn.query_row(
            "SELECT COUNT(*) FROM teams WHERE division_id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        let games: i64 = conn.query_row(
            "SELECT COUNT(*) FROM games WHERE division_id = ?1",
            [&key],
            |r| r.get(0),
        )?;

        let dependents: Vec<Dependent> = [("team", teams), ("game", games)]
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(kind, count)| Dependent { kind, count })
            .collect();

        if !dependents.is_empty() {
            return Ok(DeleteOutcome::Blocked(dependents));
        }

        conn.execute("DELETE FROM divisions WHERE id = ?1", [&key])?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::*;

    #[test]
    fn delete_refused_with_teams_then_succeeds_once_empty() {
        let db = testutil::test_db();
        let program = testutil::program(&db);
        let season = testutil::season(&db, program.id);
        let division = testutil::division(&db, season.id);
        let team = testutil::team(&db, division.id, "Rockets", None);

        assert!(matches!(
            db.delete_division(division.id).unwrap(),
            DeleteOutcome::Blocked(_)
        ));

        assert_eq!(db.delete_team(team.id).unwrap(), DeleteOutcome::Deleted);
        assert_eq!(
            db.delete_division(division.id).unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(db.list_divisions(Some(season.id)).unwrap().is_empty());
    }

    #[test]
    fn listing_reports_team_counts() {
        let db = testutil::test_db();
        let program = testutil::program(&db);
        let season = testutil::season(&db, program.id);
        let division = testutil::division(&db, season.id);
        testutil::team(&db, division.id, "Rockets", None);
        testutil::team(&db, division.id, "Comets", None);

        let listed = db.list_divisions(Some(season.id)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].team_count, 2);
    }
}
