use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now, ts_col, uuid_col, Database, DeleteOutcome, Dependent};
use crate::models::{CreateProgramInput, Program, ProgramSummary, UpdateProgramInput};

fn row_to_program(row: &Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        sport: row.get(3)?,
        min_age: row.get(4)?,
        max_age: row.get(5)?,
        is_active: row.get(6)?,
        created_at: ts_col(row, 7)?,
        updated_at: ts_col(row, 8)?,
    })
}

const PROGRAM_COLS: &str = "id, name, code, sport, min_age, max_age, is_active, created_at, updated_at";

impl Database {
    pub fn create_program(&self, input: CreateProgramInput) -> Result<Program> {
        let program = Program {
            id: Uuid::new_v4(),
            name: input.name,
            code: input.code,
            sport: input.sport,
            min_age: input.min_age,
            max_age: input.max_age,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        };
        self.conn().execute(
            "INSERT INTO programs (id, name, code, sport, min_age, max_age, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                program.id.to_string(),
                program.name,
                program.code,
                program.sport,
                program.min_age,
                program.max_age,
                program.is_active,
                program.created_at.to_rfc3339(),
                program.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(program)
    }

    pub fn get_program(&self, id: Uuid) -> Result<Option<Program>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {PROGRAM_COLS} FROM programs WHERE id = ?1"))?;
        let mut rows = stmt.query_map([id.to_string()], row_to_program)?;
        Ok(rows.next().transpose()?)
    }

    /// All programs with their season counts, for the admin listing.
    pub fn list_programs(&self) -> Result<Vec<ProgramSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.code, p.sport, p.min_age, p.max_age, p.is_active,
                    p.created_at, p.updated_at,
                    (SELECT COUNT(*) FROM seasons s WHERE s.program_id = p.id) AS season_count
             FROM programs p
             ORDER BY p.name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProgramSummary {
                program: row_to_program(row)?,
                season_count: row.get(9)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_program(&self, id: Uuid, input: UpdateProgramInput) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE programs SET
                name = COALESCE(?2, name),
                code = COALESCE(?3, code),
                sport = COALESCE(?4, sport),
                min_age = COALESCE(?5, min_age),
                max_age = COALESCE(?6, max_age),
                is_active = COALESCE(?7, is_active),
                updated_at = ?8
             WHERE id = ?1",
            params![
                id.to_string(),
                input.name,
                input.code,
                input.sport,
                input.min_age,
                input.max_age,
                input.is_active,
                now().to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Refuses while any season, team or game still belongs to the
    /// program (transitively through its seasons and divisions).
    pub fn delete_program(&self, id: Uuid) -> Result<DeleteOutcome> {
        let conn = self.conn();
        let key = id.to_string();

        let exists: i64 =
            conn.query_row("SELECT COUNT(*) FROM programs WHERE id = ?1", [&key], |r| {
                r.get(0)
            })?;
        if exists == 0 {
            return Ok(DeleteOutcome::NotFound);
        }

        let seasons: i64 = conn.query_row(
            "SELECT COUNT(*) FROM seasons WHERE program_id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        let teams: i64 = conn.query_row(
            "SELECT COUNT(*) FROM teams t
             JOIN divisions d ON t.division_id = d.id
             JOIN seasons s ON d.season_id = s.id
             WHERE s.program_id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        let games: i64 = conn.query_row(
            "SELECT COUNT(*) FROM games g
             JOIN divisions d ON g.division_id = d.id
             JOIN seasons s ON d.season_id = s.id
             WHERE s.program_id = ?1",
            [&key],
            |r| r.get(0),
        )?;

        let dependents: Vec<Dependent> = [
            ("season", seasons),
            ("team", teams),
            ("game", games),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| Dependent { kind, count })
        .collect();

        if !dependents.is_empty() {
            return Ok(DeleteOutcome::Blocked(dependents));
        }

        conn.execute("DELETE FROM programs WHERE id = ?1", [&key])?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::*;

    #[test]
    fn create_list_delete_roundtrip() {
        let db = testutil::test_db();
        let program = db
            .create_program(CreateProgramInput {
                name: "Baseball 12U".into(),
                code: "BB12U".into(),
                sport: "Baseball".into(),
                min_age: 8,
                max_age: 12,
            })
            .unwrap();

        let listed = db.list_programs().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].program.code, "BB12U");
        assert_eq!(listed[0].season_count, 0);

        assert_eq!(db.delete_program(program.id).unwrap(), DeleteOutcome::Deleted);
        assert!(db.list_programs().unwrap().is_empty());
    }

    #[test]
    fn update_patches_only_provided_fields() {
        let db = testutil::test_db();
        let program = testutil::program(&db);

        assert!(db
            .update_program(
                program.id,
                UpdateProgramInput {
                    name: Some("Softball 10U".into()),
                    code: None,
                    sport: None,
                    min_age: None,
                    max_age: None,
                    is_active: Some(false),
                },
            )
            .unwrap());

        let updated = db.get_program(program.id).unwrap().unwrap();
        assert_eq!(updated.name, "Softball 10U");
        assert_eq!(updated.code, program.code);
        assert!(!updated.is_active);
    }

    #[test]
    fn delete_blocked_enumerates_present_kinds_only() {
        let db = testutil::test_db();
        let program = testutil::program(&db);
        let season = testutil::season(&db, program.id);

        // A season but no teams or games: only "season" may appear.
        match db.delete_program(program.id).unwrap() {
            DeleteOutcome::Blocked(deps) => {
                assert_eq!(deps.len(), 1);
                assert_eq!(deps[0].kind, "season");
                assert_eq!(deps[0].count, 1);
            }
            other => panic!("expected Blocked, got {other:?}"),
        }

        let division = testutil::division(&db, season.id);
        testutil::team(&db, division.id, "Rockets", Some("rockets@d8tl.org"));

        match db.delete_program(program.id).unwrap() {
            DeleteOutcome::Blocked(deps) => {
                let kinds: Vec<_> = deps.iter().map(|d| d.kind).collect();
                assert_eq!(kinds, vec!["season", "team"]);
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn delete_missing_program_is_not_found() {
        let db = testutil::test_db();
        assert_eq!(
            db.delete_program(Uuid::new_v4()).unwrap(),
            DeleteOutcome::NotFound
        );
    }
}
