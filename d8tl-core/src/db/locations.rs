use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{now, ts_col, uuid_col, Database, DeleteOutcome, Dependent};
use crate::models::{CreateLocationInput, Location, LocationStatus, UpdateLocationInput};

fn row_to_location(row: &Row<'_>) -> rusqlite::Result<Location> {
    let status: String = row.get(6)?;
    Ok(Location {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        notes: row.get(5)?,
        status: LocationStatus::from_str(&status).unwrap_or(LocationStatus::Active),
        created_at: ts_col(row, 7)?,
        updated_at: ts_col(row, 8)?,
    })
}

const LOCATION_COLS: &str =
    "id, name, address, latitude, longitude, notes, status, created_at, updated_at";

impl Database {
    pub fn create_location(&self, input: CreateLocationInput) -> Result<Location> {
        let location = Location {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            notes: input.notes,
            status: LocationStatus::Active,
            created_at: now(),
            updated_at: now(),
        };
        self.conn().execute(
            "INSERT INTO locations (id, name, address, latitude, longitude, notes, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                location.id.to_string(),
                location.name,
                location.address,
                location.latitude,
                location.longitude,
                location.notes,
                location.status.as_str(),
                location.created_at.to_rfc3339(),
                location.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(location)
    }

    pub fn get_location(&self, id: Uuid) -> Result<Option<Location>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {LOCATION_COLS} FROM locations WHERE id = ?1"))?;
        let mut rows = stmt.query_map([id.to_string()], row_to_location)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_locations(&self) -> Result<Vec<Location>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {LOCATION_COLS} FROM locations ORDER BY name"))?;
        let rows = stmt.query_map([], row_to_location)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_location(&self, id: Uuid, input: UpdateLocationInput) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE locations SET
                name = COALESCE(?2, name),
                address = COALESCE(?3, address),
                latitude = COALESCE(?4, latitude),
                longitude = COALESCE(?5, longitude),
                notes = COALESCE(?6, notes),
                status = COALESCE(?7, status),
                updated_at = ?8
             WHERE id = ?1",
            params![
                id.to_string(),
                input.name,
                input.address,
                input.latitude,
                input.longitude,
                input.notes,
                input.status.map(|s| s.as_str()),
                now().to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Refuses while schedule entries still point at the location.
    pub fn delete_location(&self, id: Uuid) -> Result<DeleteOutcome> {
        let conn = self.conn();
        let key = id.to_string();

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM locations WHERE id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        if exists == 0 {
            return Ok(DeleteOutcome::NotFound);
        }

        let schedules: i64 = conn.query_row(
            "SELECT COUNT(*) FROM schedules WHERE location_id = ?1",
            [&key],
            |r| r.get(0),
        )?;
        if schedules > 0 {
            return Ok(DeleteOutcome::Blocked(vec![Dependent {
                kind: "scheduled game",
                count: schedules,
            }]));
        }

        conn.execute("DELETE FROM locations WHERE id = ?1", [&key])?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::*;

    #[test]
    fn location_delete_blocked_by_schedule() {
        let db = testutil::test_db();
        let fixture = testutil::league(&db);

        assert!(matches!(
            db.delete_location(fixture.location.id).unwrap(),
            DeleteOutcome::Blocked(_)
        ));
    }

    #[test]
    fn location_can_be_deactivated() {
        let db = testutil::test_db();
        let location = testutil::location(&db, "Riverside Field");

        db.update_location(
            location.id,
            UpdateLocationInput {
                name: None,
                address: None,
                latitude: None,
                longitude: None,
                notes: Some("Closed for maintenance".into()),
                status: Some(LocationStatus::Inactive),
            },
        )
        .unwrap();

        let updated = db.get_location(location.id).unwrap().unwrap();
        assert_eq!(updated.status, LocationStatus::Inactive);
        assert_eq!(updated.notes.as_deref(), Some("Closed for maintenance"));
    }
}
