use anyhow::Result;
use rusqlite::{params, Connection};

use super::{now, Database};

/// Settings every consumer may assume exist after `migrate()`.
const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("league_name", "District 8 Travel League"),
    ("timezone", "America/New_York"),
];

pub(super) fn seed_default_settings(conn: &Connection) -> Result<()> {
    for (key, value) in DEFAULT_SETTINGS {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, now().to_rfc3339()],
        )?;
    }
    Ok(())
}

impl Database {
    pub fn setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query_map([key], |row| row.get(0))?;
        Ok(rows.next().transpose()?)
    }

    /// Read with a default fallback for absent keys.
    pub fn setting_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.setting(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Upsert. No validation here; callers validate before writing.
    /// Concurrent writers race, last write wins.
    pub fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn all_settings(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;

    #[test]
    fn set_then_get_round_trips() {
        let db = testutil::test_db();
        db.put_setting("contact_email", "info@d8tl.org").unwrap();
        assert_eq!(
            db.setting_or("contact_email", "unset").unwrap(),
            "info@d8tl.org"
        );
    }

    #[test]
    fn get_unset_key_returns_default() {
        let db = testutil::test_db();
        assert_eq!(db.setting("no_such_key").unwrap(), None);
        assert_eq!(db.setting_or("no_such_key", "fallback").unwrap(), "fallback");
    }

    #[test]
    fn set_overwrites_existing_value() {
        let db = testutil::test_db();
        db.put_setting("league_name", "District 8").unwrap();
        db.put_setting("league_name", "District Eight").unwrap();
        assert_eq!(
            db.setting("league_name").unwrap().as_deref(),
            Some("District Eight")
        );
    }

    #[test]
    fn defaults_are_seeded_but_not_reset() {
        let db = testutil::test_db();
        assert_eq!(
            db.setting("league_name").unwrap().as_deref(),
            Some("District 8 Travel League")
        );

        db.put_setting("timezone", "America/Chicago").unwrap();
        db.migrate().unwrap();
        assert_eq!(
            db.setting("timezone").unwrap().as_deref(),
            Some("America/Chicago")
        );
    }
}
