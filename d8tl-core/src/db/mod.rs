use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use uuid::Uuid;

mod change_requests;
mod divisions;
mod email;
mod games;
mod locations;
mod portal_sessions;
mod programs;
mod schedules;
mod seasons;
mod settings;
mod teams;

pub mod schema;

#[cfg(test)]
pub(crate) mod testutil;

/// Shared handle to the league database.
///
/// rusqlite connections are not `Sync`, so the handle serializes access
/// through a mutex. That matches the deployment model: one request at a
/// time touches the database, last write wins.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("org", "d8tl", "d8tl")
            .context("could not determine a data directory for this platform")?;
        Self::open(dirs.data_dir().join("d8tl.db"))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply the schema and seed the rows a fresh install needs.
    /// Idempotent; safe to run at every startup.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(schema::SCHEMA)
            .context("failed to apply schema")?;
        settings::seed_default_settings(&conn)?;
        email::seed_default_templates(&conn)?;
        tracing::debug!("schema applied and defaults seeded");
        Ok(())
    }

    /// Consistent snapshot of the live database into `dest`.
    pub fn backup_to(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        let dest_str = dest
            .to_str()
            .context("backup destination is not valid UTF-8")?;
        self.conn()
            .execute("VACUUM INTO ?1", [dest_str])
            .with_context(|| format!("failed to back up into {}", dest.display()))?;
        tracing::debug!(dest = %dest.display(), "snapshot written");
        Ok(())
    }

    pub fn integrity_check(&self) -> Result<bool> {
        let verdict: String =
            self.conn()
                .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(verdict == "ok")
    }

    /// List of schema tables actually present, for the health check.
    pub fn existing_tables(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock just means another thread panicked mid-query;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Result of deleting an entity that other rows may depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Blocked(Vec<Dependent>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependent {
    pub kind: &'static str,
    pub count: i64,
}

impl DeleteOutcome {
    /// Friendly refusal message enumerating the dependent kinds present,
    /// e.g. `Cannot delete program "Baseball 12U": it still has 2 seasons, 12 games`.
    pub fn blocked_message(&self, entity: &str, name: &str) -> Option<String> {
        match self {
            Self::Blocked(dependents) => {
                let parts: Vec<String> = dependents
                    .iter()
                    .map(|d| {
                        if d.count == 1 {
                            format!("1 {}", d.kind)
                        } else {
                            format!("{} {}s", d.count, d.kind)
                        }
                    })
                    .collect();
                Some(format!(
                    "Cannot delete {} \"{}\": it still has {}",
                    entity,
                    name,
                    parts.join(", ")
                ))
            }
            _ => None,
        }
    }
}

// Column mapping helpers shared by the per-entity modules. The schema
// stores UUIDs and timestamps as TEXT.

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Uuid::parse_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}
