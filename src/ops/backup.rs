//! Backup and restore around SQLite's `VACUUM INTO` snapshots.

use std::path::Path;

use anyhow::{bail, Context, Result};

use d8tl_core::Database;

/// Write a consistent snapshot of the live database to `output`.
/// Refuses to overwrite an existing file.
pub fn backup(db_path: &Path, output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{} already exists; refusing to overwrite", output.display());
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let db = Database::open(db_path)?;
    db.backup_to(output)?;
    tracing::info!(from = %db_path.display(), to = %output.display(), "backup written");
    println!("Backup written to {}", output.display());
    Ok(())
}

/// Replace the live database with a snapshot. The server must be
/// stopped; the snapshot is integrity-checked before anything is
/// touched.
pub fn restore(db_path: &Path, input: &Path) -> Result<()> {
    if !input.exists() {
        bail!("{} does not exist", input.display());
    }

    let snapshot = Database::open(input)?;
    if !snapshot.integrity_check()? {
        bail!("{} failed the integrity check; not restoring", input.display());
    }
    let tables = snapshot.existing_tables()?;
    if !tables.iter().any(|t| t == "programs") {
        bail!("{} does not look like a league database", input.display());
    }
    drop(snapshot);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::copy(input, db_path)
        .with_context(|| format!("failed to copy snapshot over {}", db_path.display()))?;
    tracing::info!(from = %input.display(), to = %db_path.display(), "database restored");
    println!(
        "Restored {} from {} (start the server to continue)",
        db_path.display(),
        input.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use d8tl_core::models::CreateProgramInput;

    fn seeded_db(path: &Path) -> Database {
        let db = Database::open(path).unwrap();
        db.migrate().unwrap();
        db.create_program(CreateProgramInput {
            name: "Baseball 12U".into(),
            code: "BB12U".into(),
            sport: "Baseball".into(),
            min_age: 8,
            max_age: 12,
        })
        .unwrap();
        db
    }

    #[test]
    fn backup_then_restore_round_trips_data() {
        let tmp = tempfile::tempdir().unwrap();
        let live = tmp.path().join("d8tl.db");
        let snapshot = tmp.path().join("backups/snap.db");

        {
            let _db = seeded_db(&live);
        }
        backup(&live, &snapshot).unwrap();

        // Wipe the live database, then restore.
        std::fs::remove_file(&live).unwrap();
        restore(&live, &snapshot).unwrap();

        let db = Database::open(&live).unwrap();
        assert_eq!(db.list_programs().unwrap().len(), 1);
    }

    #[test]
    fn backup_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let live = tmp.path().join("d8tl.db");
        let snapshot = tmp.path().join("snap.db");

        {
            let _db = seeded_db(&live);
        }
        std::fs::write(&snapshot, b"precious").unwrap();
        assert!(backup(&live, &snapshot).is_err());
        assert_eq!(std::fs::read(&snapshot).unwrap(), b"precious");
    }

    #[test]
    fn restore_rejects_non_league_files() {
        let tmp = tempfile::tempdir().unwrap();
        let live = tmp.path().join("d8tl.db");
        let bogus = tmp.path().join("bogus.db");

        // A valid but empty SQLite file is not a league database.
        Database::open(&bogus).unwrap();
        assert!(restore(&live, &bogus).is_err());
        assert!(!live.exists());
    }
}
