//! Deployment health check: can the server actually run here?

use std::path::Path;

use d8tl_core::Database;

use crate::auth;
use crate::config::Paths;
use d8tl_core::models::PortalRole;

use super::CheckResult;

const REQUIRED_TABLES: &[&str] = &[
    "programs",
    "seasons",
    "divisions",
    "teams",
    "locations",
    "games",
    "schedules",
    "schedule_change_requests",
    "email_templates",
    "email_recipients",
    "settings",
    "portal_sessions",
];

pub fn run(paths: &Paths) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let db = match Database::open(&paths.db_path) {
        Ok(db) => {
            results.push(CheckResult::pass(
                "database",
                format!("opened {}", paths.db_path.display()),
            ));
            db
        }
        Err(err) => {
            results.push(CheckResult::fail("database", format!("{err:#}")));
            // Nothing else is meaningful without a database.
            results.push(dir_writable("log directory", &paths.log_dir));
            results.push(dir_writable("backup directory", &paths.backup_dir));
            return results;
        }
    };

    results.push(match db.existing_tables() {
        Ok(tables) => {
            let missing: Vec<&str> = REQUIRED_TABLES
                .iter()
                .copied()
                .filter(|required| !tables.iter().any(|t| t == required))
                .collect();
            if missing.is_empty() {
                CheckResult::pass("schema", "all tables present")
            } else {
                CheckResult::fail(
                    "schema",
                    format!("missing tables: {} (run the server once)", missing.join(", ")),
                )
            }
        }
        Err(err) => CheckResult::fail("schema", format!("{err:#}")),
    });

    results.push(match db.setting("league_name") {
        Ok(Some(name)) => CheckResult::pass("settings", format!("league_name = {name}")),
        Ok(None) => CheckResult::warn("settings", "defaults not seeded yet"),
        Err(err) => CheckResult::fail("settings", format!("{err:#}")),
    });

    for role in [PortalRole::Coach, PortalRole::Admin] {
        let key = auth::password_setting_key(role);
        results.push(match db.setting(key) {
            Ok(Some(_)) => CheckResult::pass(role.as_str(), "portal password set"),
            Ok(None) => CheckResult::warn(
                role.as_str(),
                format!("no portal password ({key} unset); login disabled"),
            ),
            Err(err) => CheckResult::fail(role.as_str(), format!("{err:#}")),
        });
    }

    results.push(dir_writable("log directory", &paths.log_dir));
    results.push(dir_writable("backup directory", &paths.backup_dir));
    results
}

fn dir_writable(name: &'static str, dir: &Path) -> CheckResult {
    let probe = dir.join(".d8tl-write-probe");
    match std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&probe, b"probe"))
        .and_then(|()| std::fs::remove_file(&probe))
    {
        Ok(()) => CheckResult::pass(name, format!("{} is writable", dir.display())),
        Err(err) => CheckResult::fail(name, format!("{}: {err}", dir.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_paths;
    use crate::ops::{exit_code, CheckStatus};

    #[test]
    fn fresh_install_warns_but_does_not_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let (paths, _) = resolve_paths(Some(tmp.path())).unwrap();
        let db = Database::open(&paths.db_path).unwrap();
        db.migrate().unwrap();

        let results = run(&paths);
        assert!(results.iter().all(|r| r.status != CheckStatus::Fail));
        // Portal passwords are unset on a fresh install.
        assert_eq!(exit_code(&results), 2);
    }

    #[test]
    fn seeded_install_passes_clean() {
        let tmp = tempfile::tempdir().unwrap();
        let (paths, _) = resolve_paths(Some(tmp.path())).unwrap();
        let db = Database::open(&paths.db_path).unwrap();
        db.migrate().unwrap();
        db.put_setting("coach_password_hash", "$argon2id$placeholder")
            .unwrap();
        db.put_setting("admin_password_hash", "$argon2id$placeholder")
            .unwrap();

        let results = run(&paths);
        assert_eq!(exit_code(&results), 0);
    }

    #[test]
    fn empty_database_fails_schema_check() {
        let tmp = tempfile::tempdir().unwrap();
        let (paths, _) = resolve_paths(Some(tmp.path())).unwrap();
        // Open without migrating: file exists, schema does not.
        Database::open(&paths.db_path).unwrap();

        let results = run(&paths);
        assert_eq!(exit_code(&results), 1);
        assert!(results
            .iter()
            .any(|r| r.name == "schema" && r.status == CheckStatus::Fail));
    }
}
