//! Security posture check: leftover development settings that should
//! never reach a production install.

use std::path::Path;

use d8tl_core::models::PortalRole;
use d8tl_core::Database;

use crate::auth;
use crate::config::{Layout, Paths};

use super::CheckResult;

/// Passwords nobody should still be using after setup.
const KNOWN_DEFAULT_PASSWORDS: &[&str] = &["changeme", "password", "d8tl", "admin"];

pub fn run(paths: &Paths, layout: Layout) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let db = match Database::open(&paths.db_path) {
        Ok(db) => db,
        Err(err) => {
            results.push(CheckResult::fail("database", format!("{err:#}")));
            return results;
        }
    };

    for role in [PortalRole::Coach, PortalRole::Admin] {
        results.push(check_password(&db, role));
    }

    results.push(check_file_mode(&paths.db_path, layout));

    match db.setting("log_level") {
        Ok(Some(level)) if matches!(level.as_str(), "debug" | "trace") => {
            results.push(if layout == Layout::Production {
                CheckResult::warn(
                    "log level",
                    format!("\"{level}\" on a production install leaks request detail into logs"),
                )
            } else {
                CheckResult::pass("log level", format!("\"{level}\" (development install)"))
            });
        }
        Ok(_) => results.push(CheckResult::pass("log level", "not verbose")),
        Err(err) => results.push(CheckResult::fail("log level", format!("{err:#}"))),
    }

    let env_file = paths.data_dir.join(".env");
    results.push(if env_file.exists() {
        CheckResult::warn(
            "env file",
            format!("{} present; move secrets out of the data directory", env_file.display()),
        )
    } else {
        CheckResult::pass("env file", "none in data directory")
    });

    results
}

fn check_password(db: &Database, role: PortalRole) -> CheckResult {
    let key = auth::password_setting_key(role);
    let name = match role {
        PortalRole::Coach => "coach password",
        PortalRole::Admin => "admin password",
    };
    match db.setting(key) {
        Ok(None) => CheckResult::warn(name, "not set; portal login disabled"),
        Ok(Some(hash)) => {
            for candidate in KNOWN_DEFAULT_PASSWORDS {
                if auth::verify_password(candidate, &hash).unwrap_or(false) {
                    return CheckResult::fail(
                        name,
                        format!("well-known default password \"{candidate}\" is in force"),
                    );
                }
            }
            CheckResult::pass(name, "set, not a known default")
        }
        Err(err) => CheckResult::fail(name, format!("{err:#}")),
    }
}

#[cfg(unix)]
fn check_file_mode(path: &Path, layout: Layout) -> CheckResult {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => {
            let mode = meta.permissions().mode() & 0o777;
            if mode & 0o077 == 0 {
                CheckResult::pass("database permissions", format!("{mode:o}"))
            } else if layout == Layout::Production {
                CheckResult::fail(
                    "database permissions",
                    format!("{mode:o} is group/world readable; chmod 600 {}", path.display()),
                )
            } else {
                CheckResult::warn(
                    "database permissions",
                    format!("{mode:o} is group/world readable"),
                )
            }
        }
        Err(err) => CheckResult::fail("database permissions", format!("{err}")),
    }
}

#[cfg(not(unix))]
fn check_file_mode(_path: &Path, _layout: Layout) -> CheckResult {
    CheckResult::pass("database permissions", "not checked on this platform")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_paths;
    use crate::ops::CheckStatus;

    fn setup() -> (tempfile::TempDir, Paths, Database) {
        let tmp = tempfile::tempdir().unwrap();
        let (paths, _) = resolve_paths(Some(tmp.path())).unwrap();
        let db = Database::open(&paths.db_path).unwrap();
        db.migrate().unwrap();
        (tmp, paths, db)
    }

    #[test]
    fn default_password_is_a_hard_failure() {
        let (_tmp, paths, db) = setup();
        let hash = auth::hash_password("changeme").unwrap();
        db.put_setting("admin_password_hash", &hash).unwrap();

        let results = run(&paths, Layout::Production);
        assert!(results
            .iter()
            .any(|r| r.name == "admin password" && r.status == CheckStatus::Fail));
    }

    #[test]
    fn strong_password_passes() {
        let (_tmp, paths, db) = setup();
        let hash = auth::hash_password("Correct-Horse-D8TL-42").unwrap();
        db.put_setting("admin_password_hash", &hash).unwrap();
        db.put_setting("coach_password_hash", &hash).unwrap();

        let results = run(&paths, Layout::Development);
        assert!(results
            .iter()
            .filter(|r| r.name.ends_with("password"))
            .all(|r| r.status == CheckStatus::Pass));
    }

    #[test]
    fn verbose_logging_only_flagged_in_production() {
        let (_tmp, paths, db) = setup();
        db.put_setting("log_level", "debug").unwrap();

        let prod = run(&paths, Layout::Production);
        assert!(prod
            .iter()
            .any(|r| r.name == "log level" && r.status == CheckStatus::Warn));

        let dev = run(&paths, Layout::Development);
        assert!(dev
            .iter()
            .any(|r| r.name == "log level" && r.status == CheckStatus::Pass));
    }

    #[test]
    fn stray_env_file_is_flagged() {
        let (_tmp, paths, _db) = setup();
        std::fs::write(paths.data_dir.join(".env"), "SECRET=x").unwrap();

        let results = run(&paths, Layout::Development);
        assert!(results
            .iter()
            .any(|r| r.name == "env file" && r.status == CheckStatus::Warn));
    }
}
