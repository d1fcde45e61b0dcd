//! Startup configuration.
//!
//! The original deployment had every page probe the filesystem to find
//! its includes under two different layouts. Here the layout is probed
//! exactly once, at process start, and the result travels with the
//! immutable [`Config`] handed to the router. Runtime-tunable values
//! (league name, timezone, portal passwords, log level) live in the
//! settings table instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const APP_NAME: &str = "District 8 Travel League";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub version: &'static str,
    pub bind: String,
    pub port: u16,
    pub paths: Paths,
    pub layout: Layout,
    pub coach_portal_enabled: bool,
    pub notifications_enabled: bool,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub backup_dir: PathBuf,
}

/// Which deployment layout the data directory came from. The security
/// posture checks are stricter on production installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Development,
    Production,
}

/// Resolve the data directory once: an explicit override wins, then a
/// `./data` checkout directory, then the platform data directory.
pub fn resolve_paths(override_dir: Option<&Path>) -> Result<(Paths, Layout)> {
    let (data_dir, layout) = match override_dir {
        Some(dir) => (dir.to_path_buf(), Layout::Production),
        None => {
            let checkout = PathBuf::from("data");
            if checkout.is_dir() {
                (checkout, Layout::Development)
            } else {
                let dirs = directories::ProjectDirs::from("org", "d8tl", "d8tl")
                    .context("could not determine a data directory for this platform")?;
                (dirs.data_dir().to_path_buf(), Layout::Production)
            }
        }
    };

    let paths = Paths {
        db_path: data_dir.join("d8tl.db"),
        log_dir: data_dir.join("logs"),
        backup_dir: data_dir.join("backups"),
        data_dir,
    };
    for dir in [&paths.data_dir, &paths.log_dir, &paths.backup_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    Ok((paths, layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_dir_wins_and_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("league-data");

        let (paths, layout) = resolve_paths(Some(&target)).unwrap();
        assert_eq!(layout, Layout::Production);
        assert_eq!(paths.data_dir, target);
        assert!(paths.log_dir.is_dir());
        assert!(paths.backup_dir.is_dir());
        assert_eq!(paths.db_path, target.join("d8tl.db"));
    }
}
