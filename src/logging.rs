//! Log setup and runtime control.
//!
//! The server logs to stderr and to a dated file under the log
//! directory. The admin log API can change the level at runtime through
//! the reload handle and reads/cleans the files written here.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

pub const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

const FILE_PREFIX: &str = "d8tl-";
const FILE_SUFFIX: &str = ".log";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Handle to the running subscriber, shared with the admin log API.
#[derive(Clone)]
pub struct LogControl {
    handle: Option<FilterHandle>,
    log_dir: PathBuf,
}

impl LogControl {
    /// For tests and CLI one-shots that never initialize file logging.
    pub fn noop(log_dir: PathBuf) -> Self {
        Self {
            handle: None,
            log_dir,
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Swap the active filter for one at `level`.
    pub fn set_level(&self, level: &str) -> Result<()> {
        if !LEVELS.contains(&level) {
            bail!("unknown log level \"{level}\"");
        }
        if let Some(handle) = &self.handle {
            handle
                .reload(EnvFilter::new(directive(level)))
                .context("failed to apply log level")?;
        }
        Ok(())
    }

    /// Log files on disk, newest first (dated names sort).
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.log_dir)
            .with_context(|| format!("failed to read {}", self.log_dir.display()))?
        {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX) {
                files.push(path);
            }
        }
        files.sort();
        files.reverse();
        Ok(files)
    }

    /// The date encoded in a log file's name, if it parses.
    pub fn file_date(path: &Path) -> Option<chrono::NaiveDate> {
        let name = path.file_name()?.to_str()?;
        let stamp = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
        chrono::NaiveDate::parse_from_str(stamp, "%Y-%m-%d").ok()
    }
}

fn directive(level: &str) -> String {
    format!("d8tl={level},d8tl_core={level},tower_http=info")
}

fn dated_file_name() -> String {
    format!(
        "{FILE_PREFIX}{}{FILE_SUFFIX}",
        chrono::Utc::now().format("%Y-%m-%d")
    )
}

/// Stderr plus a dated file, with a reloadable level filter.
/// `RUST_LOG` overrides the stored level when set.
pub fn init(log_dir: &Path, level: &str) -> Result<LogControl> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(log_dir.join(dated_file_name()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(directive(if LEVELS.contains(&level) { level } else { "info" }))
    });
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(LogControl {
        handle: Some(handle),
        log_dir: log_dir.to_path_buf(),
    })
}

/// Stderr only, for the operational subcommands.
pub fn init_minimal() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("d8tl=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
