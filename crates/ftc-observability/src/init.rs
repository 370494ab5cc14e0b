// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature and a configured
//! `log_dir`, also a daily-rolling file inside a timestamped run folder:
//!
//! ```text
//! <log_dir>/
//!   └── run_20250101_120000/
//!       └── robotcore.log.2025-01-01
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use ftc_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps file writers alive; drop it last, at process exit
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder receiving this run's log files, if file logging is active
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

/// Filter for the configured base level plus per-crate debug flags
///
/// `RUST_LOG`, when set and valid, replaces both.
pub fn build_filter(debug_flags: &CrateDebugFlags, base_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(debug_flags.to_filter_string(base_level)))
}

/// Install the global tracing subscriber
///
/// # Errors
/// Fails if the log folder cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_filter(build_filter(debug_flags, &config.level));

    #[cfg(feature = "file-logging")]
    {
        let (file_layer, file_guard, run_dir) = match &config.log_dir {
            Some(base) => {
                let run_dir = create_run_dir(base)?;
                cleanup_old_logs(base, config.retention_days)?;

                let appender = tracing_appender::rolling::daily(&run_dir, "robotcore.log");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(build_filter(debug_flags, &config.level));
                (Some(layer), Some(guard), Some(run_dir))
            }
            None => (None, None, None),
        };

        Registry::default()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;

        Ok(LoggingGuard {
            _file_guard: file_guard,
            run_dir,
        })
    }

    #[cfg(not(feature = "file-logging"))]
    {
        Registry::default()
            .with(console_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;

        if let Some(dir) = &config.log_dir {
            tracing::warn!(
                "[LOGGING] log_dir {} ignored: built without the file-logging feature",
                dir.display()
            );
        }
        Ok(LoggingGuard { run_dir: None })
    }
}

#[cfg(feature = "file-logging")]
fn create_run_dir(base: &Path) -> Result<PathBuf> {
    let run_dir = base.join(format!(
        "{}{}",
        RUN_PREFIX,
        Utc::now().format(RUN_TIMESTAMP_FORMAT)
    ));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;
    Ok(run_dir)
}

/// Remove run folders older than `retention_days`; returns how many were removed
///
/// Entries that are not `run_<timestamp>` folders are left alone.
pub fn cleanup_old_logs(base_log_dir: &Path, retention_days: u32) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
    let mut removed = 0;

    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(created) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(RUN_PREFIX))
            .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok())
        else {
            continue;
        };

        if created.and_utc() < cutoff {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_removes_only_expired_runs() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("run_20000101_000000");
        let fresh = dir.path().join(format!(
            "run_{}",
            Utc::now().format(RUN_TIMESTAMP_FORMAT)
        ));
        let unrelated = dir.path().join("keep_me");
        for path in [&old, &fresh, &unrelated] {
            std::fs::create_dir_all(path).unwrap();
        }

        let removed = cleanup_old_logs(dir.path(), 7).unwrap();

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_cleanup_missing_dir_is_ok() {
        let dir = tempdir().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("absent"), 7).unwrap(), 0);
    }
}
