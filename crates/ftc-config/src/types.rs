// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `ftc_robotcore.toml`. Missing sections and
//! fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RobotCoreConfig {
    pub opmode: OpModeConfig,
    pub telemetry: TelemetryConfig,
    pub manager: ManagerConfig,
    pub logging: LoggingConfig,
}

/// OpMode worker timing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OpModeConfig {
    /// Yield between iterative callback passes
    pub idle_sleep_ms: u64,
    /// Driver-thread poll period while draining a stopping worker
    pub stop_poll_interval_ms: u64,
    /// Elapsed drain time after which a slow-stop warning is logged
    pub stop_warning_threshold_ms: u64,
}

impl Default for OpModeConfig {
    fn default() -> Self {
        Self {
            idle_sleep_ms: 1,
            stop_poll_interval_ms: 5,
            stop_warning_threshold_ms: 900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub min_transmission_interval_ms: u64,
    pub auto_clear: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            min_transmission_interval_ms: 250,
            auto_clear: true,
        }
    }
}

/// Host manager behavior
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Initialise an autonomous OpMode's transition target after it stops
    pub auto_transition: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            auto_transition: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,
    /// Directory for rolling log files; `None` logs to the console only
    pub log_dir: Option<PathBuf>,
    /// Days of log files to keep
    pub retention_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_days: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RobotCoreConfig::default();
        assert_eq!(config.opmode.idle_sleep_ms, 1);
        assert_eq!(config.opmode.stop_poll_interval_ms, 5);
        assert_eq!(config.opmode.stop_warning_threshold_ms, 900);
        assert_eq!(config.telemetry.min_transmission_interval_ms, 250);
        assert!(config.telemetry.auto_clear);
        assert!(config.manager.auto_transition);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: RobotCoreConfig = toml::from_str(
            r#"
            [opmode]
            stop_warning_threshold_ms = 2000

            [logging]
            log_dir = "/tmp/ftc-logs"
            "#,
        )
        .unwrap();

        assert_eq!(config.opmode.stop_warning_threshold_ms, 2000);
        assert_eq!(config.opmode.stop_poll_interval_ms, 5);
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/tmp/ftc-logs")));
        assert_eq!(config.telemetry, TelemetryConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = RobotCoreConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RobotCoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
