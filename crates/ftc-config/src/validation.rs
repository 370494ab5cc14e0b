// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem in one pass so a bad file is fixed in one edit.

use crate::{ConfigError, ConfigResult, RobotCoreConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound on the driver-thread poll period
const MAX_STOP_POLL_INTERVAL_MS: u64 = 1_000;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },
    InvalidValue {
        field: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{} = {} is outside valid range ({}-{})",
                field, value, min, max
            ),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &RobotCoreConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_opmode(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_opmode(config: &RobotCoreConfig, errors: &mut Vec<ConfigValidationError>) {
    let opmode = &config.opmode;

    if opmode.stop_poll_interval_ms == 0 || opmode.stop_poll_interval_ms > MAX_STOP_POLL_INTERVAL_MS {
        errors.push(ConfigValidationError::OutOfRange {
            field: "opmode.stop_poll_interval_ms".to_string(),
            value: opmode.stop_poll_interval_ms,
            min: 1,
            max: MAX_STOP_POLL_INTERVAL_MS,
        });
    }

    if opmode.stop_warning_threshold_ms < opmode.stop_poll_interval_ms {
        errors.push(ConfigValidationError::InvalidValue {
            field: "opmode.stop_warning_threshold_ms".to_string(),
            reason: format!(
                "must be at least stop_poll_interval_ms ({})",
                opmode.stop_poll_interval_ms
            ),
        });
    }
}

fn validate_logging(config: &RobotCoreConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {}", config.logging.level, LOG_LEVELS.join(", ")),
        });
    }

    if config.logging.log_dir.is_some() && config.logging.retention_days == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.retention_days".to_string(),
            reason: "must be at least 1 when log_dir is set".to_string(),
        });
    }
}
