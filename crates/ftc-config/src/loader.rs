// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers winning:
//! 1. TOML file (base values, defaults for anything missing)
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, RobotCoreConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for on disk
pub const CONFIG_FILE_NAME: &str = "ftc_robotcore.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "FTC_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `FTC_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file, then apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns an error if the file is not found, cannot be read, or is not valid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<RobotCoreConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: RobotCoreConfig = toml::from_str(&content)?;

    apply_overrides(&mut config, cli_args);
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults (with overrides)
///
/// Read and parse errors are still reported.
pub fn load_config_or_default(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<RobotCoreConfig> {
    match load_config(config_path, cli_args) {
        Err(ConfigError::FileNotFound(_)) => {
            let mut config = RobotCoreConfig::default();
            apply_overrides(&mut config, cli_args);
            Ok(config)
        }
        other => other,
    }
}

fn apply_overrides(config: &mut RobotCoreConfig, cli_args: Option<&HashMap<String, String>>) {
    apply_environment_overrides(config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(config, cli);
    }
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `FTC_IDLE_SLEEP_MS` -> `opmode.idle_sleep_ms`
/// - `FTC_STOP_POLL_INTERVAL_MS` -> `opmode.stop_poll_interval_ms`
/// - `FTC_STOP_WARNING_THRESHOLD_MS` -> `opmode.stop_warning_threshold_ms`
/// - `FTC_TELEMETRY_INTERVAL_MS` -> `telemetry.min_transmission_interval_ms`
/// - `FTC_AUTO_TRANSITION` -> `manager.auto_transition`
/// - `FTC_LOG_LEVEL` -> `logging.level`
/// - `FTC_LOG_DIR` -> `logging.log_dir`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut RobotCoreConfig) {
    if let Some(ms) = env_u64("FTC_IDLE_SLEEP_MS") {
        config.opmode.idle_sleep_ms = ms;
    }
    if let Some(ms) = env_u64("FTC_STOP_POLL_INTERVAL_MS") {
        config.opmode.stop_poll_interval_ms = ms;
    }
    if let Some(ms) = env_u64("FTC_STOP_WARNING_THRESHOLD_MS") {
        config.opmode.stop_warning_threshold_ms = ms;
    }
    if let Some(ms) = env_u64("FTC_TELEMETRY_INTERVAL_MS") {
        config.telemetry.min_transmission_interval_ms = ms;
    }
    if let Ok(value) = env::var("FTC_AUTO_TRANSITION") {
        config.manager.auto_transition = parse_bool(&value);
    }
    if let Ok(value) = env::var("FTC_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("FTC_LOG_DIR") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"stop_poll_interval_ms": "10"}`)
pub fn apply_cli_overrides(config: &mut RobotCoreConfig, cli_args: &HashMap<String, String>) {
    let u64_arg = |key: &str| cli_args.get(key).and_then(|value| value.parse::<u64>().ok());

    if let Some(ms) = u64_arg("idle_sleep_ms") {
        config.opmode.idle_sleep_ms = ms;
    }
    if let Some(ms) = u64_arg("stop_poll_interval_ms") {
        config.opmode.stop_poll_interval_ms = ms;
    }
    if let Some(ms) = u64_arg("stop_warning_threshold_ms") {
        config.opmode.stop_warning_threshold_ms = ms;
    }
    if let Some(ms) = u64_arg("telemetry_interval_ms") {
        config.telemetry.min_transmission_interval_ms = ms;
    }
    if let Some(value) = cli_args.get("auto_clear") {
        config.telemetry.auto_clear = parse_bool(value);
    }
    if let Some(value) = cli_args.get("auto_transition") {
        config.manager.auto_transition = parse_bool(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}
