// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! # ftc-observability
//!
//! Logging setup shared by the FTC RobotCore binaries, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: rolling log files under `logging.log_dir`

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known workspace crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "ftc-opmode",
    "ftc-opmode-manager",
    "ftc-config",
    "ftc-observability",
];

/// Tracing target for a crate name (`ftc-opmode` -> `ftc_opmode`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
