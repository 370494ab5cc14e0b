// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! # FTC RobotCore
//!
//! Runs user robot programs ("OpModes") on a dedicated worker thread while the
//! host's driver thread controls INIT, START and STOP and streams in gamepad
//! data.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! ftc-robotcore = "0.1"  # Default: core + manager + logging setup
//! ```
//!
//! ## Feature Flags
//! - **`manager`** (default): OpMode registry and driver-thread manager
//! - **`observability`** (default): logging init and per-crate debug flags
//! - **`file-logging`**: rolling log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ftc_robotcore::prelude::*;
//! use ftc_robotcore::samples::TankDrive;
//!
//! let mut op_mode = OpMode::iterative("TankDrive", TankDrive::default(), OpModeEnvironment::default());
//! op_mode.internal_init()?;
//! op_mode.internal_start();
//! op_mode.internal_stop();
//! op_mode.throw_exception_if_present()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use ftc_config as config;
pub use ftc_opmode as opmode;

#[cfg(feature = "manager")]
pub use ftc_opmode_manager as manager;

#[cfg(feature = "observability")]
pub use ftc_observability as observability;

pub mod samples;

pub mod prelude {
    pub use crate::config::{load_config_or_default, validate_config, RobotCoreConfig};
    pub use crate::opmode::{
        Buttons, Gamepad, GamepadUser, IterativeOpMode, LinearOpMode, OpMode, OpModeContext,
        OpModeEnvironment, OpModeError, OpModeFault, OpModePhase, Telemetry, TelemetrySink,
        WarningRegistry,
    };

    #[cfg(feature = "manager")]
    pub use crate::manager::{ManagerError, OpModeManager, OpModeMeta, OpModeRegistry};
}
