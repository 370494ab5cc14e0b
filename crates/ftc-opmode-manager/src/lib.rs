// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! # ftc-opmode-manager
//!
//! Registry of named OpModes and the driver-thread manager that inits,
//! starts, stops and ticks them.
//!
//! ```rust,no_run
//! use ftc_config::ManagerConfig;
//! use ftc_opmode::{Gamepad, GamepadUser, OpModeEnvironment, StopRobotOpMode};
//! use ftc_opmode_manager::{OpModeManager, OpModeMeta, OpModeRegistry};
//!
//! let mut registry = OpModeRegistry::new();
//! registry.register_iterative(OpModeMeta::teleop("Idle"), || StopRobotOpMode)?;
//!
//! let mut manager = OpModeManager::new(registry, OpModeEnvironment::default(), &ManagerConfig::default())?;
//! manager.init_op_mode("Idle")?;
//! manager.start_active_op_mode();
//! manager.run_active_op_mode(&Gamepad::new(GamepadUser::One), &Gamepad::new(GamepadUser::Two))?;
//! manager.stop_active_op_mode()?;
//! # Ok::<(), ftc_opmode_manager::ManagerError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod manager;
pub mod notifier;
pub mod registry;

pub use error::{ManagerError, ManagerResult};
pub use manager::OpModeManager;
pub use notifier::OpModeManagerNotifier;
pub use registry::{OpModeFlavor, OpModeMeta, OpModeRegistry};
