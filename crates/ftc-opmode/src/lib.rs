// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! # ftc-opmode
//!
//! The OpMode lifecycle state machine: runs a user robot program on a dedicated
//! worker thread while the host's driver thread issues INIT / START / STOP and
//! streams gamepad data in.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │  OpMode (driver-thread control surface)    │  internal_init / start / stop
//! │  OpModePolicy::{Iterative, Linear}         │  selected at construction
//! └────────────────────────────────────────────┘
//!           ↓ Arc<OpModeContext>
//! ┌────────────────────────────────────────────┐
//! │  OpModeContext (user-facing)               │  queries, sleep, gamepads,
//! │                                            │  telemetry, warnings
//! └────────────────────────────────────────────┘
//!           ↓
//! ┌────────────────────────────────────────────┐
//! │  OpModeState                               │  acquire/release flags,
//! │                                            │  fault slots, condvars
//! └────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ftc_opmode::{LinearOpMode, OpMode, OpModeContext, OpModeEnvironment};
//!
//! struct DriveForward;
//!
//! impl LinearOpMode for DriveForward {
//!     fn run_op_mode(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
//!         ctx.wait_for_start()?;
//!         while ctx.op_mode_is_active() {
//!             let forward = -ctx.gamepad1().lock().left_stick.y;
//!             ctx.telemetry().add_data("Forward", forward).update();
//!             ctx.sleep_ms(20)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut op_mode = OpMode::linear("DriveForward", DriveForward, OpModeEnvironment::default());
//! op_mode.internal_init()?;
//! op_mode.internal_start();
//! op_mode.internal_stop();
//! op_mode.throw_exception_if_present()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod context;
pub mod error;
pub mod gamepad;
pub mod iterative;
pub mod linear;
pub mod opmode;
pub mod phase;
mod state;
pub mod telemetry;
pub mod timing;
pub mod warnings;

pub use context::{DetachedServices, OpModeContext, OpModeEnvironment, OpModeServices};
pub use error::{LifecycleError, LifecycleResult, OpModeError, OpModeFault};
pub use gamepad::{Buttons, Gamepad, GamepadEffect, GamepadUser, SharedGamepad, Stick};
pub use iterative::{IterativeOpMode, StopRobotOpMode};
pub use linear::LinearOpMode;
pub use opmode::{OpMode, OpModePolicy, PolicyKind};
pub use phase::OpModePhase;
pub use telemetry::{
    LoggingTelemetrySink, RecordingTelemetrySink, Telemetry, TelemetryLine, TelemetryOptions,
    TelemetryPacket, TelemetrySink,
};
pub use timing::OpModeTiming;
pub use warnings::WarningRegistry;
