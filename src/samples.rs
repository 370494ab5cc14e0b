// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sample OpModes
//!
//! A tank-drive TeleOp (iterative) and a timed autonomous (linear) that hands
//! off to it. There is no hardware layer here: motor powers are reported
//! through telemetry only.

use crate::opmode::{Buttons, IterativeOpMode, LinearOpMode, OpModeContext};
use std::time::Duration;

/// Name under which [`TankDrive`] is registered by [`register_samples`]
pub const TANK_DRIVE: &str = "TankDrive";
/// Name under which [`TimedAutonomous`] is registered by [`register_samples`]
pub const TIMED_AUTONOMOUS: &str = "TimedAutonomous";

/// Stick dead zone applied to drive inputs
const DEAD_ZONE: f32 = 0.05;
/// Power scale while slow mode (B) is held
const SLOW_MODE_SCALE: f64 = 0.4;

fn shape(input: f32) -> f64 {
    if input.abs() < DEAD_ZONE {
        0.0
    } else {
        f64::from(input)
    }
}

/// Left/right motor powers for tank drive (sticks push forward = negative y)
pub fn tank_powers(left_y: f32, right_y: f32, slow_mode: bool) -> (f64, f64) {
    let scale = if slow_mode { SLOW_MODE_SCALE } else { 1.0 };
    (-shape(left_y) * scale, -shape(right_y) * scale)
}

/// Iterative TeleOp: each stick drives one side; holding B drops to 40% power
#[derive(Debug, Default)]
pub struct TankDrive {
    loops: u64,
}

impl IterativeOpMode for TankDrive {
    fn init(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        self.loops = 0;
        ctx.telemetry().add_data("Status", "Initialized");
        Ok(())
    }

    fn init_loop(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        ctx.telemetry()
            .add_data("Status", "Waiting for start")
            .add_data("Elapsed", format!("{:.1}s", ctx.time()));
        Ok(())
    }

    fn start(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        ctx.reset_runtime();
        Ok(())
    }

    fn run_loop(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        self.loops += 1;
        let (left, right) = {
            let gamepad = ctx.gamepad1().lock();
            tank_powers(
                gamepad.left_stick.y,
                gamepad.right_stick.y,
                gamepad.is_pressed(Buttons::B),
            )
        };

        ctx.telemetry()
            .add_data("Left", format!("{:.2}", left))
            .add_data("Right", format!("{:.2}", right))
            .add_data("Loops", self.loops);
        Ok(())
    }

    fn stop(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        ctx.telemetry().add_data("Status", "Stopped").add_data("Loops", self.loops);
        Ok(())
    }
}

/// Linear autonomous: drive forward for a fixed time, then finish
#[derive(Debug)]
pub struct TimedAutonomous {
    pub drive_time: Duration,
    pub step: Duration,
}

impl Default for TimedAutonomous {
    fn default() -> Self {
        Self {
            drive_time: Duration::from_millis(1500),
            step: Duration::from_millis(50),
        }
    }
}

impl LinearOpMode for TimedAutonomous {
    fn run_op_mode(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        ctx.telemetry().add_data("Status", "Ready").update();
        ctx.wait_for_start()?;
        ctx.reset_runtime();

        let drive_secs = self.drive_time.as_secs_f64();
        while ctx.op_mode_is_active() && ctx.runtime() < drive_secs {
            ctx.telemetry()
                .add_data("Path", "Driving forward")
                .add_data("Power", "0.50")
                .add_data("Remaining", format!("{:.2}s", drive_secs - ctx.runtime()))
                .update();
            ctx.sleep(self.step)?;
        }

        ctx.telemetry().add_data("Path", "Complete").update();
        Ok(())
    }
}

/// Register both samples; the autonomous transitions to the TeleOp
#[cfg(feature = "manager")]
pub fn register_samples(
    registry: &mut crate::manager::OpModeRegistry,
) -> crate::manager::ManagerResult<()> {
    use crate::manager::OpModeMeta;

    registry.register_iterative(
        OpModeMeta::teleop(TANK_DRIVE).with_group("Samples"),
        TankDrive::default,
    )?;
    registry.register_linear(
        OpModeMeta::autonomous(TIMED_AUTONOMOUS)
            .with_group("Samples")
            .with_transition_target(TANK_DRIVE),
        TimedAutonomous::default,
    )?;
    Ok(())
}
