// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Iterative (callback-style) OpMode policy
//!
//! The worker drives the callbacks itself:
//!
//! ```text
//! init()                                   once
//! init_loop()  while !started && !stop     each pass followed by a short yield
//! start()      if started                  once
//! run_loop()   while !stop                 each pass followed by a short yield
//! stop()                                   once
//! ```
//!
//! Every callback is bracketed by the pre-user-code hook (refresh `time`,
//! apply buffered gamepad data) and the post-user-code hook (telemetry update).
//! Stop is cooperative: the flag is only observed between passes.

use crate::context::OpModeContext;
use crate::phase::OpModePhase;

/// A callback-style OpMode
pub trait IterativeOpMode: Send {
    /// Called once when INIT is pressed
    fn init(&mut self, ctx: &OpModeContext) -> anyhow::Result<()>;

    /// Called repeatedly after `init` until START or STOP
    fn init_loop(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when START is pressed
    fn start(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called repeatedly after `start` until STOP
    fn run_loop(&mut self, ctx: &OpModeContext) -> anyhow::Result<()>;

    /// Called once when the OpMode is stopped, whether or not it was started
    fn stop(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        Ok(())
    }
}

fn bracketed(
    ctx: &OpModeContext,
    user_code: impl FnOnce(&OpModeContext) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    ctx.pre_user_code();
    user_code(ctx)?;
    ctx.post_user_code();
    Ok(())
}

/// Worker-thread body of the iterative policy
pub(crate) fn run_iterative(
    op_mode: &mut dyn IterativeOpMode,
    ctx: &OpModeContext,
) -> anyhow::Result<()> {
    let state = &ctx.state;

    bracketed(ctx, |ctx| op_mode.init(ctx))?;
    state.advance_phase(OpModePhase::Initializing, OpModePhase::InitLooping);

    while !state.is_started() && !state.is_stop_requested() {
        bracketed(ctx, |ctx| op_mode.init_loop(ctx))?;
        ctx.idle_pass();
    }

    if state.is_started() {
        bracketed(ctx, |ctx| op_mode.start(ctx))?;

        while !state.is_stop_requested() {
            bracketed(ctx, |ctx| op_mode.run_loop(ctx))?;
            ctx.idle_pass();
        }
    }

    bracketed(ctx, |ctx| op_mode.stop(ctx))
}

/// The built-in idle OpMode the host falls back to when nothing else is selected
#[derive(Debug, Default)]
pub struct StopRobotOpMode;

impl StopRobotOpMode {
    pub const NAME: &'static str = "$Stop$Robot$";
}

impl IterativeOpMode for StopRobotOpMode {
    fn init(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn run_loop(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        Ok(())
    }
}
