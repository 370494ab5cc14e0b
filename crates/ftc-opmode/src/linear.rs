// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Linear (blocking) OpMode policy
//!
//! User code is a single `run_op_mode` that blocks in `wait_for_start` and then
//! polls `op_mode_is_active`. Because it may be parked anywhere, stopping it
//! raises the context's forced-unblock latch, which makes `sleep` and
//! `wait_for_start` return [`crate::OpModeError::Interrupted`] at once.
//!
//! Forced unblocking is best effort: code blocked in a call that never looks
//! at the latch stays blocked, and the driver keeps waiting for it.

use crate::context::OpModeContext;
use crate::phase::OpModePhase;

/// A straight-line, blocking OpMode
pub trait LinearOpMode: Send {
    fn run_op_mode(&mut self, ctx: &OpModeContext) -> anyhow::Result<()>;
}

/// Worker-thread body of the linear policy
pub(crate) fn run_linear(
    op_mode: &mut dyn LinearOpMode,
    ctx: &OpModeContext,
) -> anyhow::Result<()> {
    let state = &ctx.state;
    state.advance_phase(OpModePhase::Initializing, OpModePhase::AwaitingStart);

    op_mode.run_op_mode(ctx)?;

    // A stop arriving before the return does not excuse the missed START
    if state.is_started() && !state.was_monitored_for_start() {
        let message = format!(
            "OpMode '{}' returned without ever observing the start signal. Did you forget to call wait_for_start()?",
            ctx.name()
        );
        ctx.warnings().add_global_warning(message);
    }

    ctx.request_op_mode_stop();
    Ok(())
}
