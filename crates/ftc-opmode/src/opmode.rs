// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! OpMode instance and its driver-thread control surface
//!
//! ## Threads
//! - **Driver thread** (the host): calls `internal_init`, `internal_start`,
//!   `internal_stop`, `throw_exception_if_present` and
//!   `new_gamepad_data_available`.
//! - **Worker thread**: one per run, created by `internal_init`, joined by
//!   `internal_stop`. Executes all user code.
//!
//! `internal_stop` is the one synchronous rendezvous between the two: it does
//! not return until the worker has finished, however long that takes.

use crate::context::{OpModeContext, OpModeEnvironment};
use crate::error::{is_interruption, is_missing_dependency, LifecycleError, LifecycleResult, OpModeError, OpModeFault};
use crate::gamepad::Gamepad;
use crate::iterative::{run_iterative, IterativeOpMode};
use crate::linear::{run_linear, LinearOpMode};
use crate::phase::OpModePhase;
use crate::state::OpModeState;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which execution policy an OpMode uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Iterative,
    Linear,
}

impl PolicyKind {
    /// Hook run by `internal_start` after `started` is raised
    fn on_start(self, state: &OpModeState) {
        match self {
            // The worker polls `started` between passes
            Self::Iterative => {}
            Self::Linear => state.lifecycle.notify_all(),
        }
    }

    /// Hook run by `internal_stop` after the stop latch is raised
    fn on_stop_requested(self, state: &OpModeState) {
        match self {
            // Observed at the next pass boundary
            Self::Iterative => {}
            Self::Linear => state.interrupt(),
        }
    }

    fn deliver_gamepads(self, ctx: &OpModeContext, gamepad1: &Gamepad, gamepad2: &Gamepad) {
        match self {
            Self::Iterative => ctx.buffer_gamepads(gamepad1, gamepad2),
            Self::Linear => ctx.apply_gamepads(gamepad1, gamepad2),
        }
    }
}

/// User program plus the policy that executes it
pub enum OpModePolicy {
    Iterative(Box<dyn IterativeOpMode>),
    Linear(Box<dyn LinearOpMode>),
}

impl OpModePolicy {
    pub fn iterative(op_mode: impl IterativeOpMode + 'static) -> Self {
        Self::Iterative(Box::new(op_mode))
    }

    pub fn linear(op_mode: impl LinearOpMode + 'static) -> Self {
        Self::Linear(Box::new(op_mode))
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Iterative(_) => PolicyKind::Iterative,
            Self::Linear(_) => PolicyKind::Linear,
        }
    }

    fn run(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        match self {
            Self::Iterative(op_mode) => run_iterative(op_mode.as_mut(), ctx),
            Self::Linear(op_mode) => run_linear(op_mode.as_mut(), ctx),
        }
    }
}

impl std::fmt::Debug for OpModePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpModePolicy::{:?}", self.kind())
    }
}

/// One user program and its lifecycle
///
/// The instance is reusable: every `internal_init` resets all transient state
/// and starts a fresh worker thread.
pub struct OpMode {
    context: Arc<OpModeContext>,
    policy: Arc<Mutex<OpModePolicy>>,
    kind: PolicyKind,
    worker: Option<JoinHandle<()>>,
}

impl OpMode {
    pub fn new(name: impl Into<String>, policy: OpModePolicy, environment: OpModeEnvironment) -> Self {
        let kind = policy.kind();
        Self {
            context: Arc::new(OpModeContext::new(name.into(), environment)),
            policy: Arc::new(Mutex::new(policy)),
            kind,
            worker: None,
        }
    }

    pub fn iterative(
        name: impl Into<String>,
        op_mode: impl IterativeOpMode + 'static,
        environment: OpModeEnvironment,
    ) -> Self {
        Self::new(name, OpModePolicy::iterative(op_mode), environment)
    }

    pub fn linear(
        name: impl Into<String>,
        op_mode: impl LinearOpMode + 'static,
        environment: OpModeEnvironment,
    ) -> Self {
        Self::new(name, OpModePolicy::linear(op_mode), environment)
    }

    pub fn name(&self) -> &str {
        self.context.name()
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn phase(&self) -> OpModePhase {
        self.context.phase()
    }

    /// The context shared with user code (gamepads, telemetry, queries)
    pub fn context(&self) -> &Arc<OpModeContext> {
        &self.context
    }

    pub fn is_started(&self) -> bool {
        self.context.state.is_started()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.context.state.is_stop_requested()
    }

    pub fn is_worker_finished(&self) -> bool {
        self.context.state.is_worker_finished()
    }

    /// True while a worker thread is attached (between init and stop)
    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// True if a fault is waiting to be replayed
    pub fn has_pending_fault(&self) -> bool {
        self.context.state.has_fault()
    }

    /// INIT: reset transient state and start a fresh worker running the policy
    ///
    /// The worker is submitted but not necessarily running when this returns.
    ///
    /// # Errors
    /// - [`LifecycleError::WorkerStillRunning`] if the previous run was never stopped
    ///   and its worker is still executing
    /// - [`LifecycleError::Spawn`] if the worker thread cannot be created
    pub fn internal_init(&mut self) -> LifecycleResult<()> {
        if let Some(previous) = self.worker.take() {
            if !self.context.state.is_worker_finished() {
                self.worker = Some(previous);
                return Err(LifecycleError::WorkerStillRunning(self.name().to_string()));
            }
            // Finished on its own without a stop; reap it
            if previous.join().is_err() {
                warn!("[OPMODE] '{}' previous worker exited abnormally", self.name());
            }
        }

        self.context.reset_for_init();

        let context = Arc::clone(&self.context);
        let policy = Arc::clone(&self.policy);
        let spawned = thread::Builder::new()
            .name(format!("opmode-{}", self.name()))
            .spawn(move || run_worker(&context, &policy));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!("[OPMODE] '{}' initialized ({:?} policy)", self.name(), self.kind);
                Ok(())
            }
            Err(err) => {
                self.context.state.mark_worker_finished();
                self.context.state.set_phase(OpModePhase::Stopped);
                Err(LifecycleError::Spawn(err))
            }
        }
    }

    /// START: clear the stop latch, raise `started`, then run the policy start hook
    pub fn internal_start(&mut self) {
        let state = &self.context.state;
        state.mark_started();
        if !state.phase().is_terminal() {
            state.set_phase(OpModePhase::Running);
        }
        self.kind.on_start(state);
        info!("[OPMODE] '{}' started", self.name());
    }

    /// STOP: request stop and block until the worker has finished
    ///
    /// Returns at once if no worker is attached, so a second call is a no-op.
    /// The wait never gives up: past the configured warning threshold a
    /// warning is logged and waiting continues.
    pub fn internal_stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        let state = &self.context.state;
        state.set_phase(OpModePhase::Stopping);
        state.request_stop();
        self.kind.on_stop_requested(state);

        self.await_worker_finished();

        if handle.join().is_err() {
            warn!("[OPMODE] '{}' worker exited abnormally", self.name());
        }
        state.set_phase(OpModePhase::Stopped);
        info!("[OPMODE] '{}' stopped", self.name());
    }

    /// Replay a fault captured on the worker, once
    pub fn throw_exception_if_present(&self) -> Result<(), OpModeFault> {
        match self.context.state.take_fault() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    /// Deliver the latest controller state from the Driver Station
    ///
    /// The live gamepad objects are updated in place. The iterative policy
    /// buffers the data until its next callback; the linear policy applies it
    /// immediately.
    pub fn new_gamepad_data_available(&self, gamepad1: &Gamepad, gamepad2: &Gamepad) {
        self.kind.deliver_gamepads(&self.context, gamepad1, gamepad2);
    }

    fn await_worker_finished(&self) {
        let state = &self.context.state;
        let timing = self.context.timing();
        let began = Instant::now();
        let mut warned = false;

        while !state.is_worker_finished() {
            state
                .finished
                .wait_until(timing.stop_poll_interval, || state.is_worker_finished());

            if !warned && !state.is_worker_finished() && began.elapsed() >= timing.stop_warning_threshold {
                warn!(
                    "[OPMODE] '{}' has not stopped after {:?}; still waiting for user code to return",
                    self.name(),
                    began.elapsed()
                );
                warned = true;
            }
        }
        debug!("[OPMODE] '{}' worker drained in {:?}", self.name(), began.elapsed());
    }
}

impl Drop for OpMode {
    fn drop(&mut self) {
        if self.worker.is_some() {
            warn!("[OPMODE] '{}' dropped with a live worker, stopping now", self.name());
            self.internal_stop();
        }
    }
}

impl std::fmt::Debug for OpMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpMode")
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("phase", &self.phase())
            .field("has_worker", &self.has_worker())
            .finish()
    }
}

/// Sets `worker_finished` when dropped, so it is raised even if cleanup unwinds
struct FinishedGuard<'a>(&'a OpModeState);

impl Drop for FinishedGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_worker_finished();
    }
}

/// Worker-thread entry point
fn run_worker(ctx: &OpModeContext, policy: &Mutex<OpModePolicy>) {
    let _finished = FinishedGuard(&ctx.state);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| policy.lock().run(ctx)));
    match outcome {
        Ok(Ok(())) => debug!("[OPMODE] '{}' user code returned", ctx.name()),
        Ok(Err(err)) => capture_user_error(ctx, err),
        Err(payload) => {
            let err = anyhow::Error::new(OpModeError::Panicked(panic_message(payload.as_ref())));
            capture_user_error(ctx, err);
        }
    }

    if panic::catch_unwind(AssertUnwindSafe(|| ctx.flush_final_telemetry())).is_err() {
        warn!("[OPMODE] '{}' telemetry flush panicked during shutdown", ctx.name());
    }
}

fn capture_user_error(ctx: &OpModeContext, err: anyhow::Error) {
    if is_interruption(&err) {
        debug!("[OPMODE] '{}' interrupted; treating as a stop request", ctx.name());
        ctx.request_op_mode_stop();
    } else if is_missing_dependency(&err) {
        warn!("[OPMODE] '{}' missing dependency: {:#}", ctx.name(), err);
        ctx.state.capture_missing_dependency(err);
    } else {
        warn!("[OPMODE] '{}' user code failed: {:#}", ctx.name(), err);
        ctx.state.capture_error(err);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
