// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! The view of an OpMode that user code sees
//!
//! One [`OpModeContext`] lives for the lifetime of an [`crate::OpMode`] and is
//! shared (via `Arc`) between the driver thread and the worker. User hooks get
//! `&OpModeContext` and use it for every query and for telemetry and gamepads,
//! without touching any synchronization primitive themselves.

use crate::error::OpModeError;
use crate::gamepad::{Gamepad, GamepadUser, SharedGamepad};
use crate::phase::OpModePhase;
use crate::state::OpModeState;
use crate::telemetry::{LoggingTelemetrySink, Telemetry, TelemetryOptions, TelemetrySink};
use crate::timing::OpModeTiming;
use crate::warnings::WarningRegistry;
use ftc_config::RobotCoreConfig;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Services the host offers to a running OpMode
pub trait OpModeServices: Send + Sync {
    /// Ask the host to stop this OpMode. Must not block; the host performs the
    /// stop later on the driver thread.
    fn request_op_mode_stop(&self, op_mode: &str);
}

/// Services for OpModes run without a manager: stop requests are only logged
#[derive(Debug, Default)]
pub struct DetachedServices;

impl OpModeServices for DetachedServices {
    fn request_op_mode_stop(&self, op_mode: &str) {
        debug!("[OPMODE] '{}' requested stop with no host attached", op_mode);
    }
}

/// Everything an OpMode borrows from its host
#[derive(Clone)]
pub struct OpModeEnvironment {
    pub timing: OpModeTiming,
    pub telemetry: TelemetryOptions,
    pub telemetry_sink: Arc<dyn TelemetrySink>,
    pub warnings: Arc<WarningRegistry>,
    pub services: Arc<dyn OpModeServices>,
}

impl Default for OpModeEnvironment {
    fn default() -> Self {
        Self::from_config(&RobotCoreConfig::default())
    }
}

impl OpModeEnvironment {
    /// Timing and telemetry options from `config`; logging sink, a fresh
    /// warning registry and detached services
    pub fn from_config(config: &RobotCoreConfig) -> Self {
        Self {
            timing: OpModeTiming::from(&config.opmode),
            telemetry: TelemetryOptions::from(&config.telemetry),
            telemetry_sink: Arc::new(LoggingTelemetrySink),
            warnings: Arc::new(WarningRegistry::new()),
            services: Arc::new(DetachedServices),
        }
    }
}

/// Gamepad data received while user code was running (iterative policy)
#[derive(Default)]
struct PendingGamepads {
    gamepad1: Option<Gamepad>,
    gamepad2: Option<Gamepad>,
}

/// User-facing handle to a running OpMode
pub struct OpModeContext {
    name: String,
    pub(crate) state: OpModeState,
    timing: OpModeTiming,

    gamepad1: SharedGamepad,
    gamepad2: SharedGamepad,
    pending_gamepads: Mutex<PendingGamepads>,

    telemetry: Mutex<Telemetry>,
    warnings: Arc<WarningRegistry>,
    services: Arc<dyn OpModeServices>,

    runtime_origin: Mutex<Instant>,
    /// `runtime()` captured at the last pre-user-code boundary, as f64 bits
    time_bits: AtomicU64,
}

impl OpModeContext {
    pub(crate) fn new(name: String, environment: OpModeEnvironment) -> Self {
        let telemetry = Telemetry::new(
            name.clone(),
            environment.telemetry_sink,
            environment.telemetry,
        );
        Self {
            name,
            state: OpModeState::new(),
            timing: environment.timing,
            gamepad1: Gamepad::new(GamepadUser::One).shared(),
            gamepad2: Gamepad::new(GamepadUser::Two).shared(),
            pending_gamepads: Mutex::new(PendingGamepads::default()),
            telemetry: Mutex::new(telemetry),
            warnings: environment.warnings,
            services: environment.services,
            runtime_origin: Mutex::new(Instant::now()),
            time_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> OpModePhase {
        self.state.phase()
    }

    pub fn timing(&self) -> &OpModeTiming {
        &self.timing
    }

    // ------------------------------------------------------------------
    // Lifecycle queries
    // ------------------------------------------------------------------

    /// True once the driver has pressed START
    ///
    /// The first `true` observed here marks the OpMode as having monitored
    /// for start, which silences the forgotten-`wait_for_start` warning.
    pub fn is_started(&self) -> bool {
        let started = self.state.is_started();
        if started {
            self.state.mark_monitored_for_start();
        }
        started
    }

    pub fn is_stop_requested(&self) -> bool {
        self.state.is_stop_requested()
    }

    /// `started && !stop_requested`; yields the worker's time slice when true
    /// so tight polling loops do not starve other threads
    pub fn op_mode_is_active(&self) -> bool {
        let active = !self.is_stop_requested() && self.is_started();
        if active {
            self.idle();
        }
        active
    }

    /// `!started && !stop_requested`, for init-time polling loops
    pub fn op_mode_in_init(&self) -> bool {
        !self.state.is_started() && !self.state.is_stop_requested()
    }

    /// True once the host has forcibly unblocked this run
    pub fn is_interrupted(&self) -> bool {
        self.state.is_interrupted()
    }

    /// Ask the host to stop this OpMode. Returns immediately.
    pub fn request_op_mode_stop(&self) {
        self.services.request_op_mode_stop(&self.name);
    }

    // ------------------------------------------------------------------
    // Blocking helpers
    // ------------------------------------------------------------------

    /// Give up the rest of the current time slice
    pub fn idle(&self) {
        thread::yield_now();
    }

    /// Sleep for `duration`, returning early with [`OpModeError::Interrupted`]
    /// if the host forcibly unblocks this run
    pub fn sleep(&self, duration: Duration) -> Result<(), OpModeError> {
        let state = &self.state;
        if state.lifecycle.wait_until(duration, || state.is_interrupted()) {
            return Err(OpModeError::Interrupted);
        }
        Ok(())
    }

    pub fn sleep_ms(&self, millis: u64) -> Result<(), OpModeError> {
        self.sleep(Duration::from_millis(millis))
    }

    /// Block until START is pressed
    ///
    /// Returns `Ok` when started, or when a stop arrives during init.
    /// Returns [`OpModeError::Interrupted`] if forcibly unblocked before start.
    pub fn wait_for_start(&self) -> Result<(), OpModeError> {
        let state = &self.state;
        state.lifecycle.wait(|| {
            state.is_started() || state.is_stop_requested() || state.is_interrupted()
        });

        if self.is_started() {
            return Ok(());
        }
        if state.is_interrupted() {
            return Err(OpModeError::Interrupted);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Seconds since init or the last `reset_runtime`
    pub fn runtime(&self) -> f64 {
        self.runtime_origin.lock().elapsed().as_secs_f64()
    }

    pub fn reset_runtime(&self) {
        *self.runtime_origin.lock() = Instant::now();
    }

    /// `runtime()` as of the start of the current callback (iterative policy)
    pub fn time(&self) -> f64 {
        f64::from_bits(self.time_bits.load(Ordering::Acquire))
    }

    // ------------------------------------------------------------------
    // Gamepads, telemetry, warnings
    // ------------------------------------------------------------------

    pub fn gamepad1(&self) -> &SharedGamepad {
        &self.gamepad1
    }

    pub fn gamepad2(&self) -> &SharedGamepad {
        &self.gamepad2
    }

    pub fn telemetry(&self) -> MutexGuard<'_, Telemetry> {
        self.telemetry.lock()
    }

    pub fn warnings(&self) -> &WarningRegistry {
        &self.warnings
    }

    // ------------------------------------------------------------------
    // Runtime internals
    // ------------------------------------------------------------------

    pub(crate) fn reset_for_init(&self) {
        self.state.reset_for_init();
        self.reset_runtime();
        self.time_bits.store(0f64.to_bits(), Ordering::Release);
        *self.pending_gamepads.lock() = PendingGamepads::default();
        self.telemetry.lock().reset();
    }

    /// Refresh the clock and apply gamepad data buffered since the last pass
    pub(crate) fn pre_user_code(&self) {
        self.time_bits
            .store(self.runtime().to_bits(), Ordering::Release);

        let pending = std::mem::take(&mut *self.pending_gamepads.lock());
        if let Some(gamepad) = pending.gamepad1 {
            self.gamepad1.lock().copy_from(&gamepad);
        }
        if let Some(gamepad) = pending.gamepad2 {
            self.gamepad2.lock().copy_from(&gamepad);
        }
    }

    pub(crate) fn post_user_code(&self) {
        self.telemetry.lock().update();
    }

    /// Buffer gamepad data until the next pre-user-code boundary
    pub(crate) fn buffer_gamepads(&self, gamepad1: &Gamepad, gamepad2: &Gamepad) {
        let mut pending = self.pending_gamepads.lock();
        pending.gamepad1 = Some(gamepad1.clone());
        pending.gamepad2 = Some(gamepad2.clone());
    }

    /// Copy gamepad data into the live objects right away
    pub(crate) fn apply_gamepads(&self, gamepad1: &Gamepad, gamepad2: &Gamepad) {
        self.gamepad1.lock().copy_from(gamepad1);
        self.gamepad2.lock().copy_from(gamepad2);
    }

    /// End-of-run flush; warnings raised by the flush itself are suppressed
    pub(crate) fn flush_final_telemetry(&self) {
        self.warnings
            .suppress_new_warnings_while(|| self.telemetry.lock().flush());
    }

    /// Iterative policy per-pass yield; returns early once stop is requested
    pub(crate) fn idle_pass(&self) {
        let state = &self.state;
        state
            .lifecycle
            .wait_until(self.timing.idle_sleep, || state.is_stop_requested());
    }
}

impl std::fmt::Debug for OpModeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpModeContext")
            .field("name", &self.name)
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::Buttons;
    use std::sync::Arc;

    fn context() -> Arc<OpModeContext> {
        Arc::new(OpModeContext::new(
            "ContextTest".to_string(),
            OpModeEnvironment::default(),
        ))
    }

    #[test]
    fn test_queries_before_start() {
        let ctx = context();
        ctx.reset_for_init();
        assert!(ctx.op_mode_in_init());
        assert!(!ctx.op_mode_is_active());
        assert!(!ctx.is_started());
    }

    #[test]
    fn test_is_started_marks_monitored() {
        let ctx = context();
        ctx.reset_for_init();
        ctx.state.mark_started();
        assert!(!ctx.state.was_monitored_for_start());
        assert!(ctx.op_mode_is_active());
        assert!(ctx.state.was_monitored_for_start());
        assert!(!ctx.op_mode_in_init());
    }

    #[test]
    fn test_sleep_returns_interrupted_when_latched() {
        let ctx = context();
        ctx.reset_for_init();
        ctx.state.interrupt();
        let start = Instant::now();
        assert!(matches!(
            ctx.sleep(Duration::from_secs(60)),
            Err(OpModeError::Interrupted)
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_completes_without_interrupt() {
        let ctx = context();
        ctx.reset_for_init();
        let start = Instant::now();
        ctx.sleep_ms(20).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_for_start_wakes_on_start_signal() {
        let ctx = context();
        ctx.reset_for_init();
        let waiter = {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || ctx.wait_for_start())
        };

        thread::sleep(Duration::from_millis(20));
        ctx.state.mark_started();
        ctx.state.lifecycle.notify_all();

        assert!(waiter.join().unwrap().is_ok());
        assert!(ctx.state.was_monitored_for_start());
    }

    #[test]
    fn test_wait_for_start_interrupted() {
        let ctx = context();
        ctx.reset_for_init();
        let waiter = {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || ctx.wait_for_start())
        };

        thread::sleep(Duration::from_millis(20));
        ctx.state.request_stop();
        ctx.state.interrupt();

        assert!(matches!(
            waiter.join().unwrap(),
            Err(OpModeError::Interrupted)
        ));
    }

    #[test]
    fn test_buffered_gamepads_applied_at_boundary() {
        let ctx = context();
        let before = Arc::clone(ctx.gamepad1());

        let mut incoming = Gamepad::new(GamepadUser::One);
        incoming.set_button(Buttons::B, true);
        ctx.buffer_gamepads(&incoming, &Gamepad::new(GamepadUser::Two));
        assert!(!ctx.gamepad1().lock().is_pressed(Buttons::B));

        ctx.pre_user_code();
        assert!(ctx.gamepad1().lock().is_pressed(Buttons::B));
        assert!(Arc::ptr_eq(&before, ctx.gamepad1()));
    }

    #[test]
    fn test_environment_from_config() {
        let mut config = RobotCoreConfig::default();
        config.opmode.stop_warning_threshold_ms = 1500;
        config.telemetry.auto_clear = false;

        let environment = OpModeEnvironment::from_config(&config);
        assert_eq!(
            environment.timing.stop_warning_threshold,
            Duration::from_millis(1500)
        );
        assert!(!environment.telemetry.auto_clear);
    }

    #[test]
    fn test_reset_runtime() {
        let ctx = context();
        thread::sleep(Duration::from_millis(20));
        assert!(ctx.runtime() >= 0.02);
        ctx.reset_runtime();
        assert!(ctx.runtime() < 0.02);
    }

    #[test]
    fn test_time_refreshed_by_pre_user_code() {
        let ctx = context();
        assert_eq!(ctx.time(), 0.0);
        thread::sleep(Duration::from_millis(5));
        ctx.pre_user_code();
        assert!(ctx.time() > 0.0);
    }
}
