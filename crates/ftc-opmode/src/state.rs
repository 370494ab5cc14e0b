// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-thread OpMode state
//!
//! Flags are single-writer per field: the driver thread writes `started` and
//! `stop_requested`, the worker writes `worker_finished` and the fault slots.
//! Reads never take a lock. The two [`Signal`]s exist only so waiters can park
//! instead of spinning.

use crate::error::OpModeFault;
use crate::phase::OpModePhase;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Condition variable paired with an empty mutex
///
/// Notifiers publish their change through an atomic first, then call
/// [`Signal::notify_all`], which takes the lock so a waiter that checked the
/// predicate under the lock cannot miss the wakeup.
#[derive(Default)]
pub(crate) struct Signal {
    lock: Mutex<()>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn notify_all(&self) {
        let _guard = self.lock.lock();
        self.cond.notify_all();
    }

    /// Park until `done()` holds or `timeout` elapses. Returns the final value of `done()`.
    pub(crate) fn wait_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        loop {
            if done() {
                return true;
            }
            if self.cond.wait_until(&mut guard, deadline).timed_out() {
                return done();
            }
        }
    }

    /// Park until `done()` holds, with no timeout
    pub(crate) fn wait(&self, mut done: impl FnMut() -> bool) {
        let mut guard = self.lock.lock();
        while !done() {
            self.cond.wait(&mut guard);
        }
    }
}

/// Authoritative lifecycle flags for one OpMode instance
pub(crate) struct OpModeState {
    started: AtomicBool,
    stop_requested: AtomicBool,
    worker_finished: AtomicBool,
    /// Forced-unblock latch (linear policy); cleared only at init
    interrupted: AtomicBool,
    /// Set the first time user code observes `started == true`
    monitored_for_start: AtomicBool,
    phase: AtomicU8,

    captured_error: Mutex<Option<anyhow::Error>>,
    captured_missing_dependency: Mutex<Option<anyhow::Error>>,

    /// Wakes sleeps and `wait_for_start` on start, stop and interrupt
    pub(crate) lifecycle: Signal,
    /// Wakes the driver's drain wait when the worker finishes
    pub(crate) finished: Signal,
}

impl OpModeState {
    pub(crate) fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            // No worker yet, so nothing is running
            worker_finished: AtomicBool::new(true),
            interrupted: AtomicBool::new(false),
            monitored_for_start: AtomicBool::new(false),
            phase: AtomicU8::new(OpModePhase::Uninitialized as u8),
            captured_error: Mutex::new(None),
            captured_missing_dependency: Mutex::new(None),
            lifecycle: Signal::default(),
            finished: Signal::default(),
        }
    }

    /// Reset every transient field ahead of a new run (driver thread, no worker attached)
    pub(crate) fn reset_for_init(&self) {
        *self.captured_error.lock() = None;
        *self.captured_missing_dependency.lock() = None;
        self.started.store(false, Ordering::Release);
        self.stop_requested.store(false, Ordering::Release);
        self.interrupted.store(false, Ordering::Release);
        self.monitored_for_start.store(false, Ordering::Release);
        self.worker_finished.store(false, Ordering::Release);
        self.set_phase(OpModePhase::Initializing);
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub(crate) fn is_worker_finished(&self) -> bool {
        self.worker_finished.load(Ordering::Acquire)
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    pub(crate) fn was_monitored_for_start(&self) -> bool {
        self.monitored_for_start.load(Ordering::Acquire)
    }

    pub(crate) fn mark_monitored_for_start(&self) {
        self.monitored_for_start.store(true, Ordering::Release);
    }

    /// Start transition: clear the stop latch, then raise `started`.
    /// Waiters are woken by the policy's start hook, not here.
    pub(crate) fn mark_started(&self) {
        self.stop_requested.store(false, Ordering::Release);
        self.started.store(true, Ordering::Release);
    }

    /// Raise the stop latch. Idempotent.
    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.lifecycle.notify_all();
    }

    /// Raise the forced-unblock latch. Idempotent.
    pub(crate) fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
        self.lifecycle.notify_all();
    }

    /// Final act of every worker run
    pub(crate) fn mark_worker_finished(&self) {
        self.worker_finished.store(true, Ordering::Release);
        self.finished.notify_all();
    }

    pub(crate) fn phase(&self) -> OpModePhase {
        OpModePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: OpModePhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Move `from → to` only if no other transition happened in between
    pub(crate) fn advance_phase(&self, from: OpModePhase, to: OpModePhase) -> bool {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Capture a runtime fault. First fault wins; later ones are dropped.
    pub(crate) fn capture_error(&self, err: anyhow::Error) -> bool {
        let mut slot = self.captured_error.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    /// Capture a missing-dependency fault. First fault wins.
    pub(crate) fn capture_missing_dependency(&self, err: anyhow::Error) -> bool {
        let mut slot = self.captured_missing_dependency.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    /// Take the next captured fault, runtime faults first
    pub(crate) fn take_fault(&self) -> Option<OpModeFault> {
        if let Some(err) = self.captured_error.lock().take() {
            return Some(OpModeFault::Runtime(err));
        }
        self.captured_missing_dependency
            .lock()
            .take()
            .map(OpModeFault::MissingDependency)
    }

    pub(crate) fn has_fault(&self) -> bool {
        self.captured_error.lock().is_some() || self.captured_missing_dependency.lock().is_some()
    }
}
