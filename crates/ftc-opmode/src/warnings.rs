// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Process-wide warning and error messages shown on the Driver Station
//!
//! One registry is created by the host at startup and shared by reference with
//! every OpMode; there is no static instance.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::thread::{self, ThreadId};
use tracing::{error, warn};

/// Global warning/error registry
#[derive(Debug, Default)]
pub struct WarningRegistry {
    warnings: Mutex<Vec<String>>,
    global_error: Mutex<Option<String>>,
    /// Depth of nested `suppress_new_warnings_while` scopes, per calling thread
    suppression_depth: Mutex<HashMap<ThreadId, usize>>,
}

impl WarningRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. Duplicates and warnings raised by a thread inside
    /// [`WarningRegistry::suppress_new_warnings_while`] are dropped.
    ///
    /// Returns true if the warning was recorded.
    pub fn add_global_warning(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.is_suppressed() {
            return false;
        }
        let mut warnings = self.warnings.lock();
        if warnings.iter().any(|existing| *existing == message) {
            return false;
        }
        warn!("[WARNINGS] {}", message);
        warnings.push(message);
        true
    }

    /// Set the global error message. The first error sticks until cleared.
    ///
    /// Returns true if this call set the message.
    pub fn set_global_error(&self, message: impl Into<String>) -> bool {
        let mut slot = self.global_error.lock();
        if slot.is_some() {
            return false;
        }
        let message = message.into();
        error!("[WARNINGS] {}", message);
        *slot = Some(message);
        true
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    /// Number of recorded warnings containing `needle`
    pub fn count_matching(&self, needle: &str) -> usize {
        self.warnings
            .lock()
            .iter()
            .filter(|warning| warning.contains(needle))
            .count()
    }

    pub fn global_error(&self) -> Option<String> {
        self.global_error.lock().clone()
    }

    pub fn clear_global_warnings(&self) {
        self.warnings.lock().clear();
    }

    pub fn clear_global_error(&self) {
        *self.global_error.lock() = None;
    }

    /// True while the calling thread is inside a suppression scope
    pub fn is_suppressed(&self) -> bool {
        self.suppression_depth
            .lock()
            .contains_key(&thread::current().id())
    }

    /// Run `f` with new warnings from the calling thread suppressed
    ///
    /// Used around end-of-run cleanup so that faults caused purely by tearing
    /// an OpMode down do not show up as fresh warnings. Other threads keep
    /// recording.
    pub fn suppress_new_warnings_while<R>(&self, f: impl FnOnce() -> R) -> R {
        let _scope = SuppressionScope::enter(&self.suppression_depth);
        f()
    }
}

struct SuppressionScope<'a> {
    depths: &'a Mutex<HashMap<ThreadId, usize>>,
    thread: ThreadId,
}

impl<'a> SuppressionScope<'a> {
    fn enter(depths: &'a Mutex<HashMap<ThreadId, usize>>) -> Self {
        let thread = thread::current().id();
        *depths.lock().entry(thread).or_insert(0) += 1;
        Self { depths, thread }
    }
}

impl Drop for SuppressionScope<'_> {
    fn drop(&mut self) {
        let mut depths = self.depths.lock();
        if let Some(depth) = depths.get_mut(&self.thread) {
            *depth -= 1;
            if *depth == 0 {
                depths.remove(&self.thread);
            }
        }
    }
}
