// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle listeners

/// Observer of the manager's OpMode transitions
///
/// Called on the driver thread. Only registered OpModes are reported; the
/// built-in idle OpMode is not.
pub trait OpModeManagerNotifier: Send + Sync {
    /// Before `internal_init` of `op_mode`
    fn on_pre_init(&self, _op_mode: &str) {}

    /// Before `internal_start` of `op_mode`
    fn on_pre_start(&self, _op_mode: &str) {}

    /// After `op_mode` has fully stopped
    fn on_post_stop(&self, _op_mode: &str) {}
}
