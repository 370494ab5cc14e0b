// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! OpMode lifecycle phase

use std::fmt;

/// Lifecycle phase of an OpMode instance
///
/// ```text
/// Uninitialized → Initializing → InitLooping (iterative) ─┐
///                              → AwaitingStart (linear) ──┴→ Running → Stopping → Stopped
/// ```
///
/// Stored as a `u8` inside an atomic so either thread can read it without a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpModePhase {
    Uninitialized = 0,
    Initializing = 1,
    InitLooping = 2,
    AwaitingStart = 3,
    Running = 4,
    Stopping = 5,
    Stopped = 6,
}

impl OpModePhase {
    /// Decode a phase previously stored with `as u8`
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Initializing,
            2 => Self::InitLooping,
            3 => Self::AwaitingStart,
            4 => Self::Running,
            5 => Self::Stopping,
            6 => Self::Stopped,
            _ => Self::Uninitialized,
        }
    }

    /// True between `internal_init` and the start signal
    pub fn is_init(self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::InitLooping | Self::AwaitingStart
        )
    }

    /// True once the worker has been told to stop (or has stopped)
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Initializing => "INITIALIZING",
            Self::InitLooping => "INIT_LOOPING",
            Self::AwaitingStart => "AWAITING_START",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for OpModePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
