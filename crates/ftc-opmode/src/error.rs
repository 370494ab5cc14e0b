// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! OpMode error types
//!
//! Three families, by the thread that sees them:
//! - [`OpModeError`]: raised inside user code on the worker thread
//! - [`OpModeFault`]: a captured worker fault replayed on the driver thread
//! - [`LifecycleError`]: misuse of the driver-thread control surface

use thiserror::Error;

/// Errors raised by the OpMode runtime into user code (or by user code itself)
///
/// User hooks return `anyhow::Result<()>`, so any of these propagate through `?`
/// and are classified by the worker when the hook returns.
#[derive(Error, Debug)]
pub enum OpModeError {
    /// A blocking runtime call (`sleep`, `wait_for_start`) was forcibly unblocked.
    /// Treated as a normal stop signal, never as a fault.
    #[error("OpMode interrupted")]
    Interrupted,

    /// An optional dependency the OpMode needs is not available
    #[error("Missing dependency: {name}")]
    MissingDependency { name: String },

    /// User code panicked on the worker thread
    #[error("User code panicked: {0}")]
    Panicked(String),

    /// Any other error raised by user code
    #[error(transparent)]
    User(#[from] anyhow::Error),
}

impl OpModeError {
    /// Create a missing dependency error
    pub fn missing_dependency(name: impl Into<String>) -> Self {
        Self::MissingDependency { name: name.into() }
    }
}

/// Returns true if the error (or anything in its cause chain) is a cooperative interruption
pub fn is_interruption(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<OpModeError>(),
            Some(OpModeError::Interrupted)
        )
    })
}

/// Returns true if the error (or anything in its cause chain) is a missing dependency
pub fn is_missing_dependency(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<OpModeError>(),
            Some(OpModeError::MissingDependency { .. })
        )
    })
}

/// A fault captured on the worker thread, replayed on the driver thread
#[derive(Error, Debug)]
pub enum OpModeFault {
    /// User code returned an error or panicked
    #[error("User code threw an uncaught exception: {0:#}")]
    Runtime(anyhow::Error),

    /// User code needed something that could not be loaded
    #[error("User code failed to load a dependency: {0:#}")]
    MissingDependency(anyhow::Error),
}

impl OpModeFault {
    /// The underlying error raised by user code
    pub fn source_error(&self) -> &anyhow::Error {
        match self {
            Self::Runtime(err) | Self::MissingDependency(err) => err,
        }
    }
}

/// Errors from the driver-thread control surface
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// `internal_init` was called while the previous worker is still executing
    #[error("OpMode '{0}' still has a live worker thread; call internal_stop first")]
    WorkerStillRunning(String),

    /// The OS refused to create the worker thread
    #[error("Failed to spawn OpMode worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for driver-thread lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
