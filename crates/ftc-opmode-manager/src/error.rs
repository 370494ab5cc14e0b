// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Manager error types

use ftc_opmode::{LifecycleError, OpModeFault};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("No OpMode registered as '{0}'")]
    UnknownOpMode(String),

    #[error("An OpMode named '{0}' is already registered")]
    DuplicateOpMode(String),

    #[error("'{0}' is reserved for the built-in idle OpMode")]
    ReservedName(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// User code failed on the worker thread; replayed once on the driver thread
    #[error("OpMode '{op_mode}' faulted: {source}")]
    Fault {
        op_mode: String,
        #[source]
        source: OpModeFault,
    },
}

pub type ManagerResult<T> = Result<T, ManagerError>;
