// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Driver-thread OpMode manager
//!
//! Owns exactly one active [`OpMode`] at a time. When no registered OpMode is
//! selected the built-in [`StopRobotOpMode`] runs, initialised and started, so
//! the host always has something to tick.
//!
//! Every control call here runs on the driver thread. Requests coming from a
//! worker (`request_op_mode_stop`) only raise a flag, which the next
//! [`OpModeManager::run_active_op_mode`] tick services.

use crate::error::{ManagerError, ManagerResult};
use crate::notifier::OpModeManagerNotifier;
use crate::registry::{OpModeFlavor, OpModeMeta, OpModeRegistry};
use ftc_config::ManagerConfig;
use ftc_opmode::{
    Gamepad, OpMode, OpModeContext, OpModeEnvironment, OpModePhase, OpModePolicy, OpModeServices,
    StopRobotOpMode, WarningRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Per-OpMode services: a self-stop request only sets a flag
#[derive(Debug, Default)]
struct SelfStopRequest {
    requested: AtomicBool,
}

impl SelfStopRequest {
    fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }
}

impl OpModeServices for SelfStopRequest {
    fn request_op_mode_stop(&self, op_mode: &str) {
        if !self.requested.swap(true, Ordering::AcqRel) {
            debug!("[OPMODE-MANAGER] '{}' requested its own stop", op_mode);
        }
    }
}

struct ActiveOpMode {
    op_mode: OpMode,
    /// `None` for the built-in idle OpMode
    meta: Option<OpModeMeta>,
    stop_request: Arc<SelfStopRequest>,
}

impl ActiveOpMode {
    fn launch(
        environment: &OpModeEnvironment,
        name: &str,
        meta: Option<OpModeMeta>,
        policy: OpModePolicy,
    ) -> ManagerResult<Self> {
        let stop_request = Arc::new(SelfStopRequest::default());
        let mut environment = environment.clone();
        environment.services = stop_request.clone();

        let mut op_mode = OpMode::new(name, policy, environment);
        op_mode.internal_init()?;
        Ok(Self {
            op_mode,
            meta,
            stop_request,
        })
    }

    fn idle(environment: &OpModeEnvironment) -> ManagerResult<Self> {
        let mut active = Self::launch(
            environment,
            StopRobotOpMode::NAME,
            None,
            OpModePolicy::iterative(StopRobotOpMode),
        )?;
        active.op_mode.internal_start();
        Ok(active)
    }
}

/// Host-side owner of the active OpMode
pub struct OpModeManager {
    registry: OpModeRegistry,
    environment: OpModeEnvironment,
    auto_transition: bool,
    active: ActiveOpMode,
    listeners: Vec<Arc<dyn OpModeManagerNotifier>>,
}

impl OpModeManager {
    /// Create a manager running the idle OpMode
    ///
    /// `environment.services` is replaced per OpMode; everything else is
    /// shared by every OpMode the manager runs.
    pub fn new(
        registry: OpModeRegistry,
        environment: OpModeEnvironment,
        config: &ManagerConfig,
    ) -> ManagerResult<Self> {
        let active = ActiveOpMode::idle(&environment)?;
        info!(
            "[OPMODE-MANAGER] ready with {} registered OpMode(s)",
            registry.len()
        );
        Ok(Self {
            registry,
            environment,
            auto_transition: config.auto_transition,
            active,
            listeners: Vec::new(),
        })
    }

    pub fn registry(&self) -> &OpModeRegistry {
        &self.registry
    }

    pub fn warnings(&self) -> &WarningRegistry {
        &self.environment.warnings
    }

    pub fn active_op_mode_name(&self) -> &str {
        self.active.op_mode.name()
    }

    /// Metadata of the active OpMode; `None` while idle
    pub fn active_meta(&self) -> Option<&OpModeMeta> {
        self.active.meta.as_ref()
    }

    pub fn active_phase(&self) -> OpModePhase {
        self.active.op_mode.phase()
    }

    pub fn active_context(&self) -> &Arc<OpModeContext> {
        self.active.op_mode.context()
    }

    /// True while the built-in idle OpMode is active
    pub fn is_idle(&self) -> bool {
        self.active.meta.is_none()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn OpModeManagerNotifier>) {
        self.listeners.push(listener);
    }

    /// Returns false if `listener` was not registered
    pub fn remove_listener(&mut self, listener: &Arc<dyn OpModeManagerNotifier>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    /// INIT `name`, stopping whatever is active first
    ///
    /// A fault left behind by the previous OpMode is logged and recorded as
    /// the global error, but does not prevent the new INIT. Passing the idle
    /// OpMode's name is the same as [`OpModeManager::stop_active_op_mode`].
    pub fn init_op_mode(&mut self, name: &str) -> ManagerResult<()> {
        if name == StopRobotOpMode::NAME {
            return self.stop_active_op_mode();
        }

        let (meta, policy) = self.registry.instantiate(name)?;
        if let Some(fault) = self.shutdown_active() {
            debug!(
                "[OPMODE-MANAGER] continuing INIT of '{}' after fault: {}",
                name, fault
            );
        }

        for listener in &self.listeners {
            listener.on_pre_init(name);
        }

        match ActiveOpMode::launch(&self.environment, name, Some(meta), policy) {
            Ok(active) => {
                self.active = active;
                info!("[OPMODE-MANAGER] '{}' initialized", name);
                Ok(())
            }
            Err(err) => {
                warn!("[OPMODE-MANAGER] '{}' failed to initialize: {}", name, err);
                self.active = ActiveOpMode::idle(&self.environment)?;
                Err(err)
            }
        }
    }

    /// START the active OpMode; a no-op while idle or already started
    pub fn start_active_op_mode(&mut self) {
        if self.is_idle() {
            debug!("[OPMODE-MANAGER] start ignored: no OpMode initialized");
            return;
        }
        if self.active.op_mode.is_started() {
            return;
        }

        let name = self.active.op_mode.name();
        for listener in &self.listeners {
            listener.on_pre_start(name);
        }
        self.active.op_mode.internal_start();
    }

    /// STOP the active OpMode and fall back to the idle OpMode
    ///
    /// If the stopped OpMode was autonomous and names a registered transition
    /// target, that target is initialised next (when auto-transition is on).
    ///
    /// # Errors
    /// [`ManagerError::Fault`] if user code failed during the run; the stop and
    /// transition still happen.
    pub fn stop_active_op_mode(&mut self) -> ManagerResult<()> {
        if self.is_idle() {
            return Ok(());
        }

        let stopped_meta = self.active.meta.clone();
        let fault = self.shutdown_active();
        self.active = ActiveOpMode::idle(&self.environment)?;

        if let Some(target) = self.transition_target(stopped_meta.as_ref()) {
            info!("[OPMODE-MANAGER] transitioning to '{}'", target);
            if let Err(err) = self.init_op_mode(&target) {
                warn!("[OPMODE-MANAGER] transition to '{}' failed: {}", target, err);
                if fault.is_none() {
                    return Err(err);
                }
            }
        }

        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Periodic driver tick
    ///
    /// Forwards the latest gamepad state, then stops the active OpMode if its
    /// user code faulted or it asked to be stopped.
    ///
    /// # Errors
    /// [`ManagerError::Fault`] exactly once per captured fault.
    pub fn run_active_op_mode(&mut self, gamepad1: &Gamepad, gamepad2: &Gamepad) -> ManagerResult<()> {
        let active = &self.active;
        active.op_mode.new_gamepad_data_available(gamepad1, gamepad2);

        if active.op_mode.has_pending_fault() {
            return self.stop_active_op_mode();
        }
        if active.stop_request.take() {
            info!(
                "[OPMODE-MANAGER] servicing stop request from '{}'",
                active.op_mode.name()
            );
            return self.stop_active_op_mode();
        }
        Ok(())
    }

    /// Stop the active OpMode in place and replay its fault, if any
    fn shutdown_active(&mut self) -> Option<ManagerError> {
        self.active.op_mode.internal_stop();
        let fault = self.active.op_mode.throw_exception_if_present().err();
        let name = self.active.op_mode.name().to_string();

        let fault = fault.map(|fault| {
            error!("[OPMODE-MANAGER] '{}' user code failed: {}", name, fault);
            self.environment
                .warnings
                .set_global_error(format!("OpMode '{}': {}", name, fault));
            ManagerError::Fault {
                op_mode: name.clone(),
                source: fault,
            }
        });

        if self.active.meta.is_some() {
            for listener in &self.listeners {
                listener.on_post_stop(&name);
            }
            info!("[OPMODE-MANAGER] '{}' stopped", name);
        }
        fault
    }

    fn transition_target(&self, stopped: Option<&OpModeMeta>) -> Option<String> {
        let meta = stopped?;
        if !self.auto_transition || meta.flavor != OpModeFlavor::Autonomous {
            return None;
        }
        let target = meta.transition_target.as_ref()?;
        if !self.registry.contains(target) {
            warn!(
                "[OPMODE-MANAGER] '{}' names unknown transition target '{}'",
                meta.name, target
            );
            return None;
        }
        Some(target.clone())
    }
}

impl std::fmt::Debug for OpModeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpModeManager")
            .field("active", &self.active_op_mode_name())
            .field("phase", &self.active_phase())
            .field("auto_transition", &self.auto_transition)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
