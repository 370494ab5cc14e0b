// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! OpMode registry
//!
//! Maps names to factories that build a fresh user program for every INIT.
//! The registry is filled once at startup and handed to the
//! [`crate::OpModeManager`].

use crate::error::{ManagerError, ManagerResult};
use ftc_opmode::{IterativeOpMode, LinearOpMode, OpModePolicy, StopRobotOpMode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// How the Driver Station lists an OpMode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpModeFlavor {
    Autonomous,
    TeleOp,
    System,
}

impl fmt::Display for OpModeFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Autonomous => "Autonomous",
            Self::TeleOp => "TeleOp",
            Self::System => "System",
        };
        f.write_str(label)
    }
}

/// Registration metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpModeMeta {
    pub name: String,
    pub group: String,
    pub flavor: OpModeFlavor,
    /// OpMode to initialise automatically after this one stops (autonomous only)
    pub transition_target: Option<String>,
}

impl OpModeMeta {
    pub const DEFAULT_GROUP: &'static str = "default";

    pub fn new(name: impl Into<String>, flavor: OpModeFlavor) -> Self {
        Self {
            name: name.into(),
            group: Self::DEFAULT_GROUP.to_string(),
            flavor,
            transition_target: None,
        }
    }

    pub fn autonomous(name: impl Into<String>) -> Self {
        Self::new(name, OpModeFlavor::Autonomous)
    }

    pub fn teleop(name: impl Into<String>) -> Self {
        Self::new(name, OpModeFlavor::TeleOp)
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_transition_target(mut self, target: impl Into<String>) -> Self {
        self.transition_target = Some(target.into());
        self
    }
}

type PolicyFactory = Arc<dyn Fn() -> OpModePolicy + Send + Sync>;

struct Registration {
    meta: OpModeMeta,
    factory: PolicyFactory,
}

/// Named OpMode factories
#[derive(Default)]
pub struct OpModeRegistry {
    entries: HashMap<String, Registration>,
}

impl OpModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory producing a fresh policy on every INIT
    ///
    /// # Errors
    /// - [`ManagerError::ReservedName`] for the built-in idle OpMode's name
    /// - [`ManagerError::DuplicateOpMode`] if the name is already taken
    pub fn register<F>(&mut self, meta: OpModeMeta, factory: F) -> ManagerResult<()>
    where
        F: Fn() -> OpModePolicy + Send + Sync + 'static,
    {
        if meta.name == StopRobotOpMode::NAME {
            return Err(ManagerError::ReservedName(meta.name));
        }
        if self.entries.contains_key(&meta.name) {
            return Err(ManagerError::DuplicateOpMode(meta.name));
        }

        debug!(
            "[OPMODE-MANAGER] registered {} OpMode '{}' (group '{}')",
            meta.flavor, meta.name, meta.group
        );
        self.entries.insert(
            meta.name.clone(),
            Registration {
                meta,
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    pub fn register_iterative<F, T>(&mut self, meta: OpModeMeta, factory: F) -> ManagerResult<()>
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: IterativeOpMode + 'static,
    {
        self.register(meta, move || OpModePolicy::iterative(factory()))
    }

    pub fn register_linear<F, T>(&mut self, meta: OpModeMeta, factory: F) -> ManagerResult<()>
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: LinearOpMode + 'static,
    {
        self.register(meta, move || OpModePolicy::linear(factory()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn meta(&self, name: &str) -> Option<&OpModeMeta> {
        self.entries.get(name).map(|entry| &entry.meta)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registrations, ordered by flavor, then group, then name
    pub fn list(&self) -> Vec<&OpModeMeta> {
        let mut metas: Vec<&OpModeMeta> = self.entries.values().map(|entry| &entry.meta).collect();
        metas.sort_by(|a, b| {
            a.flavor
                .cmp(&b.flavor)
                .then_with(|| a.group.cmp(&b.group))
                .then_with(|| a.name.cmp(&b.name))
        });
        metas
    }

    /// Build a fresh policy for `name`
    pub(crate) fn instantiate(&self, name: &str) -> ManagerResult<(OpModeMeta, OpModePolicy)> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ManagerError::UnknownOpMode(name.to_string()))?;
        Ok((entry.meta.clone(), (entry.factory)()))
    }
}

impl fmt::Debug for OpModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpModeRegistry")
            .field("op_modes", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftc_opmode::{OpModeContext, PolicyKind};

    struct Noop;

    impl IterativeOpMode for Noop {
        fn init(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
            Ok(())
        }

        fn run_loop(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl LinearOpMode for Noop {
        fn run_op_mode(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = OpModeRegistry::new();
        registry
            .register_iterative(OpModeMeta::teleop("Drive"), || Noop)
            .unwrap();

        let result = registry.register_linear(OpModeMeta::autonomous("Drive"), || Noop);
        assert!(matches!(result, Err(ManagerError::DuplicateOpMode(name)) if name == "Drive"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.meta("Drive").unwrap().flavor, OpModeFlavor::TeleOp);
    }

    #[test]
    fn test_reserved_name_rejected() {
        let mut registry = OpModeRegistry::new();
        let result = registry.register_iterative(OpModeMeta::teleop(StopRobotOpMode::NAME), || Noop);
        assert!(matches!(result, Err(ManagerError::ReservedName(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_sorted_by_flavor_group_name() {
        let mut registry = OpModeRegistry::new();
        registry
            .register_iterative(OpModeMeta::teleop("Zeta").with_group("b"), || Noop)
            .unwrap();
        registry
            .register_iterative(OpModeMeta::teleop("Alpha").with_group("b"), || Noop)
            .unwrap();
        registry
            .register_linear(OpModeMeta::autonomous("Yellow").with_group("z"), || Noop)
            .unwrap();
        registry
            .register_iterative(OpModeMeta::teleop("Omega").with_group("a"), || Noop)
            .unwrap();

        let names: Vec<&str> = registry.list().iter().map(|meta| meta.name.as_str()).collect();
        assert_eq!(names, vec!["Yellow", "Omega", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_instantiate_builds_matching_policy() {
        let mut registry = OpModeRegistry::new();
        registry
            .register_linear(OpModeMeta::autonomous("Auto").with_transition_target("Drive"), || Noop)
            .unwrap();

        let (meta, policy) = registry.instantiate("Auto").unwrap();
        assert_eq!(policy.kind(), PolicyKind::Linear);
        assert_eq!(meta.transition_target.as_deref(), Some("Drive"));

        assert!(matches!(
            registry.instantiate("Missing"),
            Err(ManagerError::UnknownOpMode(name)) if name == "Missing"
        ));
    }
}
