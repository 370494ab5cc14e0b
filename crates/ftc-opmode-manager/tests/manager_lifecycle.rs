// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Manager integration tests: registry, listeners, fault replay, self-stop
//! and autonomous-to-teleop transitions

use ftc_config::ManagerConfig;
use ftc_opmode::{
    Buttons, Gamepad, GamepadUser, IterativeOpMode, LinearOpMode, OpModeContext,
    OpModeEnvironment, OpModeFault, OpModePhase, StopRobotOpMode,
};
use ftc_opmode_manager::{
    ManagerError, OpModeManager, OpModeManagerNotifier, OpModeMeta, OpModeRegistry,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl OpModeManagerNotifier for RecordingNotifier {
    fn on_pre_init(&self, op_mode: &str) {
        self.events.lock().push(format!("pre_init:{}", op_mode));
    }

    fn on_pre_start(&self, op_mode: &str) {
        self.events.lock().push(format!("pre_start:{}", op_mode));
    }

    fn on_post_stop(&self, op_mode: &str) {
        self.events.lock().push(format!("post_stop:{}", op_mode));
    }
}

struct Drive;

impl IterativeOpMode for Drive {
    fn init(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn run_loop(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        let forward = -ctx.gamepad1().lock().left_stick.y;
        ctx.telemetry().add_data("Forward", forward);
        Ok(())
    }
}

struct Faulty;

impl IterativeOpMode for Faulty {
    fn init(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn run_loop(&mut self, _ctx: &OpModeContext) -> anyhow::Result<()> {
        anyhow::bail!("boom")
    }
}

/// Autonomous that finishes on its own right after START
struct ShortAuto;

impl LinearOpMode for ShortAuto {
    fn run_op_mode(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
        ctx.wait_for_start()?;
        ctx.sleep_ms(10)?;
        Ok(())
    }
}

fn registry() -> OpModeRegistry {
    let mut registry = OpModeRegistry::new();
    registry
        .register_iterative(OpModeMeta::teleop("Drive").with_group("Competition"), || Drive)
        .unwrap();
    registry
        .register_iterative(OpModeMeta::teleop("Faulty"), || Faulty)
        .unwrap();
    registry
        .register_linear(
            OpModeMeta::autonomous("ShortAuto")
                .with_group("Competition")
                .with_transition_target("Drive"),
            || ShortAuto,
        )
        .unwrap();
    registry
}

fn manager_with(config: &ManagerConfig) -> OpModeManager {
    OpModeManager::new(registry(), OpModeEnvironment::default(), config).unwrap()
}

fn manager() -> OpModeManager {
    manager_with(&ManagerConfig::default())
}

fn idle_gamepads() -> (Gamepad, Gamepad) {
    (Gamepad::new(GamepadUser::One), Gamepad::new(GamepadUser::Two))
}

/// Tick until `done` or a tick returns an error
fn tick_until(
    manager: &mut OpModeManager,
    timeout: Duration,
    mut done: impl FnMut(&OpModeManager) -> bool,
) -> Result<bool, ManagerError> {
    let (gamepad1, gamepad2) = idle_gamepads();
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        manager.run_active_op_mode(&gamepad1, &gamepad2)?;
        if done(manager) {
            return Ok(true);
        }
        thread::sleep(Duration::from_millis(5));
    }
    Ok(done(manager))
}

#[test]
fn test_init_start_stop_notifies_in_order() {
    let mut manager = manager();
    let notifier = Arc::new(RecordingNotifier::default());
    manager.add_listener(notifier.clone());

    manager.init_op_mode("Drive").unwrap();
    assert_eq!(manager.active_op_mode_name(), "Drive");
    assert!(!manager.is_idle());

    manager.start_active_op_mode();
    assert_eq!(manager.active_phase(), OpModePhase::Running);

    manager.stop_active_op_mode().unwrap();
    assert!(manager.is_idle());
    assert_eq!(manager.active_op_mode_name(), StopRobotOpMode::NAME);

    assert_eq!(
        notifier.events(),
        vec!["pre_init:Drive", "pre_start:Drive", "post_stop:Drive"]
    );
}

#[test]
fn test_start_twice_notifies_once() {
    let mut manager = manager();
    let notifier = Arc::new(RecordingNotifier::default());
    manager.add_listener(notifier.clone());

    manager.init_op_mode("Drive").unwrap();
    manager.start_active_op_mode();
    manager.start_active_op_mode();
    manager.stop_active_op_mode().unwrap();

    let starts = notifier
        .events()
        .iter()
        .filter(|e| e.starts_with("pre_start"))
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn test_stop_while_idle_is_a_no_op() {
    let mut manager = manager();
    let notifier = Arc::new(RecordingNotifier::default());
    manager.add_listener(notifier.clone());

    manager.stop_active_op_mode().unwrap();
    manager.start_active_op_mode();

    assert!(manager.is_idle());
    assert!(notifier.events().is_empty());
}

#[test]
fn test_init_replaces_active_op_mode() {
    let mut manager = manager_with(&ManagerConfig {
        auto_transition: false,
    });
    let notifier = Arc::new(RecordingNotifier::default());
    manager.add_listener(notifier.clone());

    manager.init_op_mode("ShortAuto").unwrap();
    manager.init_op_mode("Drive").unwrap();

    assert_eq!(manager.active_op_mode_name(), "Drive");
    assert_eq!(
        notifier.events(),
        vec!["pre_init:ShortAuto", "post_stop:ShortAuto", "pre_init:Drive"]
    );
    manager.stop_active_op_mode().unwrap();
}

#[test]
fn test_init_stop_robot_name_returns_to_idle() {
    let mut manager = manager();
    manager.init_op_mode("Drive").unwrap();
    manager.init_op_mode(StopRobotOpMode::NAME).unwrap();
    assert!(manager.is_idle());
}

#[test]
fn test_unknown_op_mode_keeps_active() {
    let mut manager = manager();
    manager.init_op_mode("Drive").unwrap();

    assert!(matches!(
        manager.init_op_mode("Missing"),
        Err(ManagerError::UnknownOpMode(_))
    ));
    assert_eq!(manager.active_op_mode_name(), "Drive");
    manager.stop_active_op_mode().unwrap();
}

#[test]
fn test_fault_replayed_exactly_once_then_idle() {
    let mut manager = manager();
    manager.init_op_mode("Faulty").unwrap();
    manager.start_active_op_mode();

    let outcome = tick_until(&mut manager, Duration::from_secs(2), |m| m.is_idle());
    match outcome {
        Err(ManagerError::Fault { op_mode, source }) => {
            assert_eq!(op_mode, "Faulty");
            assert!(matches!(source, OpModeFault::Runtime(_)));
        }
        other => panic!("expected a replayed fault, got {:?}", other),
    }

    assert!(manager.is_idle());
    let global = manager.warnings().global_error().unwrap();
    assert!(global.contains("Faulty"));
    assert!(global.contains("boom"));

    // Nothing left to replay
    let (gamepad1, gamepad2) = idle_gamepads();
    manager.run_active_op_mode(&gamepad1, &gamepad2).unwrap();
    manager.stop_active_op_mode().unwrap();
}

#[test]
fn test_init_over_faulted_op_mode_records_fault_and_proceeds() {
    let mut manager = manager();
    manager.init_op_mode("Faulty").unwrap();
    manager.start_active_op_mode();
    // Let run_loop fail before any tick can replay it
    thread::sleep(Duration::from_millis(100));

    manager.init_op_mode("Drive").unwrap();

    assert_eq!(manager.active_op_mode_name(), "Drive");
    let global = manager.warnings().global_error().unwrap();
    assert!(global.contains("Faulty"));
    // Consumed by the INIT, so no tick replays it later
    let (gamepad1, gamepad2) = idle_gamepads();
    manager.run_active_op_mode(&gamepad1, &gamepad2).unwrap();
    manager.stop_active_op_mode().unwrap();
}

#[test]
fn test_self_stop_serviced_on_next_tick_with_transition() {
    let mut manager = manager();
    let notifier = Arc::new(RecordingNotifier::default());
    manager.add_listener(notifier.clone());

    manager.init_op_mode("ShortAuto").unwrap();
    manager.start_active_op_mode();

    // The worker finishing does not by itself change the active OpMode
    thread::sleep(Duration::from_millis(100));
    assert_eq!(manager.active_op_mode_name(), "ShortAuto");

    let transitioned = tick_until(&mut manager, Duration::from_secs(2), |m| {
        m.active_op_mode_name() == "Drive"
    })
    .unwrap();
    assert!(transitioned);
    assert!(matches!(
        manager.active_phase(),
        OpModePhase::Initializing | OpModePhase::InitLooping
    ));
    assert_eq!(
        notifier.events(),
        vec![
            "pre_init:ShortAuto",
            "pre_start:ShortAuto",
            "post_stop:ShortAuto",
            "pre_init:Drive"
        ]
    );
    manager.stop_active_op_mode().unwrap();
}

#[test]
fn test_no_transition_when_disabled() {
    let mut manager = manager_with(&ManagerConfig {
        auto_transition: false,
    });
    manager.init_op_mode("ShortAuto").unwrap();
    manager.start_active_op_mode();

    assert!(tick_until(&mut manager, Duration::from_secs(2), |m| m.is_idle()).unwrap());
    assert_eq!(manager.active_op_mode_name(), StopRobotOpMode::NAME);
}

#[test]
fn test_teleop_never_transitions() {
    let mut manager = manager();
    manager.init_op_mode("Drive").unwrap();
    manager.start_active_op_mode();
    manager.stop_active_op_mode().unwrap();
    assert!(manager.is_idle());
}

#[test]
fn test_gamepads_forwarded_by_tick() {
    struct Watcher {
        saw_x: Arc<AtomicBool>,
    }

    impl LinearOpMode for Watcher {
        fn run_op_mode(&mut self, ctx: &OpModeContext) -> anyhow::Result<()> {
            ctx.wait_for_start()?;
            while ctx.op_mode_is_active() {
                if ctx.gamepad2().lock().is_pressed(Buttons::X) {
                    self.saw_x.store(true, Ordering::Release);
                }
                ctx.sleep_ms(2)?;
            }
            Ok(())
        }
    }

    let saw_x = Arc::new(AtomicBool::new(false));
    let mut registry = OpModeRegistry::new();
    let flag = saw_x.clone();
    registry
        .register_linear(OpModeMeta::teleop("Watcher"), move || Watcher {
            saw_x: flag.clone(),
        })
        .unwrap();
    let mut manager =
        OpModeManager::new(registry, OpModeEnvironment::default(), &ManagerConfig::default())
            .unwrap();

    manager.init_op_mode("Watcher").unwrap();
    manager.start_active_op_mode();

    let gamepad1 = Gamepad::new(GamepadUser::One);
    let mut gamepad2 = Gamepad::new(GamepadUser::Two);
    gamepad2.set_button(Buttons::X, true);

    let deadline = Instant::now() + Duration::from_secs(2);
    while !saw_x.load(Ordering::Acquire) && Instant::now() < deadline {
        manager.run_active_op_mode(&gamepad1, &gamepad2).unwrap();
        thread::sleep(Duration::from_millis(5));
    }
    assert!(saw_x.load(Ordering::Acquire));
    manager.stop_active_op_mode().unwrap();
}

#[test]
fn test_removed_listener_not_notified() {
    let mut manager = manager();
    let kept = Arc::new(RecordingNotifier::default());
    let removed = Arc::new(RecordingNotifier::default());
    let removed_dyn: Arc<dyn OpModeManagerNotifier> = removed.clone();
    manager.add_listener(kept.clone());
    manager.add_listener(removed_dyn.clone());

    assert!(manager.remove_listener(&removed_dyn));
    assert!(!manager.remove_listener(&removed_dyn));

    manager.init_op_mode("Drive").unwrap();
    manager.stop_active_op_mode().unwrap();

    assert_eq!(kept.events().len(), 2);
    assert!(removed.events().is_empty());
}
