// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Driver Station simulator.
//!
//! Registers the sample OpModes, then plays one match against them: INIT,
//! START after a short init period (and again for an OpMode brought in by an
//! autonomous transition), a scripted gamepad input on every driver tick, and
//! STOP when the match time runs out. Telemetry packets are logged.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ftc_robotcore::config::{load_config_or_default, validate_config};
use ftc_robotcore::manager::{OpModeManager, OpModeRegistry};
use ftc_robotcore::observability::{debug_flags_help, init_logging, parse_debug_flags};
use ftc_robotcore::opmode::{
    Buttons, Gamepad, GamepadUser, OpModeEnvironment, Stick, TelemetryPacket, TelemetrySink,
};
use ftc_robotcore::samples::{register_samples, TIMED_AUTONOMOUS};
use tracing::{error, info};

/// Driver tick period
const TICK: Duration = Duration::from_millis(20);

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: opmode_sim [--opmode <name>] [--init-ms <ms>] [--match-ms <ms>] [--config <path>]\n\
         \x20                 [--set <key>=<value>]... [--debug-<crate>]...\n\n\
         Defaults:\n\
         - opmode: {TIMED_AUTONOMOUS}\n\
         - init-ms: 500\n\
         - match-ms: 5000\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(2);
}

struct Args {
    op_mode: String,
    init_time: Duration,
    match_time: Duration,
    config_path: Option<PathBuf>,
    overrides: HashMap<String, String>,
}

fn parse_millis(value: Option<String>) -> Duration {
    let value = value.unwrap_or_else(|| usage_and_exit());
    match value.parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            eprintln!("Not a number of milliseconds: {value}");
            usage_and_exit();
        }
    }
}

fn parse_args() -> Args {
    let mut parsed = Args {
        op_mode: TIMED_AUTONOMOUS.to_string(),
        init_time: Duration::from_millis(500),
        match_time: Duration::from_millis(5000),
        config_path: None,
        overrides: HashMap::new(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--opmode" => parsed.op_mode = args.next().unwrap_or_else(|| usage_and_exit()),
            "--init-ms" => parsed.init_time = parse_millis(args.next()),
            "--match-ms" => parsed.match_time = parse_millis(args.next()),
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.config_path = Some(PathBuf::from(v));
            }
            "--set" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                let Some((key, value)) = v.split_once('=') else {
                    eprintln!("Expected key=value, got: {v}");
                    usage_and_exit();
                };
                parsed.overrides.insert(key.to_string(), value.to_string());
            }
            "-h" | "--help" => usage_and_exit(),
            // Consumed by parse_debug_flags
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

/// Logs each telemetry packet at info level
struct ConsoleTelemetry;

impl TelemetrySink for ConsoleTelemetry {
    fn transmit(&self, packet: TelemetryPacket) {
        let lines = packet
            .lines
            .iter()
            .map(|line| format!("{line:?}"))
            .collect::<Vec<_>>()
            .join(" | ");
        info!("[TELEMETRY] {} #{}: {}", packet.source, packet.sequence, lines);
    }
}

/// Scripted driver input: a slow figure of eight with B pulsed every second
fn scripted_gamepad(elapsed: Duration) -> Gamepad {
    let t = elapsed.as_secs_f32();
    let mut gamepad = Gamepad::new(GamepadUser::One);
    gamepad.timestamp_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    gamepad.left_stick = Stick::new(0.0, -(t * 0.8).sin());
    gamepad.right_stick = Stick::new(0.0, -(t * 0.8).cos());
    gamepad.set_button(Buttons::B, elapsed.as_millis() % 1000 < 200);
    gamepad
}

/// True when a registered OpMode is active that has not been sent START yet
fn needs_start(manager: &OpModeManager, last_started: Option<&str>) -> bool {
    !manager.is_idle() && last_started != Some(manager.active_op_mode_name())
}

fn run() -> Result<()> {
    let args = parse_args();
    let config = load_config_or_default(args.config_path.as_deref(), Some(&args.overrides))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    let _logging = init_logging(&parse_debug_flags(), &config.logging)?;

    let mut registry = OpModeRegistry::new();
    register_samples(&mut registry)?;
    for meta in registry.list() {
        info!("[SIM] available: {} / {} / {}", meta.flavor, meta.group, meta.name);
    }

    let mut environment = OpModeEnvironment::from_config(&config);
    environment.telemetry_sink = Arc::new(ConsoleTelemetry);
    let mut manager = OpModeManager::new(registry, environment, &config.manager)?;

    manager.init_op_mode(&args.op_mode)?;
    let began = Instant::now();
    let idle_pad2 = Gamepad::new(GamepadUser::Two);
    // OpMode that last received START; a transition brings in a new one
    let mut started: Option<String> = None;

    while began.elapsed() < args.init_time + args.match_time {
        if began.elapsed() >= args.init_time && needs_start(&manager, started.as_deref()) {
            let active = manager.active_op_mode_name().to_string();
            info!("[SIM] START ({})", active);
            manager.start_active_op_mode();
            started = Some(active);
        }

        let gamepad1 = scripted_gamepad(began.elapsed());
        if let Err(err) = manager.run_active_op_mode(&gamepad1, &idle_pad2) {
            error!("[SIM] {err}");
        }
        thread::sleep(TICK);
    }

    info!("[SIM] STOP ({})", manager.active_op_mode_name());
    manager.stop_active_op_mode()?;
    // An autonomous may have transitioned; stop whatever replaced it
    manager.stop_active_op_mode()?;

    if let Some(global) = manager.warnings().global_error() {
        error!("[SIM] global error: {global}");
    }
    for warning in manager.warnings().warnings() {
        info!("[SIM] warning: {warning}");
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("opmode_sim failed: {err:#}");
        process::exit(1);
    }
}
