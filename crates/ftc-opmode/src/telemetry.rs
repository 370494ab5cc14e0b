// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry buffer and transmission
//!
//! User code accumulates caption/value lines and calls [`Telemetry::update`].
//! Transmission is rate limited; an update that arrives too early marks the
//! buffer dirty so the next flush still sends the latest lines. With
//! `auto_clear` the buffer is cleared lazily on the first add after an update,
//! so lines never pile up across loop passes.

use ftc_config::TelemetryConfig;
use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// One telemetry line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryLine {
    Data { caption: String, value: String },
    Text(String),
}

/// What is handed to the host on each transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPacket {
    /// Name of the OpMode that produced the lines
    pub source: String,
    /// Monotonic per-OpMode transmission counter, starting at 1
    pub sequence: u64,
    pub lines: Vec<TelemetryLine>,
}

/// Host-side receiver for telemetry (the Driver Station link)
pub trait TelemetrySink: Send + Sync {
    fn transmit(&self, packet: TelemetryPacket);
}

/// Sink that logs packets at debug level and drops them
#[derive(Debug, Default)]
pub struct LoggingTelemetrySink;

impl TelemetrySink for LoggingTelemetrySink {
    fn transmit(&self, packet: TelemetryPacket) {
        debug!(
            "[TELEMETRY] {} #{}: {} line(s)",
            packet.source,
            packet.sequence,
            packet.lines.len()
        );
    }
}

/// Sink that keeps every packet in memory
#[derive(Debug, Default)]
pub struct RecordingTelemetrySink {
    packets: Mutex<Vec<TelemetryPacket>>,
}

impl RecordingTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> Vec<TelemetryPacket> {
        self.packets.lock().clone()
    }

    pub fn last(&self) -> Option<TelemetryPacket> {
        self.packets.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.lock().is_empty()
    }
}

impl TelemetrySink for RecordingTelemetrySink {
    fn transmit(&self, packet: TelemetryPacket) {
        self.packets.lock().push(packet);
    }
}

/// Telemetry behavior knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryOptions {
    /// Minimum spacing between user-driven transmissions
    pub min_transmission_interval: Duration,
    /// Clear the buffer on the first add after each update
    pub auto_clear: bool,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self::from(&TelemetryConfig::default())
    }
}

impl From<&TelemetryConfig> for TelemetryOptions {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            min_transmission_interval: Duration::from_millis(config.min_transmission_interval_ms),
            auto_clear: config.auto_clear,
        }
    }
}

/// Accumulated telemetry for one OpMode
pub struct Telemetry {
    source: String,
    lines: Vec<TelemetryLine>,
    options: TelemetryOptions,
    sink: Arc<dyn TelemetrySink>,
    last_transmission: Option<Instant>,
    sequence: u64,
    dirty: bool,
    clear_on_add: bool,
}

impl Telemetry {
    pub fn new(source: impl Into<String>, sink: Arc<dyn TelemetrySink>, options: TelemetryOptions) -> Self {
        Self {
            source: source.into(),
            lines: Vec::new(),
            options,
            sink,
            last_transmission: None,
            sequence: 0,
            dirty: false,
            clear_on_add: false,
        }
    }

    /// Add a `caption: value` line
    pub fn add_data(&mut self, caption: impl Into<String>, value: impl Display) -> &mut Self {
        self.prepare_add();
        self.lines.push(TelemetryLine::Data {
            caption: caption.into(),
            value: value.to_string(),
        });
        self
    }

    /// Add a free-form line
    pub fn add_line(&mut self, text: impl Into<String>) -> &mut Self {
        self.prepare_add();
        self.lines.push(TelemetryLine::Text(text.into()));
        self
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.clear_on_add = false;
    }

    pub fn lines(&self) -> &[TelemetryLine] {
        &self.lines
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_auto_clear(&self) -> bool {
        self.options.auto_clear
    }

    pub fn set_auto_clear(&mut self, auto_clear: bool) {
        self.options.auto_clear = auto_clear;
    }

    pub fn set_min_transmission_interval(&mut self, interval: Duration) {
        self.options.min_transmission_interval = interval;
    }

    /// Number of packets transmitted so far
    pub fn transmissions(&self) -> u64 {
        self.sequence
    }

    /// Request transmission of the current lines
    ///
    /// Returns true if a packet was sent now. When the minimum interval has not
    /// elapsed the buffer is marked dirty and sent by the next [`Telemetry::flush`].
    pub fn update(&mut self) -> bool {
        let interval_elapsed = self
            .last_transmission
            .map_or(true, |at| at.elapsed() >= self.options.min_transmission_interval);

        let sent = if interval_elapsed {
            self.transmit();
            true
        } else {
            self.dirty = true;
            false
        };

        if self.options.auto_clear {
            self.clear_on_add = true;
        }
        sent
    }

    /// Send the buffer if an earlier update was deferred, ignoring the rate limit
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.transmit();
        true
    }

    /// Forget everything from a previous run (keeps the sequence counter)
    pub(crate) fn reset(&mut self) {
        self.lines.clear();
        self.dirty = false;
        self.clear_on_add = false;
        self.last_transmission = None;
    }

    fn prepare_add(&mut self) {
        if self.clear_on_add {
            self.lines.clear();
            self.clear_on_add = false;
        }
    }

    fn transmit(&mut self) {
        self.sequence += 1;
        self.last_transmission = Some(Instant::now());
        self.dirty = false;
        self.sink.transmit(TelemetryPacket {
            source: self.source.clone(),
            sequence: self.sequence,
            lines: self.lines.clone(),
        });
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("source", &self.source)
            .field("lines", &self.lines)
            .field("sequence", &self.sequence)
            .field("dirty", &self.dirty)
            .finish()
    }
}
