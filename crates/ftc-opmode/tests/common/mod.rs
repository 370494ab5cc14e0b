// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for lifecycle integration tests

#![allow(dead_code)]

use ftc_opmode::{OpModeEnvironment, OpModeServices, OpModeTiming, RecordingTelemetrySink, WarningRegistry};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Ordered log of user-code callbacks, shared with the worker
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == event).count()
    }

    pub fn first_index(&self, event: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.first_index(event).is_some()
    }
}

/// Services that count self-stop requests
#[derive(Default)]
pub struct CountingServices {
    pub stop_requests: AtomicUsize,
}

impl CountingServices {
    pub fn count(&self) -> usize {
        self.stop_requests.load(Ordering::Acquire)
    }
}

impl OpModeServices for CountingServices {
    fn request_op_mode_stop(&self, _op_mode: &str) {
        self.stop_requests.fetch_add(1, Ordering::AcqRel);
    }
}

pub struct TestHarness {
    pub environment: OpModeEnvironment,
    pub sink: Arc<RecordingTelemetrySink>,
    pub warnings: Arc<WarningRegistry>,
    pub services: Arc<CountingServices>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_timing(OpModeTiming::default())
    }

    pub fn with_timing(timing: OpModeTiming) -> Self {
        let sink = Arc::new(RecordingTelemetrySink::new());
        let warnings = Arc::new(WarningRegistry::new());
        let services = Arc::new(CountingServices::default());
        let mut environment = OpModeEnvironment::default();
        environment.timing = timing;
        environment.telemetry_sink = sink.clone();
        environment.warnings = warnings.clone();
        environment.services = services.clone();
        Self {
            environment,
            sink,
            warnings,
            services,
        }
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
