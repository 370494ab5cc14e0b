// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Worker and driver timing knobs

use ftc_config::OpModeConfig;
use std::time::Duration;

/// Timing used by the lifecycle machinery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpModeTiming {
    /// Per-pass yield of the iterative policy (scheduling only, not pacing)
    pub idle_sleep: Duration,
    /// Upper bound on each timed wait inside `internal_stop`
    pub stop_poll_interval: Duration,
    /// After this long in `internal_stop` a warning is logged; the wait continues
    pub stop_warning_threshold: Duration,
}

impl Default for OpModeTiming {
    fn default() -> Self {
        Self::from(&OpModeConfig::default())
    }
}

impl From<&OpModeConfig> for OpModeTiming {
    fn from(config: &OpModeConfig) -> Self {
        Self {
            idle_sleep: Duration::from_millis(config.idle_sleep_ms),
            stop_poll_interval: Duration::from_millis(config.stop_poll_interval_ms.max(1)),
            stop_warning_threshold: Duration::from_millis(config.stop_warning_threshold_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config_defaults() {
        let timing = OpModeTiming::default();
        assert_eq!(timing.idle_sleep, Duration::from_millis(1));
        assert_eq!(timing.stop_poll_interval, Duration::from_millis(5));
        assert_eq!(timing.stop_warning_threshold, Duration::from_millis(900));
    }

    #[test]
    fn test_zero_poll_interval_is_raised() {
        let config = OpModeConfig {
            stop_poll_interval_ms: 0,
            ..OpModeConfig::default()
        };
        assert_eq!(OpModeTiming::from(&config).stop_poll_interval, Duration::from_millis(1));
    }
}
