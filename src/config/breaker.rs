//! Circuit breaker configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds shared by every handler's circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failures within `window_ms` that open the breaker
    pub failure_threshold: u32,
    /// Sliding window for counting failures
    pub window_ms: u64,
    /// How long an open breaker rejects before allowing a trial
    pub open_duration_ms: u64,
}

impl BreakerConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window_ms: 60_000,
            open_duration_ms: 30_000,
        }
    }
}
