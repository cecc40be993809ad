//! # Metrics Collection Module
//!
//! Routing counters, kept twice: as in-process atomics in [`RoutingStats`]
//! (for callers, the CLI and tests) and as `metrics` counters for whatever
//! recorder the host process installs.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `switchboard_decisions_total{decision}` - Decisions by kind
//! - `switchboard_escalation_attempts_total{handler, outcome}` - Handoff attempts per instance or team
//! - `switchboard_fallbacks_total{target, from, to}` - Instance fallbacks
//! - `switchboard_breaker_transitions_total{handler, from, to}` - Breaker state changes
//! - `switchboard_follow_ups_total{target, reason}` - Turns flagged for manual follow-up
//! - `switchboard_no_capacity_total{target}` - Saturated targets
//!
//! **Gauges:**
//! - `switchboard_sessions{instance}` - Live sessions per instance
//! - `switchboard_breakers_open` - Handlers whose breaker is not closed

pub mod types;

pub use types::*;

pub use metrics_exporter_prometheus::PrometheusBuilder;

use crate::breaker::{CircuitBreakers, CircuitState};
use crate::registry::Registry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const DECISIONS_TOTAL: &str = "switchboard_decisions_total";
pub const ESCALATION_ATTEMPTS_TOTAL: &str = "switchboard_escalation_attempts_total";
pub const FALLBACKS_TOTAL: &str = "switchboard_fallbacks_total";
pub const BREAKER_TRANSITIONS_TOTAL: &str = "switchboard_breaker_transitions_total";
pub const FOLLOW_UPS_TOTAL: &str = "switchboard_follow_ups_total";
pub const NO_CAPACITY_TOTAL: &str = "switchboard_no_capacity_total";
pub const SESSIONS_GAUGE: &str = "switchboard_sessions";
pub const BREAKERS_OPEN_GAUGE: &str = "switchboard_breakers_open";

/// How an escalation attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
    Timeout,
    /// Cancelled before an outcome was known
    Indeterminate,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failure => "failure",
            AttemptOutcome::Timeout => "timeout",
            AttemptOutcome::Indeterminate => "indeterminate",
        }
    }
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing counters shared by the router and its breakers.
#[derive(Debug, Default)]
pub struct RoutingStats {
    decisions: AtomicU64,
    continued: AtomicU64,
    escalated: AtomicU64,
    degraded: AtomicU64,
    no_capacity: AtomicU64,
    fallbacks: AtomicU64,
    follow_ups: AtomicU64,
    attempts_success: AtomicU64,
    attempts_failure: AtomicU64,
    attempts_timeout: AtomicU64,
    attempts_indeterminate: AtomicU64,
    breaker_transitions: AtomicU64,
    breaker_opens: AtomicU64,
}

impl RoutingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a final decision by its label (`continue`, `escalate`, ...).
    pub fn record_decision(&self, label: &'static str) {
        self.decisions.fetch_add(1, Ordering::Relaxed);
        let counter = match label {
            "continue" => &self.continued,
            "escalate" => &self.escalated,
            "degraded" => &self.degraded,
            "no_capacity" => &self.no_capacity,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(DECISIONS_TOTAL, "decision" => label).increment(1);
    }

    /// Count an attempt against a handler (agent instance or team).
    pub fn record_attempt(&self, handler: &str, outcome: AttemptOutcome) {
        let counter = match outcome {
            AttemptOutcome::Success => &self.attempts_success,
            AttemptOutcome::Failure => &self.attempts_failure,
            AttemptOutcome::Timeout => &self.attempts_timeout,
            AttemptOutcome::Indeterminate => &self.attempts_indeterminate,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            ESCALATION_ATTEMPTS_TOTAL,
            "handler" => handler.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    pub fn record_fallback(&self, target: &str, from: &str, to: &str) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            FALLBACKS_TOTAL,
            "target" => target.to_string(),
            "from" => from.to_string(),
            "to" => to.to_string()
        )
        .increment(1);
    }

    pub fn record_transition(&self, handler: &str, from: CircuitState, to: CircuitState) {
        self.breaker_transitions.fetch_add(1, Ordering::Relaxed);
        if to == CircuitState::Open {
            self.breaker_opens.fetch_add(1, Ordering::Relaxed);
        }
        metrics::counter!(
            BREAKER_TRANSITIONS_TOTAL,
            "handler" => handler.to_string(),
            "from" => from.to_string(),
            "to" => to.to_string()
        )
        .increment(1);
    }

    pub fn record_follow_up(&self, target: &str, reason: &'static str) {
        self.follow_ups.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            FOLLOW_UPS_TOTAL,
            "target" => target.to_string(),
            "reason" => reason
        )
        .increment(1);
    }

    pub fn record_no_capacity(&self, target: &str) {
        metrics::counter!(NO_CAPACITY_TOTAL, "target" => target.to_string()).increment(1);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            decisions: DecisionStats {
                total: self.decisions.load(Ordering::Relaxed),
                continued: self.continued.load(Ordering::Relaxed),
                escalated: self.escalated.load(Ordering::Relaxed),
                degraded: self.degraded.load(Ordering::Relaxed),
                no_capacity: self.no_capacity.load(Ordering::Relaxed),
            },
            attempts: AttemptStats {
                success: self.attempts_success.load(Ordering::Relaxed),
                failure: self.attempts_failure.load(Ordering::Relaxed),
                timeout: self.attempts_timeout.load(Ordering::Relaxed),
                indeterminate: self.attempts_indeterminate.load(Ordering::Relaxed),
            },
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            follow_ups: self.follow_ups.load(Ordering::Relaxed),
            breaker_transitions: self.breaker_transitions.load(Ordering::Relaxed),
            breaker_opens: self.breaker_opens.load(Ordering::Relaxed),
        }
    }
}

/// Computes gauges from live state and renders Prometheus text.
pub struct MetricsCollector {
    registry: Arc<Registry>,
    breakers: Arc<CircuitBreakers>,
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        registry: Arc<Registry>,
        breakers: Arc<CircuitBreakers>,
        prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            registry,
            breakers,
            prometheus_handle,
        }
    }

    /// Refresh session and breaker gauges.
    ///
    /// Instance ids are used as label values unchanged so they line up with
    /// the `from`/`to` labels of the fallback counter.
    pub fn update_gauges(&self) {
        for agent in self.registry.agents() {
            for instance in &agent.instances {
                let sessions = self.registry.session_count(&instance.id).unwrap_or(0);
                metrics::gauge!(SESSIONS_GAUGE, "instance" => instance.id.clone())
                    .set(sessions as f64);
            }
        }

        let open = self
            .breakers
            .snapshot()
            .iter()
            .filter(|b| b.state != CircuitState::Closed)
            .count();
        metrics::gauge!(BREAKERS_OPEN_GAUGE).set(open as f64);
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.update_gauges();
        self.prometheus_handle.render()
    }
}

/// Install the Prometheus recorder globally.
///
/// Returns a handle that can be used to render metrics.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}
