//! Circuit breakers keyed by handler.
//!
//! A handler is an agent instance or an external team. Each handler gets its
//! own [`CircuitBreakerState`], created on the first attempt against it.
//! Every attempt is represented by an [`AttemptGuard`]; a guard dropped
//! without an outcome counts as indeterminate.

mod state;

pub use state::*;

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::metrics::{AttemptOutcome, RoutingStats};

/// Point-in-time view of one handler's breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub handler: String,
    pub state: CircuitState,
    /// Failures inside the sliding window
    pub failures: usize,
    pub trial_in_flight: bool,
}

/// All circuit breakers owned by one router.
#[derive(Debug)]
pub struct CircuitBreakers {
    config: BreakerConfig,
    states: DashMap<String, CircuitBreakerState>,
    stats: Arc<RoutingStats>,
}

impl CircuitBreakers {
    pub fn new(config: BreakerConfig, stats: Arc<RoutingStats>) -> Self {
        Self {
            config,
            states: DashMap::new(),
            stats,
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Whether the handler would accept an attempt right now.
    ///
    /// Handlers never attempted are available and get no state entry.
    pub fn is_available(&self, handler: &str) -> bool {
        match self.states.get_mut(handler) {
            Some(mut state) => {
                if let Some(transition) = state.refresh(Instant::now(), &self.config) {
                    self.report(handler, transition);
                }
                state.is_available()
            }
            None => true,
        }
    }

    /// Current state of a handler's breaker.
    pub fn state(&self, handler: &str) -> CircuitState {
        match self.states.get_mut(handler) {
            Some(mut state) => {
                if let Some(transition) = state.refresh(Instant::now(), &self.config) {
                    self.report(handler, transition);
                }
                state.status()
            }
            None => CircuitState::Closed,
        }
    }

    /// Start an attempt against a handler.
    ///
    /// Returns `None` when the breaker is open or its half-open trial is
    /// already taken.
    pub fn begin(&self, handler: &str) -> Option<AttemptGuard<'_>> {
        let mut state = self.states.entry(handler.to_string()).or_default();
        if let Some(transition) = state.refresh(Instant::now(), &self.config) {
            self.report(handler, transition);
        }
        let kind = state.try_begin()?;

        if kind == AttemptKind::Trial {
            tracing::info!(handler = %handler, "Starting half-open trial");
        }

        Some(AttemptGuard {
            breakers: self,
            handler: handler.to_string(),
            kind,
            resolved: false,
        })
    }

    /// Breaker state for every handler attempted so far, sorted by handler.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let now = Instant::now();
        let mut snapshots: Vec<BreakerSnapshot> = self
            .states
            .iter_mut()
            .map(|mut entry| {
                if let Some(transition) = entry.refresh(now, &self.config) {
                    self.report(entry.key(), transition);
                }
                BreakerSnapshot {
                    handler: entry.key().clone(),
                    state: entry.status(),
                    failures: entry.failure_count(now, &self.config),
                    trial_in_flight: entry.trial_in_flight(),
                }
            })
            .collect();
        snapshots.sort_by(|a, b| a.handler.cmp(&b.handler));
        snapshots
    }

    /// Forget a handler's breaker state. Returns whether it existed.
    pub fn reset(&self, handler: &str) -> bool {
        let removed = self.states.remove(handler).is_some();
        if removed {
            tracing::info!(handler = %handler, "Circuit breaker reset");
        }
        removed
    }

    fn resolve(&self, handler: &str, kind: AttemptKind, outcome: AttemptOutcome) {
        self.stats.record_attempt(handler, outcome);

        let Some(mut state) = self.states.get_mut(handler) else {
            // Reset while the attempt was in flight
            return;
        };
        let transition = match outcome {
            AttemptOutcome::Success => state.record_success(kind),
            AttemptOutcome::Failure | AttemptOutcome::Timeout => {
                state.record_failure(kind, Instant::now(), &self.config)
            }
            AttemptOutcome::Indeterminate => {
                state.record_indeterminate(kind);
                None
            }
        };
        if let Some(transition) = transition {
            self.report(handler, transition);
        }
    }

    fn report(&self, handler: &str, transition: Transition) {
        self.stats
            .record_transition(handler, transition.from, transition.to);

        if transition.to == CircuitState::Open {
            tracing::warn!(
                handler = %handler,
                from = %transition.from,
                open_duration_ms = self.config.open_duration_ms,
                "Circuit breaker opened"
            );
        } else {
            tracing::info!(
                handler = %handler,
                from = %transition.from,
                to = %transition.to,
                "Circuit breaker state changed"
            );
        }
    }
}

/// An admitted attempt against one handler.
///
/// Resolve it with [`succeed`](Self::succeed) or [`fail`](Self::fail).
/// Dropping it unresolved records an indeterminate outcome.
#[derive(Debug)]
pub struct AttemptGuard<'a> {
    breakers: &'a CircuitBreakers,
    handler: String,
    kind: AttemptKind,
    resolved: bool,
}

impl AttemptGuard<'_> {
    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn is_trial(&self) -> bool {
        self.kind == AttemptKind::Trial
    }

    pub fn succeed(mut self) {
        self.finish(AttemptOutcome::Success);
    }

    /// Record a failure. `timed_out` only changes how the attempt is counted.
    pub fn fail(mut self, timed_out: bool) {
        let outcome = if timed_out {
            AttemptOutcome::Timeout
        } else {
            AttemptOutcome::Failure
        };
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: AttemptOutcome) {
        self.resolved = true;
        self.breakers.resolve(&self.handler, self.kind, outcome);
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::debug!(handler = %self.handler, "Attempt abandoned, outcome indeterminate");
            self.finish(AttemptOutcome::Indeterminate);
        }
    }
}
