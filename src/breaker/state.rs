//! Per-handler circuit breaker state.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::time::Instant;

use crate::config::BreakerConfig;

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Escalations flow normally
    Closed,
    /// Escalations are rejected until the open duration elapses
    Open,
    /// One trial escalation decides whether to close or reopen
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// A state change worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Whether an attempt was started as the half-open trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Normal,
    Trial,
}

/// Tracks failures and state for a single handler.
#[derive(Debug, Clone)]
pub struct CircuitBreakerState {
    status: CircuitState,
    /// Failure times inside the sliding window (closed state only)
    failures: VecDeque<Instant>,
    last_failure: Option<Instant>,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self {
            status: CircuitState::Closed,
            failures: VecDeque::new(),
            last_failure: None,
            opened_at: None,
            trial_in_flight: false,
        }
    }
}

impl CircuitBreakerState {
    pub fn status(&self) -> CircuitState {
        self.status
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.last_failure
    }

    pub fn trial_in_flight(&self) -> bool {
        self.trial_in_flight
    }

    /// Failures currently inside the window.
    pub fn failure_count(&self, now: Instant, config: &BreakerConfig) -> usize {
        self.failures
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < config.window())
            .count()
    }

    /// Move Open → HalfOpen once the open duration has elapsed.
    pub fn refresh(&mut self, now: Instant, config: &BreakerConfig) -> Option<Transition> {
        if self.status != CircuitState::Open {
            return None;
        }
        let opened_at = self.opened_at?;
        if now.saturating_duration_since(opened_at) >= config.open_duration() {
            return Some(self.transition_to(CircuitState::HalfOpen));
        }
        None
    }

    /// Whether an attempt would be admitted right now.
    pub fn is_available(&self) -> bool {
        match self.status {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => !self.trial_in_flight,
        }
    }

    /// Admit an attempt, claiming the trial slot when half-open.
    ///
    /// Returns `None` when the breaker rejects the attempt.
    pub fn try_begin(&mut self) -> Option<AttemptKind> {
        match self.status {
            CircuitState::Closed => Some(AttemptKind::Normal),
            CircuitState::Open => None,
            CircuitState::HalfOpen if self.trial_in_flight => None,
            CircuitState::HalfOpen => {
                self.trial_in_flight = true;
                Some(AttemptKind::Trial)
            }
        }
    }

    /// Apply a successful attempt.
    pub fn record_success(&mut self, kind: AttemptKind) -> Option<Transition> {
        match (kind, self.status) {
            (AttemptKind::Trial, CircuitState::HalfOpen) => {
                Some(self.transition_to(CircuitState::Closed))
            }
            // Late results from attempts admitted before the breaker
            // opened do not move it
            _ => None,
        }
    }

    /// Apply a failed attempt (including timeouts).
    pub fn record_failure(
        &mut self,
        kind: AttemptKind,
        now: Instant,
        config: &BreakerConfig,
    ) -> Option<Transition> {
        self.last_failure = Some(now);

        match (kind, self.status) {
            (AttemptKind::Trial, CircuitState::HalfOpen) => {
                let transition = self.transition_to(CircuitState::Open);
                self.opened_at = Some(now);
                Some(transition)
            }
            (AttemptKind::Normal, CircuitState::Closed) => {
                let window = config.window();
                self.failures.push_back(now);
                while self
                    .failures
                    .front()
                    .is_some_and(|t| now.saturating_duration_since(*t) >= window)
                {
                    self.failures.pop_front();
                }

                if self.failures.len() >= config.failure_threshold as usize {
                    let transition = self.transition_to(CircuitState::Open);
                    self.opened_at = Some(now);
                    Some(transition)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Apply an attempt whose outcome is unknown.
    ///
    /// Counts nothing; a trial slot is handed back so another attempt can
    /// run the trial.
    pub fn record_indeterminate(&mut self, kind: AttemptKind) {
        if kind == AttemptKind::Trial && self.status == CircuitState::HalfOpen {
            self.trial_in_flight = false;
        }
    }

    fn transition_to(&mut self, to: CircuitState) -> Transition {
        let from = self.status;
        self.status = to;
        self.trial_in_flight = false;
        match to {
            CircuitState::Closed => {
                self.failures.clear();
                self.opened_at = None;
            }
            CircuitState::Open => {
                self.failures.clear();
            }
            CircuitState::HalfOpen => {}
        }
        Transition { from, to }
    }
}
