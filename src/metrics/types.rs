//! # Metrics Types
//!
//! Serializable snapshots of the routing counters.

use serde::Serialize;

/// Point-in-time copy of [`super::RoutingStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub decisions: DecisionStats,
    pub attempts: AttemptStats,
    /// Escalations that skipped a higher-priority instance
    pub fallbacks: u64,
    /// Turns flagged for manual review
    pub follow_ups: u64,
    pub breaker_transitions: u64,
    /// Transitions into the open state
    pub breaker_opens: u64,
}

/// Decisions by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionStats {
    pub total: u64,
    pub continued: u64,
    pub escalated: u64,
    pub degraded: u64,
    pub no_capacity: u64,
}

/// Escalation attempts by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttemptStats {
    pub success: u64,
    pub failure: u64,
    pub timeout: u64,
    pub indeterminate: u64,
}
