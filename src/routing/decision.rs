//! Routing decisions.

use serde::Serialize;

/// Where the matching rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// The current agent's escalation table
    Agent,
    /// The global sentiment triggers
    Sentiment,
}

/// The rule that fired for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRule {
    pub source: RuleSource,
    /// Position in the table it came from
    pub index: usize,
    pub trigger: String,
    pub target: String,
}

/// Why an escalation could not be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// Every healthy handler for the target has an open breaker
    BreakerOpen,
    /// The target agent has no healthy instance
    NoHealthyInstance,
    /// Every handler tried during this call failed or timed out
    AttemptsFailed,
}

impl DegradeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradeReason::BreakerOpen => "breaker_open",
            DegradeReason::NoHealthyInstance => "no_healthy_instance",
            DegradeReason::AttemptsFailed => "attempts_failed",
        }
    }
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of routing one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// No rule matched; the current agent keeps the turn
    Continue { agent: String },

    /// Hand the turn to `target`
    Escalate {
        from: String,
        target: String,
        /// Chosen instance for agent targets, `None` for teams
        instance: Option<String>,
        rule: MatchedRule,
        /// A higher-priority instance was skipped
        fallback: bool,
    },

    /// A rule matched but the target is unavailable; the current agent
    /// keeps the turn and it needs manual follow-up
    Degraded {
        agent: String,
        target: String,
        rule: MatchedRule,
        reason: DegradeReason,
    },

    /// Every available instance of the target is at its session limit
    NoCapacity {
        agent: String,
        target: String,
        rule: MatchedRule,
    },
}

impl RoutingDecision {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RoutingDecision::Continue { .. } => "continue",
            RoutingDecision::Escalate { .. } => "escalate",
            RoutingDecision::Degraded { .. } => "degraded",
            RoutingDecision::NoCapacity { .. } => "no_capacity",
        }
    }

    pub fn is_escalation(&self) -> bool {
        matches!(self, RoutingDecision::Escalate { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RoutingDecision::Escalate { fallback: true, .. })
    }

    /// Whether a human should review this turn.
    pub fn needs_follow_up(&self) -> bool {
        matches!(self, RoutingDecision::Degraded { .. })
    }

    /// Agent that handles the turn once the decision is applied.
    pub fn handling_agent(&self) -> &str {
        match self {
            RoutingDecision::Continue { agent }
            | RoutingDecision::Degraded { agent, .. }
            | RoutingDecision::NoCapacity { agent, .. } => agent,
            RoutingDecision::Escalate { target, .. } => target,
        }
    }

    /// Target named by the matched rule, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            RoutingDecision::Continue { .. } => None,
            RoutingDecision::Escalate { target, .. }
            | RoutingDecision::Degraded { target, .. }
            | RoutingDecision::NoCapacity { target, .. } => Some(target),
        }
    }

    pub fn rule(&self) -> Option<&MatchedRule> {
        match self {
            RoutingDecision::Continue { .. } => None,
            RoutingDecision::Escalate { rule, .. }
            | RoutingDecision::Degraded { rule, .. }
            | RoutingDecision::NoCapacity { rule, .. } => Some(rule),
        }
    }
}
