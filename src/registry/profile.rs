use serde::{Deserialize, Serialize};

use crate::config::MatchMode;
use crate::routing::trigger::TriggerMatcher;

/// Health of an agent instance.
///
/// Only healthy instances receive escalated turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Instance is accepting turns
    Healthy,
    /// Instance failed its health check
    Unhealthy,
    /// Instance keeps its sessions but takes no new ones
    Draining,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStatus::Healthy => write!(f, "healthy"),
            InstanceStatus::Unhealthy => write!(f, "unhealthy"),
            InstanceStatus::Draining => write!(f, "draining"),
        }
    }
}

/// A configured instance of an agent type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInstance {
    /// Unique instance identifier; also the key of its circuit breaker
    pub id: String,
    /// Agent type this instance serves
    pub agent_id: String,
    /// Lower = higher priority
    pub priority: i32,
}

/// One entry of an agent's escalation table.
///
/// The trigger is compiled once at load time and never re-interpreted.
#[derive(Debug)]
pub struct EscalationRule {
    /// Position in the declared table (0-based)
    pub index: usize,
    /// Handler the turn escalates to
    pub target: String,
    /// How the trigger is compared against turn text
    pub match_mode: MatchMode,
    trigger: Box<dyn TriggerMatcher>,
}

impl EscalationRule {
    pub fn new(
        index: usize,
        target: String,
        match_mode: MatchMode,
        trigger: Box<dyn TriggerMatcher>,
    ) -> Self {
        Self {
            index,
            target,
            match_mode,
            trigger,
        }
    }

    /// Source pattern of the trigger.
    pub fn trigger(&self) -> &str {
        self.trigger.pattern()
    }

    /// Check the trigger against lowercased turn text.
    pub fn matches(&self, normalized_text: &str) -> bool {
        self.trigger.matches(normalized_text)
    }
}

/// A specialised agent type.
///
/// Immutable once loaded. `instances` is sorted by priority with
/// declaration order breaking ties.
#[derive(Debug)]
pub struct AgentProfile {
    pub id: String,
    pub specializations: Vec<String>,
    pub temperature: f32,
    pub rules: Vec<EscalationRule>,
    pub instances: Vec<AgentInstance>,
}

impl AgentProfile {
    /// Highest-priority instance, if any.
    pub fn primary_instance(&self) -> Option<&AgentInstance> {
        self.instances.first()
    }
}

/// An escalation destination outside the agent pool.
///
/// A team is a single handler: it has one circuit breaker and no
/// capacity limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: String,
    pub description: String,
}

/// What a handler identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Agent,
    Team,
}
