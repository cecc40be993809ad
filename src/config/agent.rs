//! Agent and team definitions

use serde::{Deserialize, Serialize};

use super::routing::MatchMode;

/// A specialised agent type and its escalation table.
///
/// `rules` has no default: an agent without an escalation table is a
/// configuration error. Terminal agents declare `rules = []`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Weighted instances; when empty a single instance named after the
    /// agent is created.
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
    pub rules: Vec<RuleConfig>,
}

fn default_temperature() -> f32 {
    0.5
}

/// One entry of an escalation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub trigger: String,
    pub target: String,
    /// Overrides `routing.default_match` for this rule
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
}

/// A concrete instance of an agent type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub id: String,
    /// Lower = higher priority
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    50
}

/// An escalation destination outside the agent pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub id: String,
    #[serde(default)]
    pub description: String,
}
