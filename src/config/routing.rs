//! Routing configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How a rule's trigger is compared against turn text.
///
/// All modes are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Trigger appears anywhere in the text
    #[default]
    Substring,
    /// Trigger appears as a whole word or phrase
    Keyword,
    /// Trigger is a glob pattern matched against the whole text
    Glob,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "substring" => Ok(MatchMode::Substring),
            "keyword" => Ok(MatchMode::Keyword),
            "glob" => Ok(MatchMode::Glob),
            _ => Err(format!("Unknown match mode: {}", s)),
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::Substring => write!(f, "substring"),
            MatchMode::Keyword => write!(f, "keyword"),
            MatchMode::Glob => write!(f, "glob"),
        }
    }
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Time a target has to acknowledge a handoff
    pub escalation_timeout_ms: u64,
    /// Live sessions an instance may hold before it counts as saturated
    pub max_sessions_per_agent: u32,
    /// Match mode for rules that do not set their own
    pub default_match: MatchMode,
    /// Phrases checked after an agent's own rules
    pub sentiment_triggers: Vec<String>,
    /// Handler that sentiment triggers escalate to
    pub sentiment_target: String,
}

impl RoutingConfig {
    pub fn escalation_timeout(&self) -> Duration {
        Duration::from_millis(self.escalation_timeout_ms)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            escalation_timeout_ms: 3000,
            max_sessions_per_agent: 10,
            default_match: MatchMode::Substring,
            sentiment_triggers: [
                "frustrated",
                "angry",
                "upset",
                "terrible",
                "worst",
                "horrible",
                "unacceptable",
                "speak to manager",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            sentiment_target: "supervisor".to_string(),
        }
    }
}
