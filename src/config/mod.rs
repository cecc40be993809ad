//! Configuration module for Switchboard
//!
//! Provides configuration loading from a TOML file, environment variables,
//! and defaults. The agent table is validated in full before anything is
//! routed: a malformed table, an unknown rule target or an invalid trigger
//! pattern stops the process at startup.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SWITCHBOARD_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use switchboard::config::SwitchboardConfig;
//!
//! let toml = r#"
//! [routing]
//! sentiment_triggers = []
//!
//! [[agents]]
//! id = "customer_service"
//!
//! [[agents.rules]]
//! trigger = "pricing"
//! target = "sales"
//!
//! [[agents]]
//! id = "sales"
//! rules = []
//! "#;
//! let config: SwitchboardConfig = toml::from_str(toml).unwrap();
//! assert!(config.validate().is_ok());
//! ```

pub mod agent;
pub mod breaker;
pub mod error;
pub mod logging;
pub mod routing;

pub use agent::{AgentConfig, InstanceConfig, RuleConfig, TeamConfig};
pub use breaker::BreakerConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use routing::{MatchMode, RoutingConfig};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the routing core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SwitchboardConfig {
    /// Escalation timeout, capacity and matching settings
    pub routing: RoutingConfig,
    /// Circuit breaker thresholds
    pub breaker: BreakerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Agent types with their escalation tables
    pub agents: Vec<AgentConfig>,
    /// External escalation destinations
    pub teams: Vec<TeamConfig>,
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                Self::parse(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| {
            let message = e.message().to_string();
            match message.strip_prefix("missing field ") {
                Some(field) => ConfigError::MissingField(field.trim_matches('`').to_string()),
                None => ConfigError::Parse(e.to_string()),
            }
        })
    }

    /// Apply environment variable overrides
    ///
    /// Supports SWITCHBOARD_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("SWITCHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SWITCHBOARD_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(timeout) = std::env::var("SWITCHBOARD_ESCALATION_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.routing.escalation_timeout_ms = t;
            }
        }
        if let Ok(max) = std::env::var("SWITCHBOARD_MAX_SESSIONS") {
            if let Ok(m) = max.parse() {
                self.routing.max_sessions_per_agent = m;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routing.escalation_timeout_ms == 0 {
            return Err(invalid(
                "routing.escalation_timeout_ms",
                "timeout must be non-zero",
            ));
        }
        if self.routing.max_sessions_per_agent == 0 {
            return Err(invalid(
                "routing.max_sessions_per_agent",
                "must allow at least one session",
            ));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(invalid("breaker.failure_threshold", "must be at least 1"));
        }
        if self.breaker.window_ms == 0 {
            return Err(invalid("breaker.window_ms", "window must be non-zero"));
        }
        if self.breaker.open_duration_ms == 0 {
            return Err(invalid(
                "breaker.open_duration_ms",
                "open duration must be non-zero",
            ));
        }

        self.logging.validate()?;

        if self.agents.is_empty() {
            return Err(ConfigError::MissingField("agents".to_string()));
        }

        // Agents and teams share one handler namespace
        let mut handlers = HashSet::new();
        for (i, agent) in self.agents.iter().enumerate() {
            if agent.id.trim().is_empty() {
                return Err(invalid(&format!("agents[{}].id", i), "id cannot be empty"));
            }
            if !handlers.insert(agent.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    id: agent.id.clone(),
                    section: "agents".to_string(),
                });
            }
            if !(0.0..=2.0).contains(&agent.temperature) {
                return Err(invalid(
                    &format!("agents[{}].temperature", i),
                    "temperature must be between 0.0 and 2.0",
                ));
            }
        }
        for (i, team) in self.teams.iter().enumerate() {
            if team.id.trim().is_empty() {
                return Err(invalid(&format!("teams[{}].id", i), "id cannot be empty"));
            }
            if !handlers.insert(team.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    id: team.id.clone(),
                    section: "teams".to_string(),
                });
            }
        }

        let mut instance_ids = HashSet::new();
        for agent in &self.agents {
            for instance in &agent.instances {
                if instance.id.trim().is_empty() {
                    return Err(invalid(
                        &format!("agents.{}.instances", agent.id),
                        "instance id cannot be empty",
                    ));
                }
                // Instances, teams and instance-less agents share the breaker
                // namespace
                let clashes = instance.id != agent.id && handlers.contains(instance.id.as_str());
                if clashes || !instance_ids.insert(instance.id.as_str()) {
                    return Err(ConfigError::DuplicateId {
                        id: instance.id.clone(),
                        section: format!("agents.{}.instances", agent.id),
                    });
                }
            }

            for (r, rule) in agent.rules.iter().enumerate() {
                if rule.trigger.trim().is_empty() {
                    return Err(invalid(
                        &format!("agents.{}.rules[{}].trigger", agent.id, r),
                        "trigger cannot be empty",
                    ));
                }
                if !handlers.contains(rule.target.as_str()) {
                    return Err(ConfigError::UnknownTarget {
                        agent: agent.id.clone(),
                        rule: r,
                        target: rule.target.clone(),
                    });
                }
                if rule.target == agent.id {
                    return Err(invalid(
                        &format!("agents.{}.rules[{}].target", agent.id, r),
                        "an agent cannot escalate to itself",
                    ));
                }
                let mode = rule.match_mode.unwrap_or(self.routing.default_match);
                if mode == MatchMode::Glob {
                    globset::Glob::new(&rule.trigger).map_err(|e| ConfigError::InvalidPattern {
                        agent: agent.id.clone(),
                        pattern: rule.trigger.clone(),
                        message: e.to_string(),
                    })?;
                }
            }
        }

        // A blank phrase would match every turn
        for (i, phrase) in self.routing.sentiment_triggers.iter().enumerate() {
            if phrase.trim().is_empty() {
                return Err(invalid(
                    &format!("routing.sentiment_triggers[{}]", i),
                    "trigger cannot be empty",
                ));
            }
        }

        if !self.routing.sentiment_triggers.is_empty()
            && !handlers.contains(self.routing.sentiment_target.as_str())
        {
            return Err(invalid(
                "routing.sentiment_target",
                &format!(
                    "'{}' is not a defined agent or team",
                    self.routing.sentiment_target
                ),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}
