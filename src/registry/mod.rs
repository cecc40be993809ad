//! Agent Registry module.
//!
//! Holds the agent table loaded at startup (immutable profiles and external
//! teams) next to the small amount of per-instance runtime state that does
//! change: health status and live session counts.

mod error;
mod profile;
mod selector;
#[cfg(test)]
mod tests;

pub use error::*;
pub use profile::*;
pub use selector::*;

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::config::{ConfigError, SwitchboardConfig};
use crate::routing::trigger::build_matcher;

/// Mutable state of one agent instance.
#[derive(Debug)]
struct InstanceRuntime {
    status: InstanceStatus,
    sessions: AtomicU32,
}

/// The Agent Registry stores agent profiles, teams and instance state.
///
/// Profiles are wrapped in `Arc` and never mutated after construction, so
/// lookups need no locking. Instance state lives in a `DashMap` and session
/// counters are atomics.
///
/// # Examples
///
/// ```
/// use switchboard::config::SwitchboardConfig;
/// use switchboard::registry::Registry;
///
/// let config = SwitchboardConfig::parse(r#"
/// [routing]
/// sentiment_triggers = []
///
/// [[agents]]
/// id = "customer_service"
/// rules = []
/// "#).unwrap();
///
/// let registry = Registry::from_config(&config).unwrap();
/// assert_eq!(registry.agent_count(), 1);
/// assert!(registry.agent("customer_service").is_some());
/// ```
#[derive(Debug)]
pub struct Registry {
    agents: HashMap<String, Arc<AgentProfile>>,
    /// Agent ids in declaration order
    agent_order: Vec<String>,
    teams: Vec<Team>,
    instances: DashMap<String, InstanceRuntime>,
}

impl Registry {
    /// Build the registry from a configuration.
    ///
    /// The configuration is validated first; any error is returned before
    /// a single profile is built.
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut agents = HashMap::new();
        let mut agent_order = Vec::new();
        let instances = DashMap::new();

        for agent in &config.agents {
            let mut rules = Vec::with_capacity(agent.rules.len());
            for (index, rule) in agent.rules.iter().enumerate() {
                let mode = rule.match_mode.unwrap_or(config.routing.default_match);
                let trigger =
                    build_matcher(&rule.trigger, mode).map_err(|e| ConfigError::InvalidPattern {
                        agent: agent.id.clone(),
                        pattern: rule.trigger.clone(),
                        message: e.to_string(),
                    })?;
                rules.push(EscalationRule::new(index, rule.target.clone(), mode, trigger));
            }

            let mut agent_instances: Vec<AgentInstance> = if agent.instances.is_empty() {
                vec![AgentInstance {
                    id: agent.id.clone(),
                    agent_id: agent.id.clone(),
                    priority: 1,
                }]
            } else {
                agent
                    .instances
                    .iter()
                    .map(|i| AgentInstance {
                        id: i.id.clone(),
                        agent_id: agent.id.clone(),
                        priority: i.priority,
                    })
                    .collect()
            };
            // Stable sort keeps declaration order among equal priorities
            agent_instances.sort_by_key(|i| i.priority);

            for instance in &agent_instances {
                instances.insert(
                    instance.id.clone(),
                    InstanceRuntime {
                        status: InstanceStatus::Healthy,
                        sessions: AtomicU32::new(0),
                    },
                );
            }

            tracing::debug!(
                agent = %agent.id,
                rules = rules.len(),
                instances = agent_instances.len(),
                "Loaded agent profile"
            );

            agent_order.push(agent.id.clone());
            agents.insert(
                agent.id.clone(),
                Arc::new(AgentProfile {
                    id: agent.id.clone(),
                    specializations: agent.specializations.clone(),
                    temperature: agent.temperature,
                    rules,
                    instances: agent_instances,
                }),
            );
        }

        let teams = config
            .teams
            .iter()
            .map(|t| Team {
                id: t.id.clone(),
                description: t.description.clone(),
            })
            .collect();

        Ok(Self {
            agents,
            agent_order,
            teams,
            instances,
        })
    }

    /// Get an agent profile by ID.
    pub fn agent(&self, id: &str) -> Option<Arc<AgentProfile>> {
        self.agents.get(id).cloned()
    }

    /// All agent profiles in declaration order.
    pub fn agents(&self) -> Vec<Arc<AgentProfile>> {
        self.agent_order
            .iter()
            .filter_map(|id| self.agents.get(id).cloned())
            .collect()
    }

    /// Get a team by ID.
    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// All teams in declaration order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Resolve what a handler identifier refers to.
    pub fn handler_kind(&self, id: &str) -> Option<HandlerKind> {
        if self.agents.contains_key(id) {
            Some(HandlerKind::Agent)
        } else if self.team(id).is_some() {
            Some(HandlerKind::Team)
        } else {
            None
        }
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Current status of an instance.
    pub fn instance_status(&self, instance_id: &str) -> Option<InstanceStatus> {
        self.instances.get(instance_id).map(|r| r.status)
    }

    /// Record a health transition for an instance.
    ///
    /// Returns the previous status.
    pub fn set_instance_status(
        &self,
        instance_id: &str,
        status: InstanceStatus,
    ) -> Result<InstanceStatus, RegistryError> {
        let mut runtime = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| RegistryError::UnknownInstance(instance_id.to_string()))?;
        let previous = runtime.status;
        runtime.status = status;

        if previous != status {
            tracing::info!(
                instance = %instance_id,
                from = %previous,
                to = %status,
                "Instance status changed"
            );
        }
        Ok(previous)
    }

    /// Live session count of an instance.
    pub fn session_count(&self, instance_id: &str) -> Option<u32> {
        self.instances
            .get(instance_id)
            .map(|r| r.sessions.load(Ordering::SeqCst))
    }

    /// Count a session as assigned to an instance.
    ///
    /// Returns the new session count.
    pub fn assign_session(&self, instance_id: &str) -> Result<u32, RegistryError> {
        let runtime = self
            .instances
            .get(instance_id)
            .ok_or_else(|| RegistryError::UnknownInstance(instance_id.to_string()))?;
        Ok(runtime.sessions.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Release a session from an instance. Never drops below zero.
    ///
    /// Returns the new session count.
    pub fn release_session(&self, instance_id: &str) -> Result<u32, RegistryError> {
        let runtime = self
            .instances
            .get(instance_id)
            .ok_or_else(|| RegistryError::UnknownInstance(instance_id.to_string()))?;
        let previous = runtime
            .sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        Ok(previous.saturating_sub(1))
    }

    /// Load snapshot of an agent's instances in priority order.
    pub fn instance_loads(&self, agent_id: &str) -> Result<Vec<InstanceLoad>, RegistryError> {
        let profile = self
            .agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::UnknownAgent(agent_id.to_string()))?;

        Ok(profile
            .instances
            .iter()
            .filter_map(|instance| {
                self.instances.get(&instance.id).map(|r| InstanceLoad {
                    instance_id: instance.id.clone(),
                    priority: instance.priority,
                    status: r.status,
                    sessions: r.sessions.load(Ordering::SeqCst),
                })
            })
            .collect())
    }
}
