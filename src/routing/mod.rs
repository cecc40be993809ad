//! Escalation routing for conversation turns
//!
//! The router scans the current agent's escalation table in declared order.
//! The first matching rule names a target handler; the router then picks an
//! instance of that target (skipping unhealthy ones and those behind an
//! open circuit breaker) or degrades to keeping the turn with the current
//! agent.
//!
//! [`Router::evaluate`] only decides. [`Router::route`] also performs the
//! handoff under the escalation timeout and feeds the outcome back into the
//! breakers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub mod decision;
pub mod dispatch;
pub mod error;
pub mod trigger;
pub mod turn;

pub use decision::{DegradeReason, MatchedRule, RoutingDecision, RuleSource};
pub use dispatch::{AcceptAll, Handoff, HandoffDispatcher, HandoffError};
pub use error::RoutingError;
pub use trigger::{build_matcher, TriggerMatcher};
pub use turn::ConversationTurn;

use crate::breaker::CircuitBreakers;
use crate::config::{ConfigError, MatchMode, SwitchboardConfig};
use crate::logging::{outcome_field, turn_preview};
use crate::metrics::{RoutingStats, StatsSnapshot};
use crate::registry::{
    select_instance, AgentProfile, HandlerKind, InstanceStatus, Registry, SelectionError,
};

/// A decision plus what the log and fallback counter need to know about it.
struct Evaluation {
    decision: RoutingDecision,
    /// Highest-priority healthy instance, when it was passed over
    skipped: Option<String>,
}

impl From<RoutingDecision> for Evaluation {
    fn from(decision: RoutingDecision) -> Self {
        Self {
            decision,
            skipped: None,
        }
    }
}

/// Router decides which handler takes each turn
pub struct Router {
    registry: Arc<Registry>,
    breakers: Arc<CircuitBreakers>,
    stats: Arc<RoutingStats>,
    /// Global frustration triggers, checked after the agent's own table
    sentiment: Vec<Box<dyn TriggerMatcher>>,
    sentiment_target: String,
    escalation_timeout: Duration,
    max_sessions: u32,
    content_logging: bool,
}

impl Router {
    /// Create a router over an already loaded registry
    pub fn new(registry: Arc<Registry>, config: &SwitchboardConfig) -> Result<Self, ConfigError> {
        // Sentiment phrases always match as substrings
        let sentiment = config
            .routing
            .sentiment_triggers
            .iter()
            .map(|phrase| {
                build_matcher(phrase, MatchMode::Substring).map_err(|e| {
                    ConfigError::InvalidPattern {
                        agent: "routing.sentiment_triggers".to_string(),
                        pattern: phrase.clone(),
                        message: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stats = Arc::new(RoutingStats::new());
        let breakers = Arc::new(CircuitBreakers::new(
            config.breaker.clone(),
            Arc::clone(&stats),
        ));

        Ok(Self {
            registry,
            breakers,
            stats,
            sentiment,
            sentiment_target: config.routing.sentiment_target.clone(),
            escalation_timeout: config.routing.escalation_timeout(),
            max_sessions: config.routing.max_sessions_per_agent,
            content_logging: config.logging.enable_content_logging,
        })
    }

    /// Validate the configuration, load the registry and build a router
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(Registry::from_config(config)?);
        Self::new(registry, config)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakers> {
        &self.breakers
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn escalation_timeout(&self) -> Duration {
        self.escalation_timeout
    }

    /// Decide who handles a turn without contacting anyone
    ///
    /// Performs no I/O. A turn that matches no trigger never touches the
    /// circuit breakers.
    pub fn evaluate(&self, turn: &ConversationTurn) -> Result<RoutingDecision, RoutingError> {
        let evaluation = self.decide(turn, &HashSet::new())?;
        self.note_fallback(turn, &evaluation);
        Ok(self.finish(turn, evaluation.decision))
    }

    /// Convenience wrapper building an ad-hoc turn
    pub fn evaluate_text(
        &self,
        current_agent: &str,
        text: &str,
    ) -> Result<RoutingDecision, RoutingError> {
        self.evaluate(&ConversationTurn::ad_hoc(current_agent, text))
    }

    /// Decide and carry out the handoff
    ///
    /// Each attempt waits at most the escalation timeout for the dispatcher
    /// to acknowledge. A failed or timed-out attempt counts against the
    /// handler's breaker and routing falls back to the next handler. If
    /// `cancel` fires mid-attempt the attempt is recorded as indeterminate
    /// and [`RoutingError::Cancelled`] is returned.
    pub async fn route(
        &self,
        turn: &ConversationTurn,
        dispatcher: &dyn HandoffDispatcher,
        cancel: &CancellationToken,
    ) -> Result<RoutingDecision, RoutingError> {
        let mut failed: HashSet<String> = HashSet::new();

        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(turn));
            }

            let evaluation = self.decide(turn, &failed)?;
            let Some(handoff) = handoff_for(turn, &evaluation.decision) else {
                return Ok(self.finish(turn, evaluation.decision));
            };

            let Some(guard) = self.breakers.begin(&handoff.handler) else {
                // Another turn claimed the half-open trial first; the next
                // evaluation sees the breaker as unavailable
                continue;
            };
            self.note_fallback(turn, &evaluation);

            tracing::debug!(
                session_id = %turn.session_id,
                handler = %handoff.handler,
                trial = guard.is_trial(),
                "Attempting handoff"
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // Dropping the guard records the attempt as indeterminate
                    drop(guard);
                    return Err(self.cancelled(turn));
                }
                result = tokio::time::timeout(
                    self.escalation_timeout,
                    dispatcher.acknowledge(&handoff),
                ) => result,
            };

            match result {
                Ok(Ok(())) => {
                    guard.succeed();
                    return Ok(self.finish(turn, evaluation.decision));
                }
                Ok(acknowledgement) => {
                    let (outcome, error) = outcome_field(&acknowledgement);
                    tracing::warn!(
                        session_id = %turn.session_id,
                        handler = %handoff.handler,
                        outcome,
                        error = ?error,
                        "Handoff failed"
                    );
                    guard.fail(false);
                }
                Err(_) => {
                    tracing::warn!(
                        session_id = %turn.session_id,
                        handler = %handoff.handler,
                        timeout_ms = self.escalation_timeout.as_millis() as u64,
                        "Handoff timed out"
                    );
                    guard.fail(true);
                }
            }

            failed.insert(handoff.handler);
        }
    }

    fn cancelled(&self, turn: &ConversationTurn) -> RoutingError {
        tracing::info!(session_id = %turn.session_id, "Routing cancelled");
        RoutingError::Cancelled {
            session_id: turn.session_id.clone(),
        }
    }

    /// Core decision. `failed` holds handlers that already failed during
    /// this call and must not be chosen again.
    fn decide(
        &self,
        turn: &ConversationTurn,
        failed: &HashSet<String>,
    ) -> Result<Evaluation, RoutingError> {
        let profile = self
            .registry
            .agent(&turn.agent_id)
            .ok_or_else(|| RoutingError::UnknownAgent(turn.agent_id.clone()))?;

        let normalized = turn.text.to_lowercase();
        let Some(rule) = self.match_rule(&profile, &normalized) else {
            return Ok(RoutingDecision::Continue {
                agent: profile.id.clone(),
            }
            .into());
        };

        let evaluation = match self.registry.handler_kind(&rule.target) {
            Some(HandlerKind::Agent) => self.resolve_agent(&profile.id, rule, failed),
            Some(HandlerKind::Team) => self.resolve_team(&profile.id, rule, failed),
            // Targets are validated at load time
            None => RoutingDecision::Degraded {
                agent: profile.id.clone(),
                target: rule.target.clone(),
                rule,
                reason: DegradeReason::NoHealthyInstance,
            }
            .into(),
        };
        Ok(evaluation)
    }

    /// First matching rule of the agent's table, then the sentiment triggers
    fn match_rule(&self, profile: &AgentProfile, normalized: &str) -> Option<MatchedRule> {
        if let Some(rule) = profile.rules.iter().find(|r| r.matches(normalized)) {
            return Some(MatchedRule {
                source: RuleSource::Agent,
                index: rule.index,
                trigger: rule.trigger().to_string(),
                target: rule.target.clone(),
            });
        }

        if self.sentiment_target == profile.id {
            return None;
        }
        self.sentiment
            .iter()
            .enumerate()
            .find(|(_, m)| m.matches(normalized))
            .map(|(index, m)| MatchedRule {
                source: RuleSource::Sentiment,
                index,
                trigger: m.pattern().to_string(),
                target: self.sentiment_target.clone(),
            })
    }

    fn resolve_team(&self, agent: &str, rule: MatchedRule, failed: &HashSet<String>) -> Evaluation {
        let target = rule.target.clone();
        let reason = if failed.contains(&target) {
            Some(DegradeReason::AttemptsFailed)
        } else if !self.breakers.is_available(&target) {
            Some(DegradeReason::BreakerOpen)
        } else {
            None
        };

        match reason {
            Some(reason) => RoutingDecision::Degraded {
                agent: agent.to_string(),
                target,
                rule,
                reason,
            },
            None => RoutingDecision::Escalate {
                from: agent.to_string(),
                target,
                instance: None,
                rule,
                fallback: false,
            },
        }
        .into()
    }

    fn resolve_agent(
        &self,
        agent: &str,
        rule: MatchedRule,
        failed: &HashSet<String>,
    ) -> Evaluation {
        let target = rule.target.clone();
        let degraded = |rule: MatchedRule, reason| -> Evaluation {
            RoutingDecision::Degraded {
                agent: agent.to_string(),
                target: target.clone(),
                rule,
                reason,
            }
            .into()
        };

        let healthy: Vec<_> = self
            .registry
            .instance_loads(&target)
            .unwrap_or_default()
            .into_iter()
            .filter(|load| load.status == InstanceStatus::Healthy)
            .collect();
        let Some(primary) = healthy.first().map(|load| load.instance_id.clone()) else {
            return degraded(rule, DegradeReason::NoHealthyInstance);
        };

        let tried_any = healthy.iter().any(|load| failed.contains(&load.instance_id));
        let available: Vec<_> = healthy
            .into_iter()
            .filter(|load| !failed.contains(&load.instance_id))
            .filter(|load| self.breakers.is_available(&load.instance_id))
            .collect();

        match select_instance(&available, self.max_sessions) {
            Ok(chosen) => {
                let skipped = !available.iter().any(|load| load.instance_id == primary);
                Evaluation {
                    decision: RoutingDecision::Escalate {
                        from: agent.to_string(),
                        target: target.clone(),
                        instance: Some(chosen.instance_id.clone()),
                        rule,
                        fallback: skipped,
                    },
                    skipped: skipped.then_some(primary),
                }
            }
            Err(SelectionError::NoCapacity { .. }) => RoutingDecision::NoCapacity {
                agent: agent.to_string(),
                target: target.clone(),
                rule,
            }
            .into(),
            Err(SelectionError::NoInstances) if tried_any => {
                degraded(rule, DegradeReason::AttemptsFailed)
            }
            Err(SelectionError::NoInstances) => degraded(rule, DegradeReason::BreakerOpen),
        }
    }

    fn note_fallback(&self, turn: &ConversationTurn, evaluation: &Evaluation) {
        let (Some(skipped), RoutingDecision::Escalate { target, instance: Some(to), .. }) =
            (&evaluation.skipped, &evaluation.decision)
        else {
            return;
        };

        self.stats.record_fallback(target, skipped, to);
        tracing::warn!(
            session_id = %turn.session_id,
            target = %target,
            from = %skipped,
            to = %to,
            "Falling back to lower-priority instance"
        );
    }

    /// Count and log a final decision
    fn finish(&self, turn: &ConversationTurn, decision: RoutingDecision) -> RoutingDecision {
        self.stats.record_decision(decision.label());
        let preview = turn_preview(&turn.text, self.content_logging);

        match &decision {
            RoutingDecision::Continue { agent } => {
                tracing::debug!(
                    session_id = %turn.session_id,
                    agent = %agent,
                    preview = ?preview,
                    "No escalation rule matched"
                );
            }
            RoutingDecision::Escalate {
                from,
                target,
                instance,
                rule,
                fallback,
            } => {
                tracing::info!(
                    session_id = %turn.session_id,
                    from = %from,
                    target = %target,
                    instance = ?instance,
                    trigger = %rule.trigger,
                    rule_index = rule.index,
                    fallback,
                    preview = ?preview,
                    "Escalating turn"
                );
            }
            RoutingDecision::Degraded {
                agent,
                target,
                rule,
                reason,
            } => {
                self.stats.record_follow_up(target, reason.as_str());
                tracing::warn!(
                    session_id = %turn.session_id,
                    agent = %agent,
                    target = %target,
                    trigger = %rule.trigger,
                    reason = %reason,
                    preview = ?preview,
                    "Escalation target unavailable, flagged for follow-up"
                );
            }
            RoutingDecision::NoCapacity { agent, target, .. } => {
                self.stats.record_no_capacity(target);
                tracing::warn!(
                    session_id = %turn.session_id,
                    agent = %agent,
                    target = %target,
                    max_sessions = self.max_sessions,
                    "Escalation target at capacity"
                );
            }
        }

        decision
    }
}

/// The handoff an escalation decision calls for, if any
fn handoff_for(turn: &ConversationTurn, decision: &RoutingDecision) -> Option<Handoff> {
    let RoutingDecision::Escalate {
        from,
        target,
        instance,
        ..
    } = decision
    else {
        return None;
    };

    let (handler, kind) = match instance {
        Some(instance) => (instance.clone(), HandlerKind::Agent),
        None => (target.clone(), HandlerKind::Team),
    };
    Some(Handoff {
        session_id: turn.session_id.clone(),
        from_agent: from.clone(),
        target: target.clone(),
        handler,
        kind,
    })
}

#[cfg(test)]
mod tests;
