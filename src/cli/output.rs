//! Output formatting helpers for CLI commands

use crate::registry::{AgentProfile, InstanceStatus, Registry, Team};
use crate::routing::{ConversationTurn, RoutingDecision};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for agent display
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentView {
    pub id: String,
    pub specializations: Vec<String>,
    pub temperature: f32,
    pub instances: Vec<InstanceView>,
    pub rules: usize,
}

/// View model for instance display
#[derive(Debug, Clone, serde::Serialize)]
pub struct InstanceView {
    pub id: String,
    pub priority: i32,
    pub status: InstanceStatus,
    pub sessions: u32,
}

impl AgentView {
    pub fn from_profile(profile: &AgentProfile, registry: &Registry) -> Self {
        Self {
            id: profile.id.clone(),
            specializations: profile.specializations.clone(),
            temperature: profile.temperature,
            instances: profile
                .instances
                .iter()
                .map(|i| InstanceView {
                    id: i.id.clone(),
                    priority: i.priority,
                    status: registry
                        .instance_status(&i.id)
                        .unwrap_or(InstanceStatus::Unhealthy),
                    sessions: registry.session_count(&i.id).unwrap_or(0),
                })
                .collect(),
            rules: profile.rules.len(),
        }
    }
}

/// View model for one escalation rule
#[derive(Debug, Clone, serde::Serialize)]
pub struct RuleView {
    pub index: usize,
    pub trigger: String,
    pub match_mode: String,
    pub target: String,
}

impl From<&crate::registry::EscalationRule> for RuleView {
    fn from(rule: &crate::registry::EscalationRule) -> Self {
        Self {
            index: rule.index,
            trigger: rule.trigger().to_string(),
            match_mode: rule.match_mode.to_string(),
            target: rule.target.clone(),
        }
    }
}

/// Format agents as a table
pub fn format_agents_table(agents: &[AgentView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Agent",
        "Specializations",
        "Temperature",
        "Instances",
        "Rules",
    ]);

    for a in agents {
        let instances = a
            .instances
            .iter()
            .map(|i| format!("{} {} ({})", status_icon(i.status), i.id, i.sessions))
            .collect::<Vec<_>>()
            .join("\n");

        table.add_row(vec![
            Cell::new(&a.id),
            Cell::new(a.specializations.join(", ")),
            Cell::new(format!("{:.1}", a.temperature)),
            Cell::new(instances),
            Cell::new(a.rules),
        ]);
    }

    table.to_string()
}

/// Format teams as a table
pub fn format_teams_table(teams: &[Team]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Team", "Description"]);

    for t in teams {
        table.add_row(vec![Cell::new(&t.id), Cell::new(&t.description)]);
    }

    table.to_string()
}

/// Format an agent's escalation table
pub fn format_rules_table(rules: &[RuleView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Trigger", "Match", "Target"]);

    for r in rules {
        table.add_row(vec![
            Cell::new(r.index),
            Cell::new(&r.trigger),
            Cell::new(&r.match_mode),
            Cell::new(&r.target),
        ]);
    }

    table.to_string()
}

/// Format agents and teams as JSON
pub fn format_agents_json(agents: &[AgentView], teams: &[Team]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "agents": agents,
        "teams": teams,
    }))
}

/// Human-readable routing decision
pub fn format_decision_text(decision: &RoutingDecision) -> String {
    match decision {
        RoutingDecision::Continue { agent } => {
            format!("{} {} keeps the turn", "Continue".green(), agent)
        }
        RoutingDecision::Escalate {
            from,
            target,
            instance,
            rule,
            fallback,
        } => {
            let mut line = format!(
                "{} {} → {} (trigger \"{}\", rule #{})",
                "Escalate".cyan(),
                from,
                instance.as_deref().unwrap_or(target),
                rule.trigger,
                rule.index
            );
            if *fallback {
                line.push_str(&format!(" {}", "[fallback]".yellow()));
            }
            line
        }
        RoutingDecision::Degraded {
            agent,
            target,
            rule,
            reason,
        } => format!(
            "{} {} keeps the turn, {} unavailable ({}, trigger \"{}\") {}",
            "Degraded".red(),
            agent,
            target,
            reason,
            rule.trigger,
            "[follow-up]".red().bold()
        ),
        RoutingDecision::NoCapacity { agent, target, .. } => format!(
            "{} {} is saturated, {} keeps the turn",
            "No capacity".yellow(),
            target,
            agent
        ),
    }
}

/// Routing decision as JSON, with the turn it was made for
pub fn format_decision_json(
    turn: &ConversationTurn,
    decision: &RoutingDecision,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "turn": turn,
        "result": decision,
        "needs_follow_up": decision.needs_follow_up(),
    }))
}

/// Get status icon for instance status
pub fn status_icon(status: InstanceStatus) -> &'static str {
    match status {
        InstanceStatus::Healthy => "✓",
        InstanceStatus::Unhealthy => "✗",
        InstanceStatus::Draining => "~",
    }
}
