//! Agents command implementation

use crate::cli::output::{
    format_agents_json, format_agents_table, format_rules_table, format_teams_table, AgentView,
    RuleView,
};
use crate::cli::AgentsArgs;
use crate::registry::Registry;

/// Handle `switchboard agents` command
pub fn handle_agents(args: &AgentsArgs, registry: &Registry) -> anyhow::Result<String> {
    if let Some(agent_id) = &args.rules {
        let profile = registry
            .agent(agent_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown agent '{}'", agent_id))?;
        let rules: Vec<RuleView> = profile.rules.iter().map(RuleView::from).collect();

        return if args.json {
            Ok(serde_json::to_string_pretty(&rules)?)
        } else {
            Ok(format_rules_table(&rules))
        };
    }

    let agents: Vec<AgentView> = registry
        .agents()
        .iter()
        .map(|profile| AgentView::from_profile(profile, registry))
        .collect();

    if args.json {
        Ok(format_agents_json(&agents, registry.teams())?)
    } else {
        Ok(format!(
            "{}\n{}",
            format_agents_table(&agents),
            format_teams_table(registry.teams())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwitchboardConfig;
    use std::path::PathBuf;

    fn registry() -> Registry {
        let config =
            SwitchboardConfig::parse(include_str!("../../switchboard.example.toml")).unwrap();
        Registry::from_config(&config).unwrap()
    }

    fn args(json: bool, rules: Option<&str>) -> AgentsArgs {
        AgentsArgs {
            json,
            rules: rules.map(String::from),
            config: PathBuf::from("switchboard.toml"),
        }
    }

    #[test]
    fn test_agents_table_lists_agents_and_teams() {
        let output = handle_agents(&args(false, None), &registry()).unwrap();
        assert!(output.contains("customer_service"));
        assert!(output.contains("sales_specialist-1"));
        assert!(output.contains("security_team"));
    }

    #[test]
    fn test_agents_json() {
        let output = handle_agents(&args(true, None), &registry()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["agents"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["teams"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_rules_in_table_order() {
        let output = handle_agents(&args(true, Some("technical_support")), &registry()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["trigger"], "system down");
        assert_eq!(parsed[5]["target"], "security_team");
    }

    #[test]
    fn test_rules_unknown_agent() {
        assert!(handle_agents(&args(false, Some("nobody")), &registry()).is_err());
    }
}
