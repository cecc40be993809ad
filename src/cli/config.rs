//! Config command handlers

use crate::cli::{load_config, ConfigInitArgs, ConfigValidateArgs};
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../switchboard.example.toml");

/// Handle `switchboard config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        );
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Edit the agents and teams to match your deployment.");

    Ok(())
}

/// Handle `switchboard config validate` command
pub fn handle_config_validate(args: &ConfigValidateArgs) -> anyhow::Result<String> {
    let config = load_config(&args.config)?;
    let rules: usize = config.agents.iter().map(|a| a.rules.len()).sum();

    Ok(format!(
        "✓ {} is valid: {} agents, {} teams, {} escalation rules",
        args.config.display(),
        config.agents.len(),
        config.teams.len(),
        rules
    ))
}
