//! CLI module for Switchboard
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `route` - Decide who handles a turn (dry run by default)
//! - `agents` - Show the agent table and external teams
//! - `config` - Configuration utilities (init, validate)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Where would this message go?
//! switchboard route --agent customer_service "my invoice shows the wrong pricing"
//!
//! # Check a configuration before deploying it
//! switchboard config validate -c switchboard.toml
//!
//! # Generate shell completions
//! switchboard completions bash > ~/.bash_completion.d/switchboard
//! ```

pub mod agents;
pub mod completions;
pub mod config;
pub mod output;
pub mod route;

pub use agents::handle_agents;
pub use completions::handle_completions;
pub use config::{handle_config_init, handle_config_validate};
pub use route::handle_route;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig, SwitchboardConfig};

/// Switchboard - escalation routing for multi-agent customer service
#[derive(Parser, Debug)]
#[command(
    name = "switchboard",
    version,
    about = "Escalation routing for multi-agent customer service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide which handler takes a conversation turn
    Route(RouteArgs),
    /// Show configured agents and teams
    Agents(AgentsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Agent currently handling the conversation
    #[arg(short, long)]
    pub agent: String,

    /// Turn text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Session identifier (random if omitted)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "switchboard.toml")]
    pub config: PathBuf,

    /// Perform the handoff through the routing loop instead of only evaluating
    #[arg(long)]
    pub dispatch: bool,

    /// Print Prometheus metrics after the decision
    #[arg(long)]
    pub metrics: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SWITCHBOARD_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct AgentsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the escalation rules of one agent
    #[arg(long)]
    pub rules: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "switchboard.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
    /// Load and validate a configuration file
    Validate(ConfigValidateArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "switchboard.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigValidateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "switchboard.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load a configuration file, apply environment overrides and validate it
pub fn load_config(path: &Path) -> anyhow::Result<SwitchboardConfig> {
    let config = SwitchboardConfig::load(Some(path))
        .with_context(|| format!("Failed to load {}", path.display()))?
        .with_env_overrides();
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Initialize the tracing subscriber from logging configuration
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.enable_content_logging {
        eprintln!("WARNING: Content logging is enabled. Turn text will appear in logs.");
        eprintln!("         This may include personal data. Use only for debugging.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_route() {
        let cli = Cli::try_parse_from([
            "switchboard",
            "route",
            "--agent",
            "customer_service",
            "technical",
            "issue",
        ])
        .unwrap();
        match cli.command {
            Commands::Route(args) => {
                assert_eq!(args.agent, "customer_service");
                assert_eq!(args.text, vec!["technical", "issue"]);
                assert_eq!(args.config, PathBuf::from("switchboard.toml"));
                assert!(!args.dispatch);
            }
            _ => panic!("Expected Route command"),
        }
    }

    #[test]
    fn test_cli_route_requires_text() {
        let result = Cli::try_parse_from(["switchboard", "route", "--agent", "sales_specialist"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_agents_json() {
        let cli = Cli::try_parse_from(["switchboard", "agents", "--json", "-c", "x.toml"]).unwrap();
        match cli.command {
            Commands::Agents(args) => {
                assert!(args.json);
                assert_eq!(args.config, PathBuf::from("x.toml"));
            }
            _ => panic!("Expected Agents command"),
        }
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let cli = Cli::try_parse_from(["switchboard", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Validate(_))
        ));
    }

    #[test]
    fn test_load_config_reports_path() {
        let err = load_config(Path::new("/nonexistent/switchboard.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/switchboard.toml"));
    }
}
