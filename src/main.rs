use clap::Parser;
use switchboard::cli::{
    handle_agents, handle_completions, handle_config_init, handle_config_validate, handle_route,
    init_tracing, load_config, Cli, Commands, ConfigCommands,
};
use switchboard::registry::Registry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Route(args) => {
            let mut config = load_config(&args.config)?;
            if let Some(level) = &args.log_level {
                config.logging.level = level.clone();
            }
            init_tracing(&config.logging)?;

            println!("{}", handle_route(&args, &config).await?);
        }
        Commands::Agents(args) => {
            let config = load_config(&args.config)?;
            let registry = Registry::from_config(&config)?;
            println!("{}", handle_agents(&args, &registry)?);
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args)?,
            ConfigCommands::Validate(args) => println!("{}", handle_config_validate(&args)?),
        },
        Commands::Completions(args) => handle_completions(&args),
    }

    Ok(())
}
