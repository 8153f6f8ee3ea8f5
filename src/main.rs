// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use commands::BrewOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "kettle", &mut std::io::stdout());
        return Ok(());
    }

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { formula } => commands::cmd_info(&formula),
        Commands::Check {
            formula,
            platform,
            host_prefix,
        } => commands::cmd_check(&formula, config, platform, host_prefix),
        Commands::Plan {
            formula,
            target,
            json,
        } => commands::cmd_plan(&formula, config, &target, json),
        Commands::Brew {
            formula,
            target,
            source_cache,
            jobs,
            keep_builddir,
            fetch_only,
        } => commands::cmd_brew(
            &formula,
            config,
            &target,
            BrewOptions {
                source_cache,
                jobs,
                keep_builddir,
                fetch_only,
            },
        ),
        Commands::Caveats { formula, prefix } => commands::cmd_caveats(&formula, &config, prefix),
        Commands::Test { formula, prefix } => commands::cmd_test(&formula, config, prefix),
        Commands::Completions { .. } => Ok(()),
    }
}
