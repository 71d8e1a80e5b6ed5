//! CLI entry point - the composition root.
//!
//! Parses arguments, initializes logging, wires the engine via bootstrap,
//! and dispatches to the interactive loop.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use varena_cli::{Cli, CliConfig, Commands, bootstrap, play};
use varena_core::ScenarioCatalog;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Scenarios) => {
            // Listing needs no back-ends, so skip the probe.
            play::list_scenarios(&ScenarioCatalog::builtin().list());
            Ok(())
        }
        Some(Commands::Play { scenario }) => {
            let config = CliConfig::resolve(cli.data_dir, cli.no_voice)?;
            let ctx = bootstrap(config).await?;
            play::run(&ctx, scenario).await
        }
        None => {
            let config = CliConfig::resolve(cli.data_dir, cli.no_voice)?;
            let ctx = bootstrap(config).await?;
            play::run(&ctx, None).await
        }
    }
}
