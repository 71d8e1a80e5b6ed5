//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface definition for the sparring arena.
///
/// This is the top-level parser that handles global options and dispatches
/// to subcommands.
#[derive(Parser)]
#[command(name = "varena")]
#[command(about = "Spar against LLM personas in scripted social scenarios")]
#[command(version)]
pub struct Cli {
    /// Override the data directory for this invocation
    #[arg(long = "data-dir", global = true, env = "VARENA_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Disable speech synthesis for this invocation
    #[arg(long = "no-voice", global = true)]
    pub no_voice: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["varena", "--verbose", "--no-voice", "scenarios"]);
        assert!(cli.verbose);
        assert!(cli.no_voice);
        assert!(matches!(cli.command, Some(Commands::Scenarios)));
    }

    #[test]
    fn test_play_takes_a_scenario() {
        let cli = Cli::parse_from(["varena", "play", "debate"]);
        match cli.command {
            Some(Commands::Play { scenario }) => {
                assert_eq!(scenario, Some("debate".to_string()));
            }
            _ => panic!("expected play command"),
        }
    }
}
