//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start a sparring session (default command)
    Play {
        /// Scenario id; prompted interactively when omitted
        scenario: Option<String>,
    },

    /// List the available scenarios
    Scenarios,
}
