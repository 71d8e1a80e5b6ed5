//! Terminal front-end for the varena sparring engine.

pub mod archive;
pub mod bootstrap;
pub mod commands;
pub mod parser;
pub mod play;

pub use archive::FsSummaryArchive;
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use parser::Cli;
