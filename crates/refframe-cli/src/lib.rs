//! # Refframe-CLI
//!
//! The `refframe` binary: configuration, argument parsing and the
//! subcommands chaining loading, feature extraction, reshaping, testing
//! and plotting.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands, RangeArgs};
pub use config::AnalysisConfig;
