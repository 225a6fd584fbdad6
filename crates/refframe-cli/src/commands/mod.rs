//! Subcommand implementations.
//!
//! Every command computes all of its results before the first file is
//! written, so a failing run leaves the output directory untouched.

pub mod plot;
pub mod posture;
pub mod preprocess;
pub mod stats;
pub mod steps;
pub mod subjective;

use anyhow::Context;

use refframe_io::ParticipantRange;

use crate::cli::RangeArgs;
use crate::config::AnalysisConfig;

/// Participant range of the configuration with command-line overrides
pub fn participant_range(
    config: &AnalysisConfig,
    args: RangeArgs,
) -> anyhow::Result<ParticipantRange> {
    let start = args.start.unwrap_or(config.participants.start);
    let end = args.end.unwrap_or(config.participants.end);
    ParticipantRange::new(start, end).context("invalid participant range")
}
