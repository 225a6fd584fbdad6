//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Analysis pipeline of the reference-frame placement study
#[derive(Parser, Debug)]
#[command(name = "refframe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for output files, overrides the configuration
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

/// Participant range overrides
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RangeArgs {
    /// First participant id
    #[arg(long)]
    pub start: Option<u32>,

    /// Last participant id (inclusive)
    #[arg(long)]
    pub end: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Throughput summaries from the selection logs (wide and long CSV)
    Preprocess {
        /// Directory holding `{id}_selections.csv`
        dir: PathBuf,

        #[command(flatten)]
        range: RangeArgs,

        /// Discard selections whose error is at least this many meters
        #[arg(long)]
        max_error: Option<f64>,
    },

    /// Posture features per participant and reference frame
    Posture {
        /// Directory holding `{id}_highFrequency.csv`
        dir: PathBuf,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Step cadence and walking speeds of high-frequency logs
    Steps {
        /// High-frequency log files, concatenated in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rolling-minimum window in samples
        #[arg(long)]
        window: Option<usize>,

        /// Also report every condition block
        #[arg(long)]
        per_condition: bool,
    },

    /// ART ANOVA and normality checks of one dependent variable
    Stats {
        /// Long summary CSV written by `preprocess`
        long_csv: PathBuf,

        /// Dependent variable column
        #[arg(short, long, default_value = "TP")]
        dependent: String,

        /// Skip the Shapiro-Wilk tests
        #[arg(long)]
        skip_normality: bool,
    },

    /// Box plot of one dependent variable
    Plot {
        /// Long summary CSV written by `preprocess`
        long_csv: PathBuf,

        /// Dependent variable column
        #[arg(short, long, default_value = "TP")]
        dependent: String,

        /// Factor on the x axis
        #[arg(short = 'x', long, default_value = "Movement")]
        x_factor: String,

        /// Factor distinguishing boxes within an x level
        #[arg(long)]
        hue: Option<String>,
    },

    /// Friedman and Wilcoxon tests of the questionnaire
    Subjective {
        /// Semicolon-delimited questionnaire export
        csv: PathBuf,

        /// Item to plot
        #[arg(short, long, default_value = "Preference")]
        item: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
