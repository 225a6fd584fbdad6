//! refframe - analysis pipeline of the reference-frame placement study

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use refframe_cli::commands;
use refframe_cli::{AnalysisConfig, Cli, Commands};
use refframe_core::Factor;
use refframe_io::SubjectiveItem;
use refframe_pointing::{DependentVariable, OutlierPolicy};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = AnalysisConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.validate()?;
    debug!("Configuration: {:?}", config);

    let output_dir = cli.output.clone().unwrap_or_else(|| config.output_dir.clone());

    match cli.command {
        Commands::Preprocess {
            dir,
            range,
            max_error,
        } => {
            let range = commands::participant_range(&config, range)?;
            let policy = match max_error {
                Some(max) => OutlierPolicy {
                    max_error_m: Some(max),
                },
                None => config.outliers,
            };
            info!("Preprocessing participants {}", range.label());
            commands::preprocess::run(&dir, range, policy, &config, &output_dir)?;
        }
        Commands::Posture { dir, range } => {
            let range = commands::participant_range(&config, range)?;
            info!("Posture features of participants {}", range.label());
            commands::posture::run(&dir, range, &config, &output_dir)?;
        }
        Commands::Steps {
            files,
            window,
            per_condition,
        } => {
            let mut steps = config.steps.clone();
            if let Some(window) = window {
                steps.window = window;
            }
            commands::steps::run(&files, steps, per_condition)?;
        }
        Commands::Stats {
            long_csv,
            dependent,
            skip_normality,
        } => {
            let dependent: DependentVariable = dependent.parse()?;
            commands::stats::run(&long_csv, dependent, skip_normality, &config, &output_dir)?;
        }
        Commands::Plot {
            long_csv,
            dependent,
            x_factor,
            hue,
        } => {
            let dependent: DependentVariable = dependent.parse()?;
            let x_factor: Factor = x_factor.parse()?;
            let hue = hue.map(|h| h.parse::<Factor>()).transpose()?;
            commands::plot::run(&long_csv, dependent, x_factor, hue, &config, &output_dir)?;
        }
        Commands::Subjective { csv, item } => {
            let item: SubjectiveItem = item.parse()?;
            commands::subjective::run(&csv, item, &config, &output_dir)?;
        }
    }

    Ok(())
}
