//! Analysis configuration.
//!
//! Values come from the built-in defaults, an optional TOML/YAML/JSON file
//! and `REFFRAME_*` environment variables (nested keys separated by `__`,
//! e.g. `REFFRAME_PARTICIPANTS__END=12`), in that order of precedence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use refframe_core::FactorLevels;
use refframe_io::{DesignExpectations, ParticipantRange};
use refframe_kinematics::StepFrequencyConfig;
use refframe_pointing::{OutlierPolicy, EFFECTIVE_WIDTH_FACTOR};
use refframe_stats::DEFAULT_DELIMITER;

const ENV_PREFIX: &str = "REFFRAME";

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Participants to load
    pub participants: ParticipantRange,

    /// Declared level order of every factor
    pub levels: FactorLevels,

    /// Expected shape of the selection logs
    pub design: DesignExpectations,

    pub steps: StepFrequencyConfig,

    pub outliers: OutlierPolicy,

    /// Multiplier turning SDx into the effective width
    pub width_factor: f64,

    /// Separator of wide column names
    pub delimiter: String,

    /// Directory receiving every output file
    pub output_dir: PathBuf,

    /// `Rscript` executable used for ART ANOVA
    pub rscript: PathBuf,

    /// Significance level for reporting
    pub alpha: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            participants: ParticipantRange::default(),
            levels: FactorLevels::default(),
            design: DesignExpectations::default(),
            steps: StepFrequencyConfig::default(),
            outliers: OutlierPolicy::keep_all(),
            width_factor: EFFECTIVE_WIDTH_FACTOR,
            delimiter: DEFAULT_DELIMITER.to_string(),
            output_dir: PathBuf::from("."),
            rscript: PathBuf::from("Rscript"),
            alpha: 0.05,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Reject values no command can work with
    pub fn validate(&self) -> refframe_core::Result<()> {
        ParticipantRange::new(self.participants.start, self.participants.end)?;
        self.levels.validate()?;
        self.steps.validate()?;
        if self.delimiter.is_empty() {
            return Err(refframe_core::Error::Config("delimiter must not be empty".into()));
        }
        if !(self.width_factor.is_finite() && self.width_factor > 0.0) {
            return Err(refframe_core::Error::Config(format!(
                "width factor must be positive, got {}",
                self.width_factor
            )));
        }
        if !(0.0..1.0).contains(&self.alpha) {
            return Err(refframe_core::Error::Config(format!(
                "alpha must lie in [0, 1), got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.participants, ParticipantRange { start: 5, end: 28 });
        assert_eq!(config.outliers.max_error_m, None);
        assert_eq!(config.delimiter, "_");
        assert!((config.width_factor - 4.133).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refframe.toml");
        fs::write(
            &path,
            "width_factor = 2.066\n\n[participants]\nstart = 1\nend = 3\n\n[outliers]\nmax_error_m = 0.08\n",
        )
        .unwrap();

        let config = AnalysisConfig::load(Some(&path)).unwrap();
        assert_eq!(config.participants, ParticipantRange { start: 1, end: 3 });
        assert_eq!(config.outliers.max_error_m, Some(0.08));
        assert!((config.width_factor - 2.066).abs() < 1e-12);
        // Untouched sections keep their defaults
        assert_eq!(config.design, DesignExpectations::default());
        assert_eq!(config.steps, StepFrequencyConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.delimiter.clear();
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.participants = ParticipantRange { start: 9, end: 3 };
        assert!(config.validate().is_err());
    }
}
