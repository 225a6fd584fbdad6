//! Error types for the reference-frame analysis pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("No data files found in {dir} for participants {start}-{end}")]
    NoParticipantData { dir: PathBuf, start: u32, end: u32 },

    #[error("Expected {expected} levels of {factor}, found {actual}")]
    MissingFactorLevels {
        factor: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unbalanced design: {factor} level '{level}' has {rows} rows, not a multiple of {multiple}")]
    UnbalancedDesign {
        factor: &'static str,
        level: String,
        rows: usize,
        multiple: usize,
    },

    #[error("{factor} levels not declared in the configuration: {labels}")]
    UndeclaredLevels { factor: &'static str, labels: String },

    #[error("Duplicate condition block: {runs} runs for {distinct} distinct conditions (repeated: {repeated})")]
    DuplicateConditionBlock {
        runs: usize,
        distinct: usize,
        repeated: String,
    },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Statistics backend error: {0}")]
    Statistics(String),

    #[error("Plot error: {0}")]
    Plot(String),
}

impl Error {
    /// Structural validation failures of the study design.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingFactorLevels { .. }
                | Error::UnbalancedDesign { .. }
                | Error::DuplicateConditionBlock { .. }
                | Error::UndeclaredLevels { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        let err = Error::MissingFactorLevels {
            factor: "TargetSize",
            expected: 4,
            actual: 3,
        };
        assert!(err.is_validation());
        assert!(!Error::Io("disk".into()).is_validation());
        assert_eq!(err.to_string(), "Expected 4 levels of TargetSize, found 3");
    }
}
