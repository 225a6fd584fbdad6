//! Machine-readable test reports.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use refframe_core::{Error, Result};

use crate::backend::{ArtReport, NormalityResult};
use crate::friedman::FriedmanResult;
use crate::wilcoxon::PairwiseComparison;

/// Everything the backend produced for one dependent variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub dependent: String,
    pub backend: String,
    pub normality: Vec<NormalityResult>,
    pub art: ArtReport,
}

/// Friedman test and pairwise follow-ups of one questionnaire item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReport {
    pub item: String,
    pub respondents: usize,
    /// `None` when the item is tied for every respondent
    pub friedman: Option<FriedmanResult>,
    pub pairwise: Vec<PairwiseComparison>,
}

pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| Error::InvalidInput(format!("report is not serializable: {e}")))
}

pub fn write_json<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let json = to_json(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    info!("Wrote report to {}", path.display());
    Ok(())
}
