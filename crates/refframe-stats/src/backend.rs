//! Interface to the external statistics engine.
//!
//! Aligned-rank-transform ANOVA and its contrasts are not re-implemented
//! here; a [`StatisticalBackend`] runs them and hands back typed tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use refframe_core::{Error, Factor, Result};

use crate::reshape::LongTable;

/// Random-intercept column of every model
pub const SUBJECT_COLUMN: &str = "ParticipantID";

/// Full-factorial ART model with a random intercept per participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtFormula {
    pub dependent: String,
    pub factors: Vec<Factor>,
    /// Interaction terms to run contrasts on, e.g. Movement:ReferenceFrame
    pub contrasts: Vec<Vec<Factor>>,
}

impl ArtFormula {
    pub fn new(dependent: impl Into<String>, factors: Vec<Factor>) -> Self {
        Self {
            dependent: dependent.into(),
            factors,
            contrasts: Vec::new(),
        }
    }

    pub fn with_contrast(mut self, term: Vec<Factor>) -> Self {
        self.contrasts.push(term);
        self
    }

    /// `Movement:ReferenceFrame` style term name
    pub fn term_name(term: &[Factor]) -> String {
        term.iter()
            .map(|f| f.column_name())
            .collect::<Vec<_>>()
            .join(":")
    }

    pub fn validate(&self) -> Result<()> {
        if self.factors.is_empty() {
            return Err(Error::InvalidInput("ART model needs at least one factor".into()));
        }
        if !is_identifier(&self.dependent) {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a usable model column name",
                self.dependent
            )));
        }
        for term in &self.contrasts {
            if term.is_empty() || term.iter().any(|f| !self.factors.contains(f)) {
                return Err(Error::InvalidInput(format!(
                    "contrast term '{}' is not part of the model",
                    Self::term_name(term)
                )));
            }
        }
        Ok(())
    }

    /// The model must describe the columns of `table`
    pub fn check_table(&self, table: &LongTable) -> Result<()> {
        let column = table.dependent.column_name();
        if self.dependent != column {
            return Err(Error::InvalidInput(format!(
                "model dependent '{}' does not match table column '{}'",
                self.dependent, column
            )));
        }
        if let Some(factor) = self.factors.iter().find(|f| !table.factors.contains(f)) {
            return Err(Error::InvalidInput(format!(
                "model factor {factor} is not a column of the {column} table"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ArtFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factors: Vec<&str> = self.factors.iter().map(|f| f.column_name()).collect();
        write!(
            f,
            "{} ~ {} + (1|{})",
            self.dependent,
            factors.join("*"),
            SUBJECT_COLUMN
        )
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// One row of the ANOVA table on aligned ranks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    pub term: String,
    pub f: f64,
    pub df: f64,
    pub df_res: f64,
    pub p: f64,
}

/// One pairwise contrast of an interaction term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastRow {
    pub term: String,
    pub contrast: String,
    pub estimate: f64,
    pub se: f64,
    pub df: f64,
    pub t: f64,
    pub p: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtReport {
    pub formula: String,
    pub anova: Vec<AnovaRow>,
    pub contrasts: Vec<ContrastRow>,
}

impl ArtReport {
    pub fn significant_terms(&self, alpha: f64) -> impl Iterator<Item = &AnovaRow> {
        self.anova.iter().filter(move |row| row.p <= alpha)
    }
}

/// Shapiro-Wilk result of one condition cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    pub condition: String,
    pub n: usize,
    /// Undefined for fewer than three or constant values
    pub w: Option<f64>,
    pub p: Option<f64>,
}

/// Engine that runs the tests this crate does not implement natively
pub trait StatisticalBackend {
    fn name(&self) -> &str;

    fn aligned_rank_anova(&self, table: &LongTable, formula: &ArtFormula) -> Result<ArtReport>;

    /// Normality of the dependent value within every condition cell
    fn shapiro_wilk(&self, table: &LongTable) -> Result<Vec<NormalityResult>>;
}
