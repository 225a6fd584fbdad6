//! # Refframe-Stats
//!
//! Reshaping and hypothesis testing of the per-condition summaries.
//!
//! ## Tables
//!
//! - **Long**: one row per participant and condition tuple with a single
//!   dependent value, the input of the aligned rank transform
//! - **Wide**: one row per participant, one column per variable and
//!   condition tuple (`TP_Walking_Palm_0.025`)
//!
//! ## Tests
//!
//! ART ANOVA, its interaction contrasts and the Shapiro-Wilk checks run in
//! R behind [`StatisticalBackend`]. The Friedman and Wilcoxon signed-rank
//! tests used for the questionnaire are computed natively.

pub mod backend;
pub mod friedman;
pub mod ranking;
pub mod report;
pub mod reshape;
pub mod rscript;
pub mod wilcoxon;

pub use backend::*;
pub use friedman::{friedman_test, FriedmanResult};
pub use report::{to_json, write_json, ItemReport, StatsReport};
pub use reshape::*;
pub use rscript::RscriptBackend;
pub use wilcoxon::{pairwise_wilcoxon, wilcoxon_signed_rank, PairwiseComparison, WilcoxonMethod, WilcoxonResult};
