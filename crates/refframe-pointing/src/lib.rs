//! # Refframe-Pointing
//!
//! Pointing performance of the target selections.
//!
//! Each selection is decomposed into its overshoot along the movement axis
//! (`dx`) and its effective amplitude (`ae`); per condition the spread of
//! `dx` gives the effective target width and, together with the movement
//! time, the effective throughput.

pub mod fitts;
pub mod outliers;
pub mod throughput;

pub use fitts::{derive_trials, PointingTrial, SelectionTriangle};
pub use outliers::{OutlierPolicy, OutlierReport, DEFAULT_MAX_ERROR_M};
pub use throughput::{
    circle_direction_counts, summarize, ConditionSummary, DependentVariable,
    ReferenceFrameOverview, EFFECTIVE_WIDTH_FACTOR,
};
