//! # Refframe-Plot
//!
//! Box plots of the dependent variables with significance brackets.
//!
//! Boxes are ordered by the declared factor levels, whiskers span the full
//! range, the mean is marked with a cross and brackets carry star labels.

pub mod boxstats;
pub mod renderer;

pub use boxstats::*;
pub use renderer::{brackets, layout, BoxPlotRenderer, BoxPlotSpec, BoxSlot, Bracket};
