//! # Refframe-Core
//!
//! Core types and utilities for analysing the reference-frame placement
//! study: participants walk, circle or stand while selecting targets that
//! are anchored to the palm, the palm without rotation, or the walking path.
//!
//! ## Contents
//!
//! - **Errors**: one error type shared by every analysis crate
//! - **Types**: participant ids, movement types, condition keys, positions
//! - **Samples**: typed pose samples and selection events
//! - **Geometry**: guarded vector helpers on top of `nalgebra`
//! - **Factors**: the declared level order of every experimental factor
//! - **Conditions**: condition-block segmentation by timestamp resets
//! - **Stats**: descriptive statistics shared by the extractors

pub mod conditions;
pub mod error;
pub mod factors;
pub mod geometry;
pub mod samples;
pub mod stats;
pub mod types;

pub use conditions::*;
pub use error::{Error, Result};
pub use factors::*;
pub use geometry::*;
pub use samples::*;
pub use stats::*;
pub use types::*;
