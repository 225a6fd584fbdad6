//! # Refframe-Kinematics
//!
//! Features derived from the high-frequency head and target telemetry.
//!
//! ## Modules
//!
//! - `posture`: where the targets sit relative to the head (decline,
//!   depth, lateral shift, their angles, relative pitch and yaw)
//! - `steps`: step frequency from the vertical head oscillation
//! - `locomotion`: walked distances and speeds per condition block

pub mod locomotion;
pub mod posture;
pub mod steps;

pub use locomotion::{locomotion_per_condition, mean_speed_by_movement, LocomotionSummary, MovementSpeed};
pub use posture::{
    ground_offsets, relative_target_pitch, relative_target_yaw, PostureFeatures, PostureSummary,
};
pub use steps::{ConditionStepFrequency, StepFrequency, StepFrequencyConfig, StepFrequencyEstimator};
