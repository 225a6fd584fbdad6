//! Typed rows of the two logs: high-frequency pose samples and selections.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::types::{ConditionKey, ConditionLabels, Movement, ParticipantId, Position2D, Position3D};

/// One frame of head and target telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSample {
    pub key: ConditionKey,
    /// Clock restarted at the beginning of every condition block
    pub timestamp_ms: f64,
    /// Application clock, monotonic across the whole session
    pub realtime_ms: Option<f64>,
    pub head: Position3D,
    /// Height of the floor track the participant walks on
    pub floor_y: f64,
    /// Center of the target ring
    pub target: Position3D,
    pub target_forward: Vector3<f64>,
    /// Walking direction on the floor plane as (x, z)
    pub walking_forward: Vector2<f64>,
    /// Position of the walking-direction anchor as (x, z)
    pub walking_position: Option<Vector2<f64>>,
}

/// One discrete pointing attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub key: ConditionKey,
    pub active_target_index: Option<i64>,
    pub target: Position2D,
    pub selection: Position2D,
    pub success: bool,
    /// Time since the previous selection; zero for the bootstrap selection
    pub duration_ms: f64,
}

macro_rules! keyed_labels {
    ($ty:ty) => {
        impl ConditionLabels for $ty {
            fn participant(&self) -> ParticipantId {
                self.key.participant
            }
            fn movement(&self) -> Movement {
                self.key.movement
            }
            fn reference_frame(&self) -> &str {
                &self.key.reference_frame
            }
            fn target_size(&self) -> &str {
                &self.key.target_size
            }
            fn circle_direction(&self) -> Option<&str> {
                self.key.circle_direction.as_deref()
            }
            fn condition_key(&self) -> ConditionKey {
                self.key.clone()
            }
        }
    };
}

keyed_labels!(TrialSample);
keyed_labels!(SelectionEvent);
