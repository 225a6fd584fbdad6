//! Column schemas of the headset logs.
//!
//! Only the columns used by the analysis are declared; the logger writes
//! many more (hand anchors, quaternions, neck model) which are ignored.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Deserializer, Serialize};

use refframe_core::{
    ConditionLabels, Movement, ParticipantId, Position2D, Position3D, SelectionEvent,
    TrialSample,
};

/// Row of `{id}_selections.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRecord {
    #[serde(rename = "ParticipantID")]
    pub participant: ParticipantId,
    #[serde(rename = "Movement", alias = "Context")]
    pub movement: Movement,
    #[serde(rename = "CircleDirection", default)]
    pub circle_direction: Option<String>,
    #[serde(rename = "ReferenceFrame")]
    pub reference_frame: String,
    #[serde(rename = "TargetSize")]
    pub target_size: String,
    #[serde(rename = "ActiveTargetIndex", default)]
    pub active_target_index: Option<i64>,
    #[serde(rename = "AbsoluteTargetPositionX")]
    pub target_x: f64,
    #[serde(rename = "AbsoluteTargetPositionY")]
    pub target_y: f64,
    #[serde(rename = "AbsoluteSelectionPositionX")]
    pub selection_x: f64,
    #[serde(rename = "AbsoluteSelectionPositionY")]
    pub selection_y: f64,
    #[serde(rename = "Success", deserialize_with = "deserialize_flag")]
    pub success: bool,
    #[serde(rename = "SelectionDuration")]
    pub selection_duration_ms: f64,
}

impl SelectionRecord {
    pub fn to_event(&self) -> SelectionEvent {
        SelectionEvent {
            key: self.condition_key(),
            active_target_index: self.active_target_index,
            target: Position2D::new(self.target_x, self.target_y),
            selection: Position2D::new(self.selection_x, self.selection_y),
            success: self.success,
            duration_ms: self.selection_duration_ms,
        }
    }
}

/// Row of `{id}_highFrequency.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighFrequencyRecord {
    #[serde(rename = "ParticipantID")]
    pub participant: ParticipantId,
    #[serde(rename = "Movement", alias = "Context")]
    pub movement: Movement,
    #[serde(rename = "CircleDirection", default)]
    pub circle_direction: Option<String>,
    #[serde(rename = "ReferenceFrame")]
    pub reference_frame: String,
    #[serde(rename = "TargetSize")]
    pub target_size: String,
    #[serde(rename = "SystemClockTimestampMs")]
    pub system_clock_ms: f64,
    #[serde(rename = "RealtimeSinceStartupMs", default)]
    pub realtime_since_startup_ms: Option<f64>,
    #[serde(rename = "HeadPositionX")]
    pub head_x: f64,
    #[serde(rename = "HeadPositionY")]
    pub head_y: f64,
    #[serde(rename = "HeadPositionZ")]
    pub head_z: f64,
    #[serde(rename = "TrackPositionY")]
    pub track_y: f64,
    #[serde(rename = "AllTargetsPositionX")]
    pub targets_x: f64,
    #[serde(rename = "AllTargetsPositionY")]
    pub targets_y: f64,
    #[serde(rename = "AllTargetsPositionZ")]
    pub targets_z: f64,
    #[serde(rename = "AllTargetsForwardX")]
    pub targets_forward_x: f64,
    #[serde(rename = "AllTargetsForwardY")]
    pub targets_forward_y: f64,
    #[serde(rename = "AllTargetsForwardZ")]
    pub targets_forward_z: f64,
    #[serde(rename = "WalkingDirectionForwardX")]
    pub walking_forward_x: f64,
    #[serde(rename = "WalkingDirectionForwardZ")]
    pub walking_forward_z: f64,
    #[serde(rename = "WalkingDirectionPositionX", default)]
    pub walking_position_x: Option<f64>,
    #[serde(rename = "WalkingDirectionPositionZ", default)]
    pub walking_position_z: Option<f64>,
}

impl HighFrequencyRecord {
    pub fn to_sample(&self) -> TrialSample {
        let walking_position = match (self.walking_position_x, self.walking_position_z) {
            (Some(x), Some(z)) => Some(Vector2::new(x, z)),
            _ => None,
        };

        TrialSample {
            key: self.condition_key(),
            timestamp_ms: self.system_clock_ms,
            realtime_ms: self.realtime_since_startup_ms,
            head: Position3D::new(self.head_x, self.head_y, self.head_z),
            floor_y: self.track_y,
            target: Position3D::new(self.targets_x, self.targets_y, self.targets_z),
            target_forward: Vector3::new(
                self.targets_forward_x,
                self.targets_forward_y,
                self.targets_forward_z,
            ),
            walking_forward: Vector2::new(self.walking_forward_x, self.walking_forward_z),
            walking_position,
        }
    }
}

macro_rules! record_labels {
    ($ty:ty) => {
        impl ConditionLabels for $ty {
            fn participant(&self) -> ParticipantId {
                self.participant
            }
            fn movement(&self) -> Movement {
                self.movement
            }
            fn reference_frame(&self) -> &str {
                &self.reference_frame
            }
            fn target_size(&self) -> &str {
                &self.target_size
            }
            fn circle_direction(&self) -> Option<&str> {
                self.circle_direction.as_deref()
            }
        }
    };
}

record_labels!(SelectionRecord);
record_labels!(HighFrequencyRecord);

/// Accept the flag spellings the logger and spreadsheet exports produce
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "1" | "1.0" | "True" | "true" | "TRUE" => Ok(true),
        "0" | "0.0" | "False" | "false" | "FALSE" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid success flag '{other}'"
        ))),
    }
}
