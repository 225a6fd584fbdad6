//! Fundamental types for the reference-frame study.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Study participant identifier as logged by the headset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Locomotion condition of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Movement {
    Standing,
    Walking,
    /// Walking along the circular track
    Circle,
}

impl Movement {
    pub const ALL: [Movement; 3] = [Movement::Standing, Movement::Walking, Movement::Circle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Movement::Standing => "Standing",
            Movement::Walking => "Walking",
            Movement::Circle => "Circle",
        }
    }

    /// Whether the participant was moving along a track
    pub fn is_locomotion(&self) -> bool {
        !matches!(self, Movement::Standing)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Movement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Standing" => Ok(Movement::Standing),
            "Walking" => Ok(Movement::Walking),
            "Circle" => Ok(Movement::Circle),
            other => Err(Error::InvalidInput(format!("unknown movement '{other}'"))),
        }
    }
}

/// Point on the plane of the target ring (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }
}

/// 3D position in the tracking space (meters, Y up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Projection onto the horizontal floor plane as (x, z)
    pub fn ground(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.z)
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }
}

/// Full factorial cell a row belongs to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConditionKey {
    pub participant: ParticipantId,
    pub movement: Movement,
    pub circle_direction: Option<String>,
    pub reference_frame: String,
    pub target_size: String,
}

impl ConditionKey {
    /// Factor labels without the participant, used to identify a block
    pub fn describe(&self) -> String {
        format!(
            "participant {} / {} / {} / {} / {}",
            self.participant,
            self.movement,
            self.reference_frame,
            self.target_size,
            self.circle_direction.as_deref().unwrap_or("-"),
        )
    }
}

/// Access to the condition labels of a logged row
pub trait ConditionLabels {
    fn participant(&self) -> ParticipantId;
    fn movement(&self) -> Movement;
    fn reference_frame(&self) -> &str;
    fn target_size(&self) -> &str;
    fn circle_direction(&self) -> Option<&str>;

    fn condition_key(&self) -> ConditionKey {
        ConditionKey {
            participant: self.participant(),
            movement: self.movement(),
            circle_direction: self
                .circle_direction()
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            reference_frame: self.reference_frame().to_string(),
            target_size: self.target_size().to_string(),
        }
    }
}
