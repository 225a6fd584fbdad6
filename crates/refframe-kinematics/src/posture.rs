//! Posture of the target ring relative to the participant's head.
//!
//! ## Features
//!
//! All lengths are meters, all angles degrees.
//!
//! - **ParticipantHeight**: head height above the floor track
//! - **Decline**: how far the targets sit below the head
//! - **Depth**: head-to-target distance along the walking direction
//! - **LateralShift**: signed sideways offset, negative to the left
//! - **DeclineAngle** / **LateralShiftAngle**: the two offsets seen from
//!   the head, `atan(offset / Depth)`
//! - **RelativeTargetPitch** / **RelativeTargetYaw**: how much the target
//!   face is tilted away from the line of sight
//!
//! Values that are undefined for a sample (zero-length directions, head on
//! the target, zero depth) are `None`.

use std::collections::BTreeMap;

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use refframe_core::{
    atan_ratio_deg, cross_z, mean_defined, normalized, project_onto_axis, reject_from_plane,
    world_up, Factor, FactorLevels, ParticipantId, Position3D, TrialSample,
};

/// Posture features of one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureFeatures {
    pub participant_height: f64,
    pub decline: f64,
    pub depth: Option<f64>,
    pub lateral_shift: Option<f64>,
    pub decline_angle: Option<f64>,
    pub lateral_shift_angle: Option<f64>,
    pub relative_target_pitch: Option<f64>,
    pub relative_target_yaw: Option<f64>,
}

impl PostureFeatures {
    pub fn from_sample(sample: &TrialSample) -> Self {
        let participant_height = sample.head.y - sample.floor_y;
        let decline = participant_height - sample.target.y;

        let offsets = ground_offsets(&sample.head, &sample.target, &sample.walking_forward);
        let depth = offsets.map(|(depth, _)| depth);
        let lateral_shift = offsets.map(|(_, shift)| shift);

        let decline_angle = depth.and_then(|d| atan_ratio_deg(decline, d));
        let lateral_shift_angle = offsets.and_then(|(d, shift)| atan_ratio_deg(shift, d));

        Self {
            participant_height,
            decline,
            depth,
            lateral_shift,
            decline_angle,
            lateral_shift_angle,
            relative_target_pitch: relative_target_pitch(
                &sample.head,
                &sample.target,
                &sample.target_forward,
            ),
            relative_target_yaw: relative_target_yaw(
                &sample.head,
                &sample.target,
                &sample.target_forward,
            ),
        }
    }
}

/// Depth and signed lateral shift of the target on the floor plane.
///
/// The head-to-target vector is split into its projection onto the walking
/// direction (depth) and the perpendicular rest (lateral shift). The shift
/// is negative when the rest lies to the left of the walking direction.
pub fn ground_offsets(
    head: &Position3D,
    target: &Position3D,
    walking_forward: &Vector2<f64>,
) -> Option<(f64, f64)> {
    let head_to_target = target.ground() - head.ground();
    let along = project_onto_axis(&head_to_target, walking_forward)?;
    let perpendicular = head_to_target - along;

    let magnitude = perpendicular.norm();
    let shift = if cross_z(walking_forward, &perpendicular) > 0.0 {
        -magnitude
    } else {
        magnitude
    };

    Some((along.norm(), shift))
}

/// Line of sight from the target to the head and the target's facing
fn sight_and_facing(
    head: &Position3D,
    target: &Position3D,
    target_forward: &Vector3<f64>,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let sight = normalized(&(head.to_vector() - target.to_vector()))?;
    let facing = normalized(&(-target_forward))?;
    Some((sight, facing))
}

/// Tilt of the target face in the vertical plane through the line of sight.
///
/// Positive when the face points above the head.
pub fn relative_target_pitch(
    head: &Position3D,
    target: &Position3D,
    target_forward: &Vector3<f64>,
) -> Option<f64> {
    let (sight, facing) = sight_and_facing(head, target, target_forward)?;
    let normal = normalized(&sight.cross(&world_up()))?;
    let in_plane = normalized(&reject_from_plane(&facing, &normal))?;

    let pitch = sight.dot(&in_plane).clamp(-1.0, 1.0).acos().to_degrees();
    Some(if in_plane.y > sight.y { pitch } else { -pitch })
}

/// Turn of the target face in the plane spanned by the line of sight and
/// the horizontal normal.
pub fn relative_target_yaw(
    head: &Position3D,
    target: &Position3D,
    target_forward: &Vector3<f64>,
) -> Option<f64> {
    let (sight, facing) = sight_and_facing(head, target, target_forward)?;
    let side = normalized(&sight.cross(&world_up()))?;
    let normal = normalized(&side.cross(&sight))?;
    let in_plane = normalized(&reject_from_plane(&facing, &normal))?;

    let yaw = sight.dot(&in_plane).clamp(-1.0, 1.0).acos().to_degrees();
    Some(if in_plane.dot(&side) > 0.0 { yaw } else { -yaw })
}

/// Mean posture of one participant under one reference frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureSummary {
    #[serde(rename = "ParticipantID")]
    pub participant: ParticipantId,
    #[serde(rename = "ReferenceFrame")]
    pub reference_frame: String,
    #[serde(rename = "ParticipantHeight")]
    pub participant_height: Option<f64>,
    #[serde(rename = "Decline")]
    pub decline: Option<f64>,
    #[serde(rename = "Depth")]
    pub depth: Option<f64>,
    #[serde(rename = "LateralShift")]
    pub lateral_shift: Option<f64>,
    #[serde(rename = "DeclineAngle")]
    pub decline_angle: Option<f64>,
    #[serde(rename = "LateralShiftAngle")]
    pub lateral_shift_angle: Option<f64>,
    #[serde(rename = "RelativeTargetPitch")]
    pub relative_target_pitch: Option<f64>,
    #[serde(rename = "RelativeTargetYaw")]
    pub relative_target_yaw: Option<f64>,
    #[serde(rename = "Samples")]
    pub samples: usize,
}

impl PostureSummary {
    /// Average the features of all moving samples per participant and
    /// reference frame. Undefined values are skipped, not zero-filled.
    pub fn by_reference_frame(samples: &[TrialSample], levels: &FactorLevels) -> Vec<Self> {
        let mut groups: BTreeMap<(ParticipantId, String), Vec<PostureFeatures>> = BTreeMap::new();

        for sample in samples.iter().filter(|s| s.key.movement.is_locomotion()) {
            groups
                .entry((sample.key.participant, sample.key.reference_frame.clone()))
                .or_default()
                .push(PostureFeatures::from_sample(sample));
        }

        let mut summaries: Vec<Self> = groups
            .into_iter()
            .map(|((participant, reference_frame), features)| {
                Self::from_features(participant, reference_frame, &features)
            })
            .collect();

        summaries.sort_by(|a, b| {
            a.participant.cmp(&b.participant).then_with(|| {
                levels.compare(Factor::ReferenceFrame, &a.reference_frame, &b.reference_frame)
            })
        });

        debug!("Summarised posture into {} rows", summaries.len());
        summaries
    }

    fn from_features(
        participant: ParticipantId,
        reference_frame: String,
        features: &[PostureFeatures],
    ) -> Self {
        let avg = |f: fn(&PostureFeatures) -> Option<f64>| mean_defined(features.iter().map(f));

        Self {
            participant,
            reference_frame,
            participant_height: avg(|p| Some(p.participant_height)),
            decline: avg(|p| Some(p.decline)),
            depth: avg(|p| p.depth),
            lateral_shift: avg(|p| p.lateral_shift),
            decline_angle: avg(|p| p.decline_angle),
            lateral_shift_angle: avg(|p| p.lateral_shift_angle),
            relative_target_pitch: avg(|p| p.relative_target_pitch),
            relative_target_yaw: avg(|p| p.relative_target_yaw),
            samples: features.len(),
        }
    }
}
