//! Walking distances and speeds per condition block.
//!
//! The head travels a slightly different distance than the walking
//! anchor that paces the participant; comparing both shows how closely
//! participants followed the intended path.

use serde::{Deserialize, Serialize};
use tracing::debug;

use refframe_core::{condition_blocks, mean, ConditionId, ConditionKey, Movement, TrialSample};

/// Meters per second to kilometers per hour
const MS_TO_KMH: f64 = 3.6;

/// Distances and speeds of one condition block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionSummary {
    pub condition_id: ConditionId,
    pub key: ConditionKey,
    pub head_distance_m: f64,
    pub path_distance_m: f64,
    /// Path distance minus head distance
    pub diff_distance_m: f64,
    pub duration_s: Option<f64>,
    pub head_speed_kmh: Option<f64>,
    pub path_speed_kmh: Option<f64>,
}

/// Mean block speeds of one movement type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSpeed {
    pub movement: Movement,
    pub head_speed_kmh: Option<f64>,
    pub path_speed_kmh: Option<f64>,
    pub conditions: usize,
}

/// Summarise every condition block of a sample sequence, in log order
pub fn locomotion_per_condition(samples: &[TrialSample]) -> Vec<LocomotionSummary> {
    condition_blocks(samples, |s| s.timestamp_ms)
        .into_iter()
        .map(|(condition_id, block)| summarize_block(condition_id, block))
        .collect()
}

fn summarize_block(condition_id: ConditionId, block: &[TrialSample]) -> LocomotionSummary {
    let head_distance_m: f64 = block
        .windows(2)
        .map(|pair| (pair[1].head.ground() - pair[0].head.ground()).norm())
        .sum();

    // Steps with a missing anchor position contribute nothing
    let path_distance_m: f64 = block
        .windows(2)
        .filter_map(|pair| match (pair[0].walking_position, pair[1].walking_position) {
            (Some(a), Some(b)) => Some((b - a).norm()),
            _ => None,
        })
        .sum();

    let duration_s = block
        .iter()
        .filter_map(|s| s.realtime_ms)
        .fold(None, |acc: Option<(f64, f64)>, t| match acc {
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            None => Some((t, t)),
        })
        .map(|(lo, hi)| (hi - lo) * 0.001);

    let speed = |distance: f64| {
        duration_s
            .filter(|d| *d > 0.0)
            .map(|d| distance / d * MS_TO_KMH)
    };

    LocomotionSummary {
        condition_id,
        key: block[0].key.clone(),
        head_distance_m,
        path_distance_m,
        diff_distance_m: path_distance_m - head_distance_m,
        duration_s,
        head_speed_kmh: speed(head_distance_m),
        path_speed_kmh: speed(path_distance_m),
    }
}

/// Mean head and path speed per movement type, in movement order
pub fn mean_speed_by_movement(summaries: &[LocomotionSummary]) -> Vec<MovementSpeed> {
    Movement::ALL
        .iter()
        .filter_map(|movement| {
            let blocks: Vec<&LocomotionSummary> = summaries
                .iter()
                .filter(|s| s.key.movement == *movement)
                .collect();
            if blocks.is_empty() {
                return None;
            }

            let head: Vec<f64> = blocks.iter().filter_map(|s| s.head_speed_kmh).collect();
            let path: Vec<f64> = blocks.iter().filter_map(|s| s.path_speed_kmh).collect();
            debug!("{}: {} blocks with speeds", movement, head.len());

            Some(MovementSpeed {
                movement: *movement,
                head_speed_kmh: mean(&head),
                path_speed_kmh: mean(&path),
                conditions: blocks.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector3};
    use refframe_core::{ParticipantId, Position3D};

    fn sample(movement: Movement, t: f64, realtime: f64, x: f64) -> TrialSample {
        TrialSample {
            key: ConditionKey {
                participant: ParticipantId(7),
                movement,
                circle_direction: None,
                reference_frame: "Path".into(),
                target_size: "0.035".into(),
            },
            timestamp_ms: t,
            realtime_ms: Some(realtime),
            head: Position3D::new(x, 1.7, 0.0),
            floor_y: 0.0,
            target: Position3D::origin(),
            target_forward: Vector3::z(),
            walking_forward: Vector2::x(),
            walking_position: Some(Vector2::new(x * 2.0, 0.0)),
        }
    }

    #[test]
    fn test_block_distances_and_speeds() {
        // 1 m/s for 2 s, then a new block standing still
        let samples = vec![
            sample(Movement::Walking, 0.0, 10_000.0, 0.0),
            sample(Movement::Walking, 1000.0, 11_000.0, 1.0),
            sample(Movement::Walking, 2000.0, 12_000.0, 2.0),
            sample(Movement::Standing, 0.0, 13_000.0, 5.0),
            sample(Movement::Standing, 1000.0, 14_000.0, 5.0),
        ];

        let blocks = locomotion_per_condition(&samples);
        assert_eq!(blocks.len(), 2);

        let walking = &blocks[0];
        assert!((walking.head_distance_m - 2.0).abs() < 1e-12);
        assert!((walking.path_distance_m - 4.0).abs() < 1e-12);
        assert!((walking.diff_distance_m - 2.0).abs() < 1e-12);
        assert!((walking.duration_s.unwrap() - 2.0).abs() < 1e-12);
        assert!((walking.head_speed_kmh.unwrap() - 3.6).abs() < 1e-12);
        assert!((walking.path_speed_kmh.unwrap() - 7.2).abs() < 1e-12);

        // The jump to x = 5 belongs to no block
        assert!(blocks[1].head_distance_m.abs() < 1e-12);

        let speeds = mean_speed_by_movement(&blocks);
        assert_eq!(speeds.len(), 2);
        assert_eq!(speeds[0].movement, Movement::Standing);
        assert_eq!(speeds[1].movement, Movement::Walking);
        assert!((speeds[1].head_speed_kmh.unwrap() - 3.6).abs() < 1e-12);
    }

    #[test]
    fn test_missing_clock_gives_no_speed() {
        let mut samples = vec![
            sample(Movement::Circle, 0.0, 0.0, 0.0),
            sample(Movement::Circle, 10.0, 0.0, 1.0),
        ];
        for s in &mut samples {
            s.realtime_ms = None;
        }
        let blocks = locomotion_per_condition(&samples);
        assert_eq!(blocks[0].duration_s, None);
        assert_eq!(blocks[0].head_speed_kmh, None);
        assert!((blocks[0].head_distance_m - 1.0).abs() < 1e-12);
    }
}
