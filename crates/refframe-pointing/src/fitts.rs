//! Per-selection error decomposition.
//!
//! Every selection forms a triangle with the previous target and the
//! current target:
//!
//! ```text
//! a = |previous target - target|      (movement amplitude)
//! b = |target - selection|            (selection error)
//! c = |previous target - selection|   (distance actually covered)
//!
//! dx = (c² - b² - a²) / (2a)          (overshoot along the movement axis)
//! ae = a + dx                         (effective amplitude)
//! ```
//!
//! The selection positions are logged in the plane of the target ring, so
//! only X and Y are used.

use serde::{Deserialize, Serialize};
use tracing::debug;

use refframe_core::{ConditionKey, Position2D, SelectionEvent, GEOMETRY_EPSILON};

/// Triangle between previous target, target and selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionTriangle {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// `None` when the previous target coincides with the target
    pub dx: Option<f64>,
    pub ae: Option<f64>,
}

impl SelectionTriangle {
    pub fn new(previous_target: &Position2D, target: &Position2D, selection: &Position2D) -> Self {
        let a = previous_target.distance_to(target);
        let b = target.distance_to(selection);
        let c = previous_target.distance_to(selection);

        let dx = if a < GEOMETRY_EPSILON {
            None
        } else {
            Some((c * c - b * b - a * a) / (2.0 * a))
        };

        Self {
            a,
            b,
            c,
            dx,
            ae: dx.map(|dx| a + dx),
        }
    }
}

/// Selection with its derived error terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointingTrial {
    pub key: ConditionKey,
    pub active_target_index: Option<i64>,
    pub success: bool,
    pub movement_time_ms: f64,
    pub triangle: SelectionTriangle,
}

impl PointingTrial {
    pub fn dx(&self) -> Option<f64> {
        self.triangle.dx
    }

    pub fn ae(&self) -> Option<f64> {
        self.triangle.ae
    }

    /// Selection error in centimeters
    pub fn distance_cm(&self) -> f64 {
        100.0 * self.triangle.b
    }
}

/// Derive the triangle of every selection, then drop the zero-duration ones.
///
/// The previous target is carried across the whole sequence, including the
/// zero-duration bootstrap selections, since their targets start the next
/// movement. The very first selection is measured against itself (a = 0).
pub fn derive_trials(events: &[SelectionEvent]) -> Vec<PointingTrial> {
    let trials: Vec<PointingTrial> = events
        .iter()
        .scan(None::<Position2D>, |previous, event| {
            let from = previous.unwrap_or(event.target);
            *previous = Some(event.target);

            Some(PointingTrial {
                key: event.key.clone(),
                active_target_index: event.active_target_index,
                success: event.success,
                movement_time_ms: event.duration_ms,
                triangle: SelectionTriangle::new(&from, &event.target, &event.selection),
            })
        })
        .filter(|trial| trial.movement_time_ms != 0.0)
        .collect();

    debug!(
        "Derived {} trials from {} selections",
        trials.len(),
        events.len()
    );
    trials
}

#[cfg(test)]
mod tests {
    use super::*;
    use refframe_core::{Movement, ParticipantId};

    fn event(target: (f64, f64), selection: (f64, f64), duration_ms: f64) -> SelectionEvent {
        SelectionEvent {
            key: ConditionKey {
                participant: ParticipantId(5),
                movement: Movement::Standing,
                circle_direction: None,
                reference_frame: "Palm".into(),
                target_size: "0.025".into(),
            },
            active_target_index: None,
            target: Position2D::new(target.0, target.1),
            selection: Position2D::new(selection.0, selection.1),
            success: true,
            duration_ms,
        }
    }

    #[test]
    fn test_triangle_overshoot() {
        let t = SelectionTriangle::new(
            &Position2D::new(0.0, 0.0),
            &Position2D::new(0.05, 0.0),
            &Position2D::new(0.06, 0.0),
        );
        assert!((t.a - 0.05).abs() < 1e-12);
        assert!((t.b - 0.01).abs() < 1e-12);
        assert!((t.c - 0.06).abs() < 1e-12);
        assert!((t.dx.unwrap() - 0.01).abs() < 1e-12);
        assert!((t.ae.unwrap() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_undershoot_off_axis() {
        // Selection 1 cm short and 2 cm to the side
        let t = SelectionTriangle::new(
            &Position2D::new(0.0, 0.0),
            &Position2D::new(0.10, 0.0),
            &Position2D::new(0.09, 0.02),
        );
        assert!((t.dx.unwrap() + 0.01).abs() < 1e-12);
        assert!((t.ae.unwrap() - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_first_selection_has_no_dx() {
        let events = vec![event((0.0, 0.05), (0.0, 0.049), 640.0)];
        let trials = derive_trials(&events);
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].triangle.a, 0.0);
        assert_eq!(trials[0].dx(), None);
        assert_eq!(trials[0].ae(), None);
    }

    #[test]
    fn test_bootstrap_target_carries_over() {
        let events = vec![
            event((0.0, 0.0), (0.0, 0.0), 0.0),
            event((0.05, 0.0), (0.06, 0.0), 500.0),
            event((0.10, 0.0), (0.07, 0.0), 0.0),
            event((0.15, 0.0), (0.15, 0.0), 450.0),
        ];

        let trials = derive_trials(&events);
        assert_eq!(trials.len(), 2);
        assert!((trials[0].dx().unwrap() - 0.01).abs() < 1e-12);
        // Measured from the dropped bootstrap target at 0.10
        assert!((trials[1].triangle.a - 0.05).abs() < 1e-12);
        assert!(trials[1].dx().unwrap().abs() < 1e-12);
        assert!((trials[0].distance_cm() - 1.0).abs() < 1e-9);
    }
}
