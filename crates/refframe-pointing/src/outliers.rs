//! Optional removal of wild selections before aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use refframe_core::ConditionKey;

use crate::fitts::PointingTrial;

/// Selection error above which a trial counts as a mis-click (8 cm)
pub const DEFAULT_MAX_ERROR_M: f64 = 0.08;

/// Which trials to discard; keeps everything unless a threshold is set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierPolicy {
    /// Discard trials whose selection error `b` is at least this (meters)
    pub max_error_m: Option<f64>,
}

/// What an outlier policy removed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub total: usize,
    pub discarded: usize,
    pub per_condition: Vec<(ConditionKey, usize)>,
}

impl OutlierPolicy {
    pub fn keep_all() -> Self {
        Self { max_error_m: None }
    }

    pub fn selection_error() -> Self {
        Self {
            max_error_m: Some(DEFAULT_MAX_ERROR_M),
        }
    }

    pub fn is_outlier(&self, trial: &PointingTrial) -> bool {
        self.max_error_m
            .map_or(false, |max| trial.triangle.b >= max)
    }

    pub fn apply(&self, trials: Vec<PointingTrial>) -> (Vec<PointingTrial>, OutlierReport) {
        let total = trials.len();
        let mut per_condition: BTreeMap<ConditionKey, usize> = BTreeMap::new();

        let kept: Vec<PointingTrial> = trials
            .into_iter()
            .filter(|trial| {
                if self.is_outlier(trial) {
                    *per_condition.entry(trial.key.clone()).or_insert(0) += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        let report = OutlierReport {
            total,
            discarded: total - kept.len(),
            per_condition: per_condition.into_iter().collect(),
        };

        if report.discarded > 0 {
            for (key, count) in &report.per_condition {
                warn!("Discarded {} outlier selections in {}", count, key.describe());
            }
        }
        info!(
            "Outlier policy kept {} of {} selections",
            kept.len(),
            report.total
        );

        (kept, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitts::SelectionTriangle;
    use refframe_core::{Movement, ParticipantId};

    fn trial(rf: &str, b: f64) -> PointingTrial {
        PointingTrial {
            key: ConditionKey {
                participant: ParticipantId(9),
                movement: Movement::Circle,
                circle_direction: Some("Clockwise".into()),
                reference_frame: rf.into(),
                target_size: "0.015".into(),
            },
            active_target_index: Some(1),
            success: b < 0.01,
            movement_time_ms: 700.0,
            triangle: SelectionTriangle {
                a: 0.05,
                b,
                c: 0.05,
                dx: Some(0.0),
                ae: Some(0.05),
            },
        }
    }

    #[test]
    fn test_keep_all_is_default() {
        let trials = vec![trial("Palm", 0.5), trial("Palm", 0.01)];
        let (kept, report) = OutlierPolicy::default().apply(trials);
        assert_eq!(kept.len(), 2);
        assert_eq!(report.discarded, 0);
        assert_eq!(OutlierPolicy::default(), OutlierPolicy::keep_all());
    }

    #[test]
    fn test_selection_error_threshold() {
        let trials = vec![
            trial("Palm", 0.08),
            trial("Palm", 0.079),
            trial("Path", 0.2),
            trial("Path", 0.3),
        ];
        let (kept, report) = OutlierPolicy::selection_error().apply(trials);

        assert_eq!(kept.len(), 1);
        assert_eq!(report.total, 4);
        assert_eq!(report.discarded, 3);
        assert_eq!(report.per_condition.len(), 2);
        assert_eq!(report.per_condition[0].0.reference_frame, "Palm");
        assert_eq!(report.per_condition[1].1, 2);
    }
}
