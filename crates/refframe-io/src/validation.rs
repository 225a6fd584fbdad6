//! Completeness checks of the factorial design.
//!
//! Every participant completes every Movement × ReferenceFrame × TargetSize
//! cell with a fixed number of selections. Missing or surplus rows would
//! bias every downstream statistic, so the pipeline stops before writing
//! anything when the counts do not add up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use refframe_core::{ConditionLabels, Error, Factor, FactorLevels, Movement, ParticipantId, Result};

pub use refframe_core::check_unique_condition_blocks;

/// Expected shape of a complete dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignExpectations {
    pub movement_levels: usize,
    pub reference_frame_levels: usize,
    pub target_size_levels: usize,
    /// Row count of every Movement level must be a multiple of this
    pub trials_per_movement: usize,
    /// Row count of every ReferenceFrame level must be a multiple of this
    pub trials_per_reference_frame: usize,
    /// Row count of every TargetSize level must be a multiple of this
    pub trials_per_target_size: usize,
}

impl Default for DesignExpectations {
    fn default() -> Self {
        Self {
            movement_levels: 3,
            reference_frame_levels: 3,
            target_size_levels: 4,
            trials_per_movement: 84,
            trials_per_reference_frame: 84,
            trials_per_target_size: 63,
        }
    }
}

type CellKey = (ParticipantId, Movement, String, String);

/// Level and cell counts of a loaded dataset
#[derive(Debug, Clone, Default)]
pub struct DesignReport {
    movement: BTreeMap<String, usize>,
    reference_frame: BTreeMap<String, usize>,
    target_size: BTreeMap<String, usize>,
    cells: BTreeMap<CellKey, usize>,
}

impl DesignReport {
    pub fn from_records<T: ConditionLabels>(rows: &[T]) -> Self {
        let mut report = Self::default();

        for row in rows {
            *report
                .movement
                .entry(row.movement().as_str().to_string())
                .or_insert(0) += 1;
            *report
                .reference_frame
                .entry(row.reference_frame().to_string())
                .or_insert(0) += 1;
            *report
                .target_size
                .entry(row.target_size().to_string())
                .or_insert(0) += 1;
            *report
                .cells
                .entry((
                    row.participant(),
                    row.movement(),
                    row.reference_frame().to_string(),
                    row.target_size().to_string(),
                ))
                .or_insert(0) += 1;
        }

        report
    }

    /// Row count per level of one of the validated factors
    pub fn level_counts(&self, factor: Factor) -> Option<&BTreeMap<String, usize>> {
        match factor {
            Factor::Movement => Some(&self.movement),
            Factor::ReferenceFrame => Some(&self.reference_frame),
            Factor::TargetSize => Some(&self.target_size),
            Factor::CircleDirection => None,
        }
    }

    /// Check level cardinality and trial multiples, Movement first
    pub fn check(&self, expectations: &DesignExpectations) -> Result<()> {
        let checks = [
            (
                Factor::Movement,
                &self.movement,
                expectations.movement_levels,
                expectations.trials_per_movement,
            ),
            (
                Factor::ReferenceFrame,
                &self.reference_frame,
                expectations.reference_frame_levels,
                expectations.trials_per_reference_frame,
            ),
            (
                Factor::TargetSize,
                &self.target_size,
                expectations.target_size_levels,
                expectations.trials_per_target_size,
            ),
        ];

        for (factor, counts, levels, multiple) in checks {
            if counts.len() != levels {
                return Err(Error::MissingFactorLevels {
                    factor: factor.column_name(),
                    expected: levels,
                    actual: counts.len(),
                });
            }

            if multiple == 0 {
                continue;
            }
            if let Some((level, rows)) = counts.iter().find(|(_, rows)| *rows % multiple != 0) {
                return Err(Error::UnbalancedDesign {
                    factor: factor.column_name(),
                    level: level.clone(),
                    rows: *rows,
                    multiple,
                });
            }
            debug!("{} levels balanced: {:?}", factor, counts);
        }

        Ok(())
    }

    /// Every observed level must be declared so tables can be ordered
    pub fn check_declared(&self, levels: &FactorLevels) -> Result<()> {
        for factor in [Factor::Movement, Factor::ReferenceFrame, Factor::TargetSize] {
            let Some(counts) = self.level_counts(factor) else {
                continue;
            };
            let missing = levels.undeclared(factor, counts.keys().map(String::as_str));
            if !missing.is_empty() {
                return Err(Error::UndeclaredLevels {
                    factor: factor.column_name(),
                    labels: missing.join(", "),
                });
            }
        }
        Ok(())
    }

    /// Per-(participant, Movement, ReferenceFrame, TargetSize) row counts
    pub fn render_cell_counts(&self) -> String {
        let header = String::from("ParticipantID\tMovement\tReferenceFrame\tTargetSize\tRows\n");
        self.cells
            .iter()
            .fold(header, |mut out, ((participant, movement, rf, ts), rows)| {
                out.push_str(&format!("{participant}\t{movement}\t{rf}\t{ts}\t{rows}\n"));
                out
            })
    }
}
