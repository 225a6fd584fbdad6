//! Condition-block segmentation.
//!
//! A block is a maximal run of consecutive rows sharing one
//! (participant, Movement, ReferenceFrame, TargetSize, CircleDirection)
//! tuple. The logger restarts its clock at every block, so a timestamp that
//! does not increase also marks a block boundary.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{ConditionKey, ConditionLabels};

/// Identifier of a condition block derived from timestamp resets
pub type ConditionId = u32;

/// Assign a condition id to every sample.
///
/// The id starts at zero and increments at every sample whose timestamp is
/// not strictly greater than its predecessor's.
pub fn assign_condition_ids(timestamps: &[f64]) -> Vec<ConditionId> {
    let mut ids = Vec::with_capacity(timestamps.len());
    let mut current: ConditionId = 0;

    for (i, t) in timestamps.iter().enumerate() {
        if i > 0 && t - timestamps[i - 1] <= 0.0 {
            current += 1;
        }
        ids.push(current);
    }

    ids
}

/// Split rows into the contiguous slices that share a condition id
pub fn condition_blocks<T, F>(rows: &[T], timestamp: F) -> Vec<(ConditionId, &[T])>
where
    F: Fn(&T) -> f64,
{
    let timestamps: Vec<f64> = rows.iter().map(&timestamp).collect();
    let ids = assign_condition_ids(&timestamps);

    let mut blocks = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || ids[i] != ids[start] {
            blocks.push((ids[start], &rows[start..i]));
            start = i;
        }
    }

    blocks
}

/// One maximal run of rows sharing a condition tuple
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRun {
    pub key: ConditionKey,
    pub start: usize,
    pub len: usize,
}

/// Split rows into maximal runs of identical condition tuples
pub fn condition_runs<T: ConditionLabels>(rows: &[T]) -> Vec<ConditionRun> {
    let mut runs: Vec<ConditionRun> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let key = row.condition_key();
        match runs.last_mut() {
            Some(run) if run.key == key => run.len += 1,
            _ => runs.push(ConditionRun {
                key,
                start: i,
                len: 1,
            }),
        }
    }

    runs
}

/// Fail when two disjoint runs share the same condition tuple.
///
/// Returns the number of blocks on success.
pub fn check_unique_condition_blocks<T: ConditionLabels>(rows: &[T]) -> Result<usize> {
    let runs = condition_runs(rows);
    let mut seen: HashMap<&ConditionKey, usize> = HashMap::new();
    let mut repeated: Option<&ConditionKey> = None;

    for run in &runs {
        let count = seen.entry(&run.key).or_insert(0);
        *count += 1;
        if *count == 2 && repeated.is_none() {
            repeated = Some(&run.key);
        }
    }

    if seen.len() != runs.len() {
        return Err(Error::DuplicateConditionBlock {
            runs: runs.len(),
            distinct: seen.len(),
            repeated: repeated.map(ConditionKey::describe).unwrap_or_default(),
        });
    }

    Ok(runs.len())
}
