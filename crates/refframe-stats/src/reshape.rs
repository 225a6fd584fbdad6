//! Long and wide layouts of the per-condition summaries.
//!
//! The long table feeds the ART backend: one row per participant and
//! condition tuple with a single dependent value. The wide table has one
//! row per participant and one column per dependent variable and condition
//! tuple, named `TP_Walking_Palm_0.025` for the default delimiter.
//!
//! Row and column order come from participant ids and the declared factor
//! levels only, so identical input always yields identical bytes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use refframe_core::{mean, Error, Factor, FactorLevels, ParticipantId, Result};
use refframe_pointing::{ConditionSummary, DependentVariable};

/// Default separator between variable and level labels in wide columns
pub const DEFAULT_DELIMITER: &str = "_";

/// Name of a wide column: a dependent variable and one label per factor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub variable: String,
    pub labels: Vec<String>,
}

impl ColumnKey {
    pub fn new(variable: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            variable: variable.into(),
            labels,
        }
    }

    pub fn join(&self, delimiter: &str) -> Result<String> {
        check_delimiter(delimiter)?;
        let parts = std::iter::once(&self.variable).chain(&self.labels);

        let mut name = String::new();
        for (i, part) in parts.enumerate() {
            if part.contains(delimiter) {
                return Err(Error::InvalidInput(format!(
                    "label '{part}' contains the column delimiter '{delimiter}'"
                )));
            }
            if i > 0 {
                name.push_str(delimiter);
            }
            name.push_str(part);
        }
        Ok(name)
    }

    pub fn split(name: &str, delimiter: &str) -> Result<Self> {
        check_delimiter(delimiter)?;
        let mut parts = name.split(delimiter).map(str::to_string);
        let variable = parts
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::InvalidInput(format!("'{name}' has no variable name")))?;
        Ok(Self {
            variable,
            labels: parts.collect(),
        })
    }
}

fn check_delimiter(delimiter: &str) -> Result<()> {
    if delimiter.is_empty() {
        return Err(Error::InvalidInput("column delimiter is empty".into()));
    }
    Ok(())
}

fn labels_of(summary: &ConditionSummary, factors: &[Factor]) -> Vec<String> {
    let key = summary.key();
    factors
        .iter()
        .map(|f| f.label_of(&key).to_string())
        .collect()
}

fn compare_labels(levels: &FactorLevels, factors: &[Factor], a: &[String], b: &[String]) -> Ordering {
    factors
        .iter()
        .zip(a.iter().zip(b))
        .map(|(factor, (x, y))| levels.compare(*factor, x, y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Mean of the defined values per (participant, labels)
fn cell_means(
    summaries: &[ConditionSummary],
    variable: DependentVariable,
    factors: &[Factor],
) -> BTreeMap<(ParticipantId, Vec<String>), Option<f64>> {
    let mut cells: BTreeMap<(ParticipantId, Vec<String>), Vec<f64>> = BTreeMap::new();
    for summary in summaries {
        let values = cells
            .entry((summary.participant, labels_of(summary, factors)))
            .or_default();
        if let Some(v) = summary.value(variable) {
            values.push(v);
        }
    }
    cells
        .into_iter()
        .map(|(key, values)| (key, mean(&values)))
        .collect()
}

/// One row of a long table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub participant: ParticipantId,
    pub labels: Vec<String>,
    pub value: f64,
}

/// One dependent variable over participants and condition tuples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTable {
    pub dependent: DependentVariable,
    pub factors: Vec<Factor>,
    pub rows: Vec<LongRow>,
}

impl LongTable {
    /// Cells without a defined value are left out
    pub fn from_summaries(
        summaries: &[ConditionSummary],
        dependent: DependentVariable,
        factors: &[Factor],
        levels: &FactorLevels,
    ) -> Self {
        let mut undefined = 0usize;
        let mut rows: Vec<LongRow> = cell_means(summaries, dependent, factors)
            .into_iter()
            .filter_map(|((participant, labels), value)| match value {
                Some(value) => Some(LongRow {
                    participant,
                    labels,
                    value,
                }),
                None => {
                    undefined += 1;
                    None
                }
            })
            .collect();

        if undefined > 0 {
            warn!("{} cells have no {} value and are left out", undefined, dependent);
        }

        rows.sort_by(|a, b| {
            a.participant
                .cmp(&b.participant)
                .then_with(|| compare_labels(levels, factors, &a.labels, &b.labels))
        });

        Self {
            dependent,
            factors: factors.to_vec(),
            rows,
        }
    }

    /// Labels of one factor present in the table, in declared order
    pub fn levels_present(&self, factor: Factor, levels: &FactorLevels) -> Vec<String> {
        let Some(index) = self.factors.iter().position(|f| *f == factor) else {
            return Vec::new();
        };
        let mut labels: Vec<String> = self.rows.iter().map(|r| r.labels[index].clone()).collect();
        levels.sort_labels(factor, &mut labels);
        labels
    }

    pub fn header(&self) -> Vec<String> {
        std::iter::once("ParticipantID".to_string())
            .chain(self.factors.iter().map(|f| f.column_name().to_string()))
            .chain(std::iter::once(self.dependent.column_name().to_string()))
            .collect()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| Error::Csv(format!("{}: {e}", path.display())))?;
        writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = vec![row.participant.to_string()];
            record.extend(row.labels.iter().cloned());
            record.push(row.value.to_string());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// One row per participant, one column per variable and condition tuple
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<(ParticipantId, Vec<Option<f64>>)>,
    delimiter: String,
}

impl WideTable {
    /// Pivot summaries; rows sharing a participant and tuple (both circle
    /// directions, for instance) are averaged.
    pub fn pivot(
        summaries: &[ConditionSummary],
        variables: &[DependentVariable],
        factors: &[Factor],
        levels: &FactorLevels,
        delimiter: &str,
    ) -> Result<Self> {
        check_delimiter(delimiter)?;

        let mut tuples: Vec<Vec<String>> = summaries.iter().map(|s| labels_of(s, factors)).collect();
        tuples.sort_by(|a, b| compare_labels(levels, factors, a, b));
        tuples.dedup();

        let mut participants: Vec<ParticipantId> = summaries.iter().map(|s| s.participant).collect();
        participants.sort();
        participants.dedup();

        let mut columns = Vec::with_capacity(variables.len() * tuples.len());
        let mut rows: Vec<(ParticipantId, Vec<Option<f64>>)> =
            participants.iter().map(|p| (*p, Vec::new())).collect();

        for variable in variables {
            let cells = cell_means(summaries, *variable, factors);
            for tuple in &tuples {
                let column = ColumnKey::new(variable.column_name(), tuple.clone());
                // Validate the name now so writing cannot fail later
                column.join(delimiter)?;
                columns.push(column);

                for (participant, values) in rows.iter_mut() {
                    let value = cells
                        .get(&(*participant, tuple.clone()))
                        .copied()
                        .flatten();
                    values.push(value);
                }
            }
        }

        debug!(
            "Pivoted {} summaries into {} rows x {} columns",
            summaries.len(),
            rows.len(),
            columns.len()
        );

        Ok(Self {
            columns,
            rows,
            delimiter: delimiter.to_string(),
        })
    }

    pub fn header(&self) -> Result<Vec<String>> {
        let mut header = vec!["ParticipantID".to_string()];
        for column in &self.columns {
            header.push(column.join(&self.delimiter)?);
        }
        Ok(header)
    }

    /// Cells as text; undefined cells are empty
    pub fn string_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(participant, values)| {
                std::iter::once(participant.to_string())
                    .chain(values.iter().map(|v| match v {
                        Some(v) if v.is_finite() => v.to_string(),
                        _ => String::new(),
                    }))
                    .collect()
            })
            .collect()
    }
}
