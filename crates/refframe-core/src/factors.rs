//! Experimental factors and their declared level order.
//!
//! Reshaped tables, exported columns and plot axes are ordered by the
//! levels declared here, never by the order in which labels show up in
//! the data. The structure is versioned so a change of the declared order
//! is visible in configuration files.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::ConditionKey;

/// Current layout version of [`FactorLevels`]
pub const FACTOR_LEVELS_VERSION: u32 = 1;

/// Independent variables of the study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    Movement,
    ReferenceFrame,
    TargetSize,
    CircleDirection,
}

impl Factor {
    /// Column name used in logs and exported tables
    pub fn column_name(&self) -> &'static str {
        match self {
            Factor::Movement => "Movement",
            Factor::ReferenceFrame => "ReferenceFrame",
            Factor::TargetSize => "TargetSize",
            Factor::CircleDirection => "CircleDirection",
        }
    }

    /// Label of this factor for a condition; empty when not applicable
    pub fn label_of<'a>(&self, key: &'a ConditionKey) -> &'a str {
        match self {
            Factor::Movement => key.movement.as_str(),
            Factor::ReferenceFrame => &key.reference_frame,
            Factor::TargetSize => &key.target_size,
            Factor::CircleDirection => key.circle_direction.as_deref().unwrap_or(""),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Factor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Movement" | "Context" => Ok(Factor::Movement),
            "ReferenceFrame" | "Reference Frame" => Ok(Factor::ReferenceFrame),
            "TargetSize" => Ok(Factor::TargetSize),
            "CircleDirection" => Ok(Factor::CircleDirection),
            other => Err(Error::InvalidInput(format!("unknown factor '{other}'"))),
        }
    }
}

/// Declared level order of every factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorLevels {
    pub version: u32,
    pub movement: Vec<String>,
    pub reference_frame: Vec<String>,
    pub target_size: Vec<String>,
    pub circle_direction: Vec<String>,
}

impl Default for FactorLevels {
    fn default() -> Self {
        Self {
            version: FACTOR_LEVELS_VERSION,
            movement: to_strings(&["Standing", "Walking", "Circle"]),
            reference_frame: to_strings(&["Palm", "Palm w/o Rotation", "Path"]),
            target_size: to_strings(&["0.015", "0.025", "0.035", "0.045"]),
            circle_direction: to_strings(&["Clockwise", "CounterClockwise"]),
        }
    }
}

fn to_strings(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

impl FactorLevels {
    pub fn declared(&self, factor: Factor) -> &[String] {
        match factor {
            Factor::Movement => &self.movement,
            Factor::ReferenceFrame => &self.reference_frame,
            Factor::TargetSize => &self.target_size,
            Factor::CircleDirection => &self.circle_direction,
        }
    }

    /// Order two labels of a factor.
    ///
    /// Declared labels come first in declaration order. Undeclared labels
    /// follow, numerically when both parse as numbers and lexicographically
    /// otherwise. The empty label (factor not applicable) sorts last.
    pub fn compare(&self, factor: Factor, a: &str, b: &str) -> Ordering {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }

        let declared = self.declared(factor);
        let pos_a = declared.iter().position(|l| l == a);
        let pos_b = declared.iter().position(|l| l == b);

        match (pos_a, pos_b) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then(a.cmp(b)),
                _ => a.cmp(b),
            },
        }
    }

    /// Labels of `factor` missing from the declaration, in input order
    pub fn undeclared<'a>(
        &self,
        factor: Factor,
        labels: impl IntoIterator<Item = &'a str>,
    ) -> Vec<&'a str> {
        let declared = self.declared(factor);
        labels
            .into_iter()
            .filter(|label| !label.is_empty() && !declared.iter().any(|l| l == label))
            .collect()
    }

    /// Sort and deduplicate labels in declared order
    pub fn sort_labels(&self, factor: Factor, labels: &mut Vec<String>) {
        labels.sort_by(|a, b| self.compare(factor, a, b));
        labels.dedup();
    }

    /// Order condition keys by participant, then Movement, CircleDirection,
    /// ReferenceFrame and TargetSize
    pub fn compare_keys(&self, a: &ConditionKey, b: &ConditionKey) -> Ordering {
        a.participant
            .cmp(&b.participant)
            .then_with(|| self.compare_factor(Factor::Movement, a, b))
            .then_with(|| self.compare_factor(Factor::CircleDirection, a, b))
            .then_with(|| self.compare_factor(Factor::ReferenceFrame, a, b))
            .then_with(|| self.compare_factor(Factor::TargetSize, a, b))
    }

    fn compare_factor(&self, factor: Factor, a: &ConditionKey, b: &ConditionKey) -> Ordering {
        self.compare(factor, factor.label_of(a), factor.label_of(b))
    }

    /// Reject configurations whose declared labels would be ambiguous
    pub fn validate(&self) -> Result<(), Error> {
        if self.version != FACTOR_LEVELS_VERSION {
            return Err(Error::Config(format!(
                "factor levels version {} is not supported (expected {})",
                self.version, FACTOR_LEVELS_VERSION
            )));
        }
        for factor in [
            Factor::Movement,
            Factor::ReferenceFrame,
            Factor::TargetSize,
            Factor::CircleDirection,
        ] {
            let declared = self.declared(factor);
            for (i, label) in declared.iter().enumerate() {
                if label.is_empty() {
                    return Err(Error::Config(format!("empty level declared for {factor}")));
                }
                if declared[..i].contains(label) {
                    return Err(Error::Config(format!(
                        "level '{label}' declared twice for {factor}"
                    )));
                }
            }
        }
        Ok(())
    }
}
