//! Box statistics and significance labels.

use serde::{Deserialize, Serialize};

use refframe_core::{mean, quantile_sorted};

/// Five-number summary plus mean; whiskers span the full range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub n: usize,
}

impl BoxStats {
    /// Non-finite values are ignored; `None` if nothing is left
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            min: *sorted.first()?,
            q1: quantile_sorted(&sorted, 0.25)?,
            median: quantile_sorted(&sorted, 0.5)?,
            q3: quantile_sorted(&sorted, 0.75)?,
            max: *sorted.last()?,
            mean: mean(&sorted)?,
            n: sorted.len(),
        })
    }
}

/// `****` p ≤ 1e-4, `***` ≤ 1e-3, `**` ≤ 1e-2, `*` ≤ 0.05, else `ns`
pub fn significance_stars(p: f64) -> &'static str {
    if p <= 1e-4 {
        "****"
    } else if p <= 1e-3 {
        "***"
    } else if p <= 1e-2 {
        "**"
    } else if p <= 0.05 {
        "*"
    } else {
        "ns"
    }
}

/// Position of one box: x level and, for grouped plots, hue level
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupLabel {
    pub x: String,
    pub hue: Option<String>,
}

impl GroupLabel {
    pub fn new(x: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            hue: None,
        }
    }

    pub fn with_hue(x: impl Into<String>, hue: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            hue: Some(hue.into()),
        }
    }
}

/// Values of one box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxGroup {
    pub label: GroupLabel,
    pub values: Vec<f64>,
}

/// Bracket between two boxes labelled with the stars of `p_value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceAnnotation {
    pub first: GroupLabel,
    pub second: GroupLabel,
    pub p_value: f64,
}

impl SignificanceAnnotation {
    pub fn text(&self) -> &'static str {
        significance_stars(self.p_value)
    }
}
