//! Wilcoxon signed-rank test for paired samples (two-sided).
//!
//! Zero differences are dropped. Without ties and for at most
//! [`EXACT_LIMIT`] pairs the p-value comes from the exact null
//! distribution of the positive rank sum; otherwise from the normal
//! approximation with tie-corrected variance.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use refframe_core::{Error, Result};

use crate::ranking::{average_ranks, tie_term};

/// Largest sample size evaluated exactly
pub const EXACT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WilcoxonMethod {
    Exact,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WilcoxonResult {
    /// Smaller of the positive and negative rank sums
    pub statistic: f64,
    pub p_value: f64,
    /// Pairs left after dropping zero differences
    pub n: usize,
    pub method: WilcoxonMethod,
}

pub fn wilcoxon_signed_rank(x: &[f64], y: &[f64]) -> Result<WilcoxonResult> {
    if x.len() != y.len() {
        return Err(Error::InvalidInput(format!(
            "paired samples differ in length ({} vs {})",
            x.len(),
            y.len()
        )));
    }

    let differences: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(a, b)| a - b)
        .filter(|d| *d != 0.0)
        .collect();
    if differences.iter().any(|d| !d.is_finite()) {
        return Err(Error::InvalidInput("paired samples are not finite".into()));
    }

    let n = differences.len();
    if n == 0 {
        return Err(Error::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let magnitudes: Vec<f64> = differences.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);
    let r_plus: f64 = differences
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let total = (n * (n + 1)) as f64 / 2.0;
    let statistic = r_plus.min(total - r_plus);

    let ties = tie_term(&magnitudes);
    if n <= EXACT_LIMIT && ties == 0.0 {
        let p_value = exact_two_sided(n, statistic);
        return Ok(WilcoxonResult {
            statistic,
            p_value,
            n,
            method: WilcoxonMethod::Exact,
        });
    }

    let nf = n as f64;
    let mean = nf * (nf + 1.0) / 4.0;
    let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - ties / 48.0;
    if variance <= 0.0 {
        return Err(Error::Statistics("Wilcoxon variance is zero".into()));
    }
    let z = (statistic - mean) / variance.sqrt();
    let p_value = (2.0 * Normal::standard().sf(z.abs())).min(1.0);

    Ok(WilcoxonResult {
        statistic,
        p_value,
        n,
        method: WilcoxonMethod::Normal,
    })
}

/// Wilcoxon test of one pair of treatments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub first: String,
    pub second: String,
    pub result: WilcoxonResult,
    /// Bonferroni-adjusted over all requested pairs
    pub adjusted_p: f64,
}

/// Test the requested pairs of columns of `blocks[subject][treatment]`.
///
/// Pairs without any non-zero difference are left out of the result but
/// still count towards the correction.
pub fn pairwise_wilcoxon(
    blocks: &[Vec<f64>],
    labels: &[String],
    pairs: &[(usize, usize)],
) -> Result<Vec<PairwiseComparison>> {
    let column = |j: usize| -> Result<Vec<f64>> {
        if j >= labels.len() {
            return Err(Error::InvalidInput(format!(
                "treatment {j} out of range for {} labels",
                labels.len()
            )));
        }
        blocks
            .iter()
            .map(|block| {
                block.get(j).copied().ok_or_else(|| {
                    Error::InvalidInput(format!("block has no treatment {j}"))
                })
            })
            .collect()
    };

    let correction = pairs.len() as f64;
    let mut comparisons = Vec::with_capacity(pairs.len());
    for &(a, b) in pairs {
        let result = match wilcoxon_signed_rank(&column(a)?, &column(b)?) {
            Ok(result) => result,
            Err(Error::InsufficientData { .. }) => {
                debug!("{} and {} never differ, skipping", labels[a], labels[b]);
                continue;
            }
            Err(e) => return Err(e),
        };
        comparisons.push(PairwiseComparison {
            first: labels[a].clone(),
            second: labels[b].clone(),
            adjusted_p: (result.p_value * correction).min(1.0),
            result,
        });
    }
    Ok(comparisons)
}

/// `2 · P(W ≤ statistic)` under the null, capped at 1
fn exact_two_sided(n: usize, statistic: f64) -> f64 {
    let max_sum = n * (n + 1) / 2;
    // counts[s]: subsets of {1..n} with rank sum s
    let mut counts = vec![0.0f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }

    let threshold = statistic.floor() as usize;
    let below: f64 = counts.iter().take(threshold + 1).sum();
    let total = 2f64.powi(n as i32);
    (2.0 * below / total).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_all_positive() {
        let x = [2.0, 4.0, 6.0, 8.0, 10.0];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(result.method, WilcoxonMethod::Exact);
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_exact_mixed_signs() {
        // Differences 1, -2, 3, 4, 5
        let x = [1.0, 0.0, 3.0, 4.0, 5.0];
        let y = [0.0, 2.0, 0.0, 0.0, 0.0];
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(result.statistic, 2.0);
        assert!((result.p_value - 0.1875).abs() < 1e-12);
    }

    #[test]
    fn test_zero_differences_dropped() {
        let x = [1.0, 2.0, 3.0, 7.0];
        let y = [1.0, 1.0, 1.0, 1.0];
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(result.n, 3);
        assert!((result.p_value - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_normal_approximation_with_ties() {
        let x = [3.0, 3.0, 5.0, 5.0, 2.0, 8.0, 4.0];
        let y = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 6.0];
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(result.method, WilcoxonMethod::Normal);

        // |d| = 2, 2, 4, 4, 1, 7, 2 -> ranks 3, 3, 5.5, 5.5, 1, 7, 3
        assert_eq!(result.statistic, 3.0);
        let variance = 7.0 * 8.0 * 15.0 / 24.0 - (24.0 + 6.0) / 48.0;
        let z: f64 = (3.0 - 14.0) / f64::sqrt(variance);
        let expected = 2.0 * Normal::standard().sf(z.abs());
        assert!((result.p_value - expected).abs() < 1e-12);

        let swapped = wilcoxon_signed_rank(&y, &x).unwrap();
        assert!((swapped.p_value - result.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_bonferroni() {
        let blocks: Vec<Vec<f64>> = (1..=5)
            .map(|i| vec![2.0 * i as f64, i as f64, i as f64])
            .collect();
        let labels: Vec<String> = ["Palm", "Palm w/o Rotation", "Path"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let single = pairwise_wilcoxon(&blocks, &labels, &[(0, 1)]).unwrap();
        assert_eq!(single[0].second, "Palm w/o Rotation");
        assert!((single[0].adjusted_p - 0.0625).abs() < 1e-12);

        let all = pairwise_wilcoxon(&blocks, &labels, &[(0, 1), (0, 2), (1, 2)]).unwrap();
        // Palm w/o Rotation and Path are identical and yield no test
        assert_eq!(all.len(), 2);
        assert!((all[1].adjusted_p - 0.1875).abs() < 1e-12);

        assert!(pairwise_wilcoxon(&blocks, &labels, &[(0, 3)]).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(wilcoxon_signed_rank(&[1.0], &[1.0, 2.0]).is_err());
        assert!(matches!(
            wilcoxon_signed_rank(&[1.0, 2.0], &[1.0, 2.0]),
            Err(Error::InsufficientData { .. })
        ));
    }
}
