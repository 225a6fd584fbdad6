//! Friedman test for k related samples.
//!
//! ```text
//! Q = 12 / (n k (k+1)) · Σ R_j² - 3 n (k+1)
//! Q_corrected = Q / (1 - Σ (t³ - t) / (n (k³ - k)))
//! ```
//!
//! with `R_j` the rank sum of treatment `j` over `n` blocks, ranks taken
//! within each block. The p-value is the chi-square tail with `k - 1`
//! degrees of freedom.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

use refframe_core::{Error, Result};

use crate::ranking::{average_ranks, tie_term};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FriedmanResult {
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
    pub blocks: usize,
}

/// Run the test on `blocks[i][j]`: subject `i`, treatment `j`
pub fn friedman_test(blocks: &[Vec<f64>]) -> Result<FriedmanResult> {
    let n = blocks.len();
    if n < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            available: n,
        });
    }

    let k = blocks[0].len();
    if k < 3 {
        return Err(Error::InvalidInput(format!(
            "Friedman test needs at least 3 treatments, got {k}"
        )));
    }
    if let Some(block) = blocks.iter().find(|b| b.len() != k) {
        return Err(Error::InvalidInput(format!(
            "unbalanced blocks: {} values where {k} expected",
            block.len()
        )));
    }
    if blocks.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput("Friedman test input is not finite".into()));
    }

    let mut rank_sums = vec![0.0; k];
    let mut ties = 0.0;
    for block in blocks {
        for (sum, rank) in rank_sums.iter_mut().zip(average_ranks(block)) {
            *sum += rank;
        }
        ties += tie_term(block);
    }

    let (nf, kf) = (n as f64, k as f64);
    let q = 12.0 / (nf * kf * (kf + 1.0)) * rank_sums.iter().map(|r| r * r).sum::<f64>()
        - 3.0 * nf * (kf + 1.0);

    let correction = 1.0 - ties / (nf * (kf * kf * kf - kf));
    if correction <= 0.0 {
        return Err(Error::Statistics(
            "Friedman test undefined: every block is fully tied".into(),
        ));
    }

    let statistic = q / correction;
    let df = k - 1;
    let p_value = ChiSquared::new(df as f64)
        .map_err(|e| Error::Statistics(e.to_string()))?
        .sf(statistic);
    debug!("Friedman chi2({}) = {:.4}, p = {:.4}", df, statistic, p_value);

    Ok(FriedmanResult {
        statistic,
        df,
        p_value,
        blocks: n,
    })
}
