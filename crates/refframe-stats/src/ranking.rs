//! Mid-ranks with tie bookkeeping.

use statrs::statistics::{Data, OrderStatistics, RankTieBreaker};

/// Ranks starting at 1; tied values share the mean of their ranks.
///
/// Callers reject non-finite input first.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    Data::new(values.to_vec()).ranks(RankTieBreaker::Average)
}

/// Sizes of the groups of tied values, singletons excluded
pub fn tie_sizes(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    sorted
        .chunk_by(|a, b| a == b)
        .map(<[f64]>::len)
        .filter(|&len| len > 1)
        .collect()
}

/// `Σ (t³ - t)` over tie groups
pub fn tie_term(values: &[f64]) -> f64 {
    tie_sizes(values)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}
