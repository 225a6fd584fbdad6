//! Step-frequency estimation from head height.
//!
//! The head dips once per step. A sample is a step minimum when it is the
//! lowest head height inside a centred rolling window; the mean time
//! between consecutive minima gives the cadence.
//!
//! ```text
//! cadence [steps/min] = 60 / (mean_interval_ms · 0.001)
//! ```
//!
//! Samples from consecutive condition blocks are concatenated, so the
//! interval band discards the negative jumps at clock resets.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use refframe_core::{condition_blocks, mean, ConditionId, ConditionKey, Error, Result, TrialSample};

/// Step detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepFrequencyConfig {
    /// Rolling-minimum window in samples
    pub window: usize,
    /// Shortest accepted interval between minima (ms)
    pub min_interval_ms: f64,
    /// Longest accepted interval between minima (ms), unbounded if unset
    pub max_interval_ms: Option<f64>,
}

impl Default for StepFrequencyConfig {
    fn default() -> Self {
        Self {
            window: 10,
            min_interval_ms: 0.0,
            max_interval_ms: None,
        }
    }
}

impl StepFrequencyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::Config("step window must be at least one sample".into()));
        }
        if let Some(max) = self.max_interval_ms {
            if max < self.min_interval_ms {
                return Err(Error::Config(format!(
                    "step interval band [{}, {max}] is empty",
                    self.min_interval_ms
                )));
            }
        }
        Ok(())
    }

    fn accepts(&self, interval_ms: f64) -> bool {
        interval_ms >= self.min_interval_ms
            && self.max_interval_ms.map_or(true, |max| interval_ms <= max)
    }
}

/// Result of one estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepFrequency {
    /// Steps per minute, `None` without a usable interval
    pub cadence_spm: Option<f64>,
    pub mean_interval_ms: Option<f64>,
    pub minima: usize,
    pub intervals_used: usize,
}

/// Step frequency of one condition block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionStepFrequency {
    pub condition_id: ConditionId,
    pub key: ConditionKey,
    pub frequency: StepFrequency,
}

/// Local-minimum step detector
pub struct StepFrequencyEstimator {
    config: StepFrequencyConfig,
}

impl StepFrequencyEstimator {
    pub fn new(config: StepFrequencyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StepFrequencyConfig {
        &self.config
    }

    /// Indices whose height equals the minimum of their centred window.
    ///
    /// Sample `i` covers `[i - w/2, i - w/2 + w - 1]`; samples without a
    /// complete window are never minima.
    pub fn local_minima(&self, heights: &[f64]) -> Vec<usize> {
        let w = self.config.window;
        let half = w / 2;
        if heights.len() < w {
            return Vec::new();
        }

        (half..=heights.len() - w + half)
            .filter(|&i| {
                let window = &heights[i - half..i - half + w];
                let min = window.iter().copied().fold(f64::INFINITY, f64::min);
                heights[i] == min
            })
            .collect()
    }

    /// Cadence over a time-ordered sequence of `(timestamp_ms, head_y)`
    pub fn estimate(&self, timestamps_ms: &[f64], heights: &[f64]) -> Result<StepFrequency> {
        if timestamps_ms.len() != heights.len() {
            return Err(Error::InvalidInput(format!(
                "{} timestamps for {} head heights",
                timestamps_ms.len(),
                heights.len()
            )));
        }

        let minima = self.local_minima(heights);
        let intervals: Vec<f64> = minima
            .windows(2)
            .map(|pair| timestamps_ms[pair[1]] - timestamps_ms[pair[0]])
            .filter(|interval| self.config.accepts(*interval))
            .collect();

        let mean_interval_ms = mean(&intervals).filter(|m| *m > 0.0);
        let cadence_spm = mean_interval_ms.map(|m| 60.0 / (m * 0.001));

        debug!(
            "{} minima, {} accepted intervals, cadence {:?}",
            minima.len(),
            intervals.len(),
            cadence_spm
        );

        Ok(StepFrequency {
            cadence_spm,
            mean_interval_ms,
            minima: minima.len(),
            intervals_used: intervals.len(),
        })
    }

    /// Cadence over all moving samples, Standing rows removed
    pub fn estimate_samples(&self, samples: &[TrialSample]) -> Result<StepFrequency> {
        let (timestamps, heights): (Vec<f64>, Vec<f64>) = samples
            .iter()
            .filter(|s| s.key.movement.is_locomotion())
            .map(|s| (s.timestamp_ms, s.head.y))
            .unzip();

        let frequency = self.estimate(&timestamps, &heights)?;
        if frequency.cadence_spm.is_none() {
            warn!("No step cadence: {} minima found", frequency.minima);
        }
        Ok(frequency)
    }

    /// Cadence of every moving condition block, in log order
    pub fn estimate_per_condition(
        &self,
        samples: &[TrialSample],
    ) -> Result<Vec<ConditionStepFrequency>> {
        condition_blocks(samples, |s| s.timestamp_ms)
            .into_iter()
            .filter(|(_, block)| block[0].key.movement.is_locomotion())
            .map(|(condition_id, block)| {
                let timestamps: Vec<f64> = block.iter().map(|s| s.timestamp_ms).collect();
                let heights: Vec<f64> = block.iter().map(|s| s.head.y).collect();
                Ok(ConditionStepFrequency {
                    condition_id,
                    key: block[0].key.clone(),
                    frequency: self.estimate(&timestamps, &heights)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector3};
    use refframe_core::{Movement, ParticipantId, Position3D};
    use std::f64::consts::PI;

    fn sinusoid(period_ms: f64, step_ms: f64, duration_ms: f64) -> (Vec<f64>, Vec<f64>) {
        let n = (duration_ms / step_ms) as usize;
        let timestamps: Vec<f64> = (0..n).map(|i| i as f64 * step_ms).collect();
        let heights = timestamps
            .iter()
            .map(|t| 1.6 + 0.03 * (2.0 * PI * t / period_ms).sin())
            .collect();
        (timestamps, heights)
    }

    fn sample(movement: Movement, t: f64, y: f64) -> TrialSample {
        TrialSample {
            key: ConditionKey {
                participant: ParticipantId(5),
                movement,
                circle_direction: None,
                reference_frame: "Palm".into(),
                target_size: "0.025".into(),
            },
            timestamp_ms: t,
            realtime_ms: None,
            head: Position3D::new(0.0, y, 0.0),
            floor_y: 0.0,
            target: Position3D::origin(),
            target_forward: Vector3::z(),
            walking_forward: Vector2::y(),
            walking_position: None,
        }
    }

    #[test]
    fn test_sinusoid_cadence() {
        let estimator = StepFrequencyEstimator::new(StepFrequencyConfig::default()).unwrap();

        for period in [600.0, 800.0, 1000.0] {
            let (t, y) = sinusoid(period, 10.0, 20_000.0);
            let result = estimator.estimate(&t, &y).unwrap();
            let expected = 60_000.0 / period;
            // Minima are quantised to the sampling step
            let tolerance = expected * 10.0 / period;
            assert!(
                (result.cadence_spm.unwrap() - expected).abs() <= tolerance,
                "period {period}: {:?}",
                result
            );
        }
    }

    #[test]
    fn test_centred_window_alignment() {
        let estimator = StepFrequencyEstimator::new(StepFrequencyConfig {
            window: 4,
            ..Default::default()
        })
        .unwrap();

        // Candidates are 2..=4 for six samples and a window of four
        let heights = [0.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        assert!(estimator.local_minima(&heights).is_empty());

        let heights = [9.0, 5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(estimator.local_minima(&heights), vec![2]);
    }

    #[test]
    fn test_reset_intervals_are_discarded() {
        let estimator = StepFrequencyEstimator::new(StepFrequencyConfig::default()).unwrap();
        let (mut t, mut y) = sinusoid(1000.0, 10.0, 5_000.0);
        let (t2, y2) = sinusoid(1000.0, 10.0, 5_000.0);
        t.extend(t2);
        y.extend(y2);

        let result = estimator.estimate(&t, &y).unwrap();
        assert_eq!(result.intervals_used, result.minima - 2);
        assert!((result.cadence_spm.unwrap() - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_interval_band() {
        let config = StepFrequencyConfig {
            window: 3,
            min_interval_ms: 0.0,
            max_interval_ms: Some(150.0),
        };
        let estimator = StepFrequencyEstimator::new(config).unwrap();
        let t = [0.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0];
        let y = [2.0, 1.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0, 2.0];
        let result = estimator.estimate(&t, &y).unwrap();
        assert_eq!(result.minima, 3);
        // 100 ms accepted, 200 ms rejected
        assert_eq!(result.intervals_used, 1);
        assert!((result.cadence_spm.unwrap() - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_minima() {
        let estimator = StepFrequencyEstimator::new(StepFrequencyConfig::default()).unwrap();
        let result = estimator.estimate(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        assert_eq!(result.cadence_spm, None);
        assert!(estimator.estimate(&[0.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_invalid_config() {
        assert!(StepFrequencyEstimator::new(StepFrequencyConfig {
            window: 0,
            ..Default::default()
        })
        .is_err());
        assert!(StepFrequencyConfig {
            min_interval_ms: 200.0,
            max_interval_ms: Some(100.0),
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_per_condition_skips_standing() {
        let estimator = StepFrequencyEstimator::new(StepFrequencyConfig::default()).unwrap();
        let (t, y) = sinusoid(1000.0, 10.0, 4_000.0);

        let mut samples: Vec<TrialSample> = t
            .iter()
            .zip(&y)
            .map(|(t, y)| sample(Movement::Standing, *t, *y))
            .collect();
        samples.extend(t.iter().zip(&y).map(|(t, y)| sample(Movement::Walking, *t, *y)));

        let per_condition = estimator.estimate_per_condition(&samples).unwrap();
        assert_eq!(per_condition.len(), 1);
        assert_eq!(per_condition[0].condition_id, 1);
        assert_eq!(per_condition[0].key.movement, Movement::Walking);
        assert!((per_condition[0].frequency.cadence_spm.unwrap() - 60.0).abs() < 1e-6);

        let overall = estimator.estimate_samples(&samples).unwrap();
        assert!((overall.cadence_spm.unwrap() - 60.0).abs() < 1e-6);
    }
}
