//! Benchmarks for the per-sample feature extractors.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Vector2, Vector3};

use refframe_core::{ConditionKey, Movement, ParticipantId, Position3D, TrialSample};
use refframe_kinematics::posture::PostureFeatures;
use refframe_kinematics::steps::{StepFrequencyConfig, StepFrequencyEstimator};

fn create_walk(n_samples: usize) -> Vec<TrialSample> {
    (0..n_samples)
        .map(|i| {
            let t = i as f64 * 11.1;
            let phase = t / 550.0 * std::f64::consts::TAU;
            TrialSample {
                key: ConditionKey {
                    participant: ParticipantId(5),
                    movement: Movement::Walking,
                    circle_direction: None,
                    reference_frame: "Path".to_string(),
                    target_size: "0.025".to_string(),
                },
                timestamp_ms: t,
                realtime_ms: Some(t),
                head: Position3D::new(0.02 * phase.sin(), 1.7 + 0.03 * phase.cos(), t * 0.0012),
                floor_y: 0.0,
                target: Position3D::new(0.1, 1.2, t * 0.0012 + 0.45),
                target_forward: Vector3::new(0.0, -0.3, 1.0),
                walking_forward: Vector2::new(0.0, 1.0),
                walking_position: Some(Vector2::new(0.0, t * 0.0012)),
            }
        })
        .collect()
}

fn benchmark_posture(c: &mut Criterion) {
    let samples = create_walk(10_000);

    c.bench_function("posture_features_10k", |b| {
        b.iter(|| {
            black_box(&samples)
                .iter()
                .map(PostureFeatures::from_sample)
                .filter(|f| f.relative_target_yaw.is_some())
                .count()
        })
    });
}

fn benchmark_steps(c: &mut Criterion) {
    let samples = create_walk(10_000);
    let estimator = StepFrequencyEstimator::new(StepFrequencyConfig::default()).unwrap();

    c.bench_function("step_frequency_10k", |b| {
        b.iter(|| estimator.estimate_samples(black_box(&samples)))
    });
}

criterion_group!(benches, benchmark_posture, benchmark_steps);
criterion_main!(benches);
