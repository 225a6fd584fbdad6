//! `refframe steps`: step cadence and walking speeds.

use std::path::PathBuf;

use refframe_io::{load_files, HighFrequencyRecord};
use refframe_kinematics::{
    locomotion_per_condition, mean_speed_by_movement, StepFrequencyConfig, StepFrequencyEstimator,
};

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn run(files: &[PathBuf], steps: StepFrequencyConfig, per_condition: bool) -> anyhow::Result<()> {
    let records: Vec<HighFrequencyRecord> = load_files(files)?;
    let samples: Vec<_> = records.iter().map(HighFrequencyRecord::to_sample).collect();

    let estimator = StepFrequencyEstimator::new(steps)?;
    let overall = estimator.estimate_samples(&samples)?;
    println!(
        "Step frequency: {} steps/min ({} minima, {} intervals)",
        show(overall.cadence_spm),
        overall.minima,
        overall.intervals_used
    );

    if per_condition {
        println!("Condition\tCadence\tMinima");
        for block in estimator.estimate_per_condition(&samples)? {
            println!(
                "{} {}\t{}\t{}",
                block.condition_id,
                block.key.describe(),
                show(block.frequency.cadence_spm),
                block.frequency.minima
            );
        }
    }

    let locomotion = locomotion_per_condition(&samples);
    println!("Movement\tHead km/h\tPath km/h\tBlocks");
    for speed in mean_speed_by_movement(&locomotion) {
        println!(
            "{}\t{}\t{}\t{}",
            speed.movement,
            show(speed.head_speed_kmh),
            show(speed.path_speed_kmh),
            speed.conditions
        );
    }
    Ok(())
}
