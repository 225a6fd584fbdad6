//! `refframe posture`: posture features of the high-frequency logs.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use refframe_io::{
    check_unique_condition_blocks, load_participants, output_path, write_records, DatasetKind,
    HighFrequencyRecord, ParticipantRange,
};
use refframe_kinematics::PostureSummary;

use crate::config::AnalysisConfig;

pub const POSTURE_SUFFIX: &str = "_posture.csv";

pub fn run(
    dir: &Path,
    range: ParticipantRange,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let records: Vec<HighFrequencyRecord> = load_participants(dir, range, DatasetKind::HighFrequency)
        .context("loading high-frequency logs")?;
    let blocks = check_unique_condition_blocks(&records)?;
    info!("{} condition blocks in {} samples", blocks, records.len());

    let samples: Vec<_> = records.iter().map(HighFrequencyRecord::to_sample).collect();
    let summaries = PostureSummary::by_reference_frame(&samples, &config.levels);
    if summaries.is_empty() {
        anyhow::bail!("no Walking or Circle samples to summarise");
    }

    write_records(&output_path(output_dir, range, POSTURE_SUFFIX), &summaries)?;
    Ok(())
}
