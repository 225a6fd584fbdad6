//! `refframe preprocess`: selection logs to throughput summaries.

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use refframe_core::Factor;
use refframe_io::{
    check_unique_condition_blocks, load_participants, output_path, write_records, write_table,
    DatasetKind, DesignReport, ParticipantRange, SelectionRecord,
};
use refframe_pointing::{
    circle_direction_counts, derive_trials, summarize, ConditionSummary, DependentVariable,
    OutlierPolicy, ReferenceFrameOverview,
};
use refframe_stats::WideTable;

use crate::config::AnalysisConfig;

pub const WIDE_SUFFIX: &str = "_preprocessed.csv";
pub const LONG_SUFFIX: &str = "_preprocessed_art.csv";

/// Factors spanning the wide table columns
pub const WIDE_FACTORS: [Factor; 3] = [Factor::Movement, Factor::ReferenceFrame, Factor::TargetSize];

pub fn run(
    dir: &Path,
    range: ParticipantRange,
    policy: OutlierPolicy,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let records: Vec<SelectionRecord> =
        load_participants(dir, range, DatasetKind::Selections).context("loading selection logs")?;

    let design = DesignReport::from_records(&records);
    if let Err(e) = design
        .check(&config.design)
        .and_then(|()| design.check_declared(&config.levels))
        .and_then(|()| check_unique_condition_blocks(&records).map(|_| ()))
    {
        eprint!("{}", design.render_cell_counts());
        return Err(e).context("selection logs fail design validation");
    }

    let events: Vec<_> = records.iter().map(SelectionRecord::to_event).collect();
    let (trials, outliers) = policy.apply(derive_trials(&events));
    if outliers.discarded > 0 {
        warn!(
            "Discarded {} of {} selections as outliers",
            outliers.discarded, outliers.total
        );
        for (key, count) in &outliers.per_condition {
            info!("  {}: {}", key.describe(), count);
        }
    }

    let summaries = summarize(&trials, &config.levels, config.width_factor);
    report_overview(&summaries, config);

    let wide = WideTable::pivot(
        &summaries,
        &DependentVariable::ALL,
        &WIDE_FACTORS,
        &config.levels,
        &config.delimiter,
    )?;
    let header = wide.header()?;
    let rows = wide.string_rows();

    write_table(&output_path(output_dir, range, WIDE_SUFFIX), &header, &rows)?;
    write_records(&output_path(output_dir, range, LONG_SUFFIX), &summaries)?;
    Ok(())
}

fn report_overview(summaries: &[ConditionSummary], config: &AnalysisConfig) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));

    println!("ParticipantID\tReferenceFrame\tSuccess\tMT\tdx\tae\tWeCM\tIDe\tTP");
    for row in ReferenceFrameOverview::from_summaries(summaries, &config.levels) {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.participant,
            row.reference_frame,
            fmt(row.success),
            fmt(row.mt),
            fmt(row.dx),
            fmt(row.ae),
            fmt(row.we_cm),
            fmt(row.ide),
            fmt(row.tp)
        );
    }

    for (direction, count) in circle_direction_counts(summaries, &config.levels) {
        info!("{} conditions walked {}", count, direction);
    }
}
