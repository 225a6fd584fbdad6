//! `refframe plot`: box plot of one dependent variable.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use refframe_core::{Error, Factor, FactorLevels, ParticipantId};
use refframe_io::read_csv;
use refframe_pointing::{ConditionSummary, DependentVariable};
use refframe_plot::{BoxGroup, BoxPlotRenderer, BoxPlotSpec, GroupLabel, SignificanceAnnotation};
use refframe_stats::{wilcoxon_signed_rank, LongTable};

use crate::config::AnalysisConfig;

type GroupValues = BTreeMap<GroupLabel, BTreeMap<ParticipantId, f64>>;

pub fn run(
    long_csv: &Path,
    dependent: DependentVariable,
    x_factor: Factor,
    hue_factor: Option<Factor>,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let summaries: Vec<ConditionSummary> = read_csv(long_csv)?;
    let factors: Vec<Factor> = std::iter::once(x_factor).chain(hue_factor).collect();
    let table = LongTable::from_summaries(&summaries, dependent, &factors, &config.levels);

    let values = group_values(&table);
    let annotations = paired_annotations(&values, x_factor, hue_factor, &config.levels);
    let groups: Vec<BoxGroup> = values
        .iter()
        .map(|(label, by_participant)| BoxGroup {
            label: label.clone(),
            values: by_participant.values().copied().collect(),
        })
        .collect();

    let mut spec = BoxPlotSpec::new(dependent.column_name(), x_factor);
    if let Some(hue) = hue_factor {
        spec = spec.with_hue(hue);
    }

    std::fs::create_dir_all(output_dir)?;
    BoxPlotRenderer::new(config.levels.clone()).render(
        &spec,
        &groups,
        &annotations,
        &output_dir.join(spec.file_name()),
    )?;
    Ok(())
}

fn group_values(table: &LongTable) -> GroupValues {
    let mut values = GroupValues::new();
    for row in &table.rows {
        let label = GroupLabel {
            x: row.labels[0].clone(),
            hue: row.labels.get(1).cloned(),
        };
        values.entry(label).or_default().insert(row.participant, row.value);
    }
    values
}

/// Wilcoxon tests between neighbouring boxes, paired by participant.
///
/// With a hue factor the hue levels are compared within each x level,
/// otherwise the x levels are compared with each other.
fn paired_annotations(
    values: &GroupValues,
    x_factor: Factor,
    hue_factor: Option<Factor>,
    levels: &FactorLevels,
) -> Vec<SignificanceAnnotation> {
    let mut x_levels: Vec<String> = values.keys().map(|l| l.x.clone()).collect();
    levels.sort_labels(x_factor, &mut x_levels);

    let mut pairs: Vec<(GroupLabel, GroupLabel)> = Vec::new();
    match hue_factor {
        Some(hue) => {
            let mut hue_levels: Vec<String> = values.keys().filter_map(|l| l.hue.clone()).collect();
            levels.sort_labels(hue, &mut hue_levels);
            for x in &x_levels {
                for pair in hue_levels.windows(2) {
                    pairs.push((
                        GroupLabel::with_hue(x.as_str(), pair[0].as_str()),
                        GroupLabel::with_hue(x.as_str(), pair[1].as_str()),
                    ));
                }
            }
        }
        None => {
            for pair in x_levels.windows(2) {
                pairs.push((GroupLabel::new(pair[0].as_str()), GroupLabel::new(pair[1].as_str())));
            }
        }
    }

    pairs
        .into_iter()
        .filter_map(|(first, second)| {
            let (a, b) = (values.get(&first)?, values.get(&second)?);
            let (x, y): (Vec<f64>, Vec<f64>) = a
                .iter()
                .filter_map(|(participant, va)| b.get(participant).map(|vb| (*va, *vb)))
                .unzip();
            match wilcoxon_signed_rank(&x, &y) {
                Ok(result) => Some(SignificanceAnnotation {
                    first,
                    second,
                    p_value: result.p_value,
                }),
                Err(Error::InsufficientData { .. }) => None,
                Err(e) => {
                    debug!("No test between {:?} and {:?}: {}", first, second, e);
                    None
                }
            }
        })
        .collect()
}
