//! `refframe subjective`: questionnaire tests and figure.

use std::path::Path;

use tracing::warn;

use refframe_core::{Error, Factor};
use refframe_io::{item_blocks, read_questionnaire, SubjectiveItem};
use refframe_plot::{BoxGroup, BoxPlotRenderer, BoxPlotSpec, GroupLabel, SignificanceAnnotation};
use refframe_stats::{friedman_test, pairwise_wilcoxon, write_json, ItemReport};

use crate::config::AnalysisConfig;

pub const REPORT_FILE: &str = "subjective.json";

/// Every pair of the three frames
const FRAME_PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

pub fn run(
    csv: &Path,
    plotted: SubjectiveItem,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let frames = config.levels.declared(Factor::ReferenceFrame).to_vec();
    if frames.len() != 3 {
        anyhow::bail!("questionnaire analysis expects 3 reference frames, got {}", frames.len());
    }
    let responses = read_questionnaire(csv, &frames)?;

    let mut reports = Vec::with_capacity(SubjectiveItem::ALL.len());
    for item in SubjectiveItem::ALL {
        let blocks = item_blocks(&responses, &frames, item);
        let friedman = match friedman_test(&blocks) {
            Ok(result) => Some(result),
            Err(Error::Statistics(reason)) => {
                warn!("{}: {}", item, reason);
                None
            }
            Err(e) => return Err(e.into()),
        };
        let pairwise = pairwise_wilcoxon(&blocks, &frames, &FRAME_PAIRS)?;
        let respondents = blocks.len();

        match &friedman {
            Some(f) => println!(
                "{}: chi2({}) = {:.3}, p = {:.4}, n = {}",
                item, f.df, f.statistic, f.p_value, f.blocks
            ),
            None => println!("{}: no variation", item),
        }
        reports.push((
            item,
            blocks,
            ItemReport {
                item: item.label().to_string(),
                respondents,
                friedman,
                pairwise,
            },
        ));
    }

    let Some((_, blocks, report)) = reports.iter().find(|(item, _, _)| *item == plotted) else {
        anyhow::bail!("{} was not analysed", plotted);
    };
    let groups: Vec<BoxGroup> = frames
        .iter()
        .enumerate()
        .map(|(j, frame)| BoxGroup {
            label: GroupLabel::new(frame.as_str()),
            values: blocks.iter().map(|block| block[j]).collect(),
        })
        .collect();
    let annotations: Vec<SignificanceAnnotation> = report
        .pairwise
        .iter()
        .map(|c| SignificanceAnnotation {
            first: GroupLabel::new(c.first.as_str()),
            second: GroupLabel::new(c.second.as_str()),
            p_value: c.adjusted_p,
        })
        .collect();

    let spec = BoxPlotSpec::new(plotted.label().replace(' ', ""), Factor::ReferenceFrame);
    let item_reports: Vec<&ItemReport> = reports.iter().map(|(_, _, r)| r).collect();

    std::fs::create_dir_all(output_dir)?;
    BoxPlotRenderer::new(config.levels.clone())
        .with_size(450, 525)
        .render(&spec, &groups, &annotations, &output_dir.join(spec.file_name()))?;
    write_json(&output_dir.join(REPORT_FILE), &item_reports)?;
    Ok(())
}
