//! `refframe stats`: ART ANOVA of one dependent variable through R.

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use refframe_core::Factor;
use refframe_io::read_csv;
use refframe_pointing::{ConditionSummary, DependentVariable};
use refframe_stats::{
    write_json, ArtFormula, LongTable, RscriptBackend, StatisticalBackend, StatsReport,
};

use crate::commands::preprocess::WIDE_FACTORS;
use crate::config::AnalysisConfig;

pub fn run(
    long_csv: &Path,
    dependent: DependentVariable,
    skip_normality: bool,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let summaries: Vec<ConditionSummary> = read_csv(long_csv)?;
    let table = LongTable::from_summaries(&summaries, dependent, &WIDE_FACTORS, &config.levels);
    info!("{} rows of {} for the ART model", table.rows.len(), dependent);

    let formula = ArtFormula::new(dependent.column_name(), WIDE_FACTORS.to_vec())
        .with_contrast(vec![Factor::Movement, Factor::ReferenceFrame]);

    let backend = RscriptBackend::new(&config.rscript, config.levels.clone());
    if !backend.is_available() {
        anyhow::bail!(
            "{} cannot be started; install R with the ARTool package or set `rscript`",
            config.rscript.display()
        );
    }

    let normality = if skip_normality {
        Vec::new()
    } else {
        backend.shapiro_wilk(&table).context("Shapiro-Wilk tests")?
    };
    for cell in normality.iter().filter(|c| c.p.is_some_and(|p| p < config.alpha)) {
        warn!("{} deviates from normality (W = {:?}, p = {:?})", cell.condition, cell.w, cell.p);
    }

    let art = backend
        .aligned_rank_anova(&table, &formula)
        .context("ART ANOVA")?;

    println!("{}", art.formula);
    println!("Term\tF\tDf\tDf.res\tp");
    for row in &art.anova {
        println!("{}\t{:.3}\t{}\t{}\t{:.4}", row.term, row.f, row.df, row.df_res, row.p);
    }
    for row in art.contrasts.iter().filter(|c| c.p < config.alpha) {
        println!("{} {}: t = {:.3}, p = {:.4}", row.term, row.contrast, row.t, row.p);
    }
    let significant: Vec<&str> = art
        .significant_terms(config.alpha)
        .map(|r| r.term.as_str())
        .collect();
    info!("Significant at {}: {:?}", config.alpha, significant);

    let report = StatsReport {
        dependent: dependent.column_name().to_string(),
        backend: backend.name().to_string(),
        normality,
        art,
    };
    write_json(
        &output_dir.join(format!("{}_art.json", dependent.column_name())),
        &report,
    )?;
    Ok(())
}
