//! ART ANOVA and Shapiro-Wilk tests through an external `Rscript` process.
//!
//! Each call writes the long table and a generated script into a scratch
//! directory, runs the script, and reads back result CSVs with fixed,
//! lower-case column names. The `ARTool` package must be installed.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use refframe_core::{Error, FactorLevels, Result};

use crate::backend::{
    AnovaRow, ArtFormula, ArtReport, ContrastRow, NormalityResult, StatisticalBackend,
    SUBJECT_COLUMN,
};
use crate::reshape::LongTable;

const DATA_FILE: &str = "data.csv";
const SCRIPT_FILE: &str = "analysis.R";
const ANOVA_FILE: &str = "anova.csv";
const NORMALITY_FILE: &str = "normality.csv";

fn contrast_file(index: usize) -> String {
    format!("contrast_{index}.csv")
}

/// Backend that shells out to `Rscript`
#[derive(Debug, Clone)]
pub struct RscriptBackend {
    program: PathBuf,
    levels: FactorLevels,
}

impl RscriptBackend {
    pub fn new(program: impl Into<PathBuf>, levels: FactorLevels) -> Self {
        Self {
            program: program.into(),
            levels,
        }
    }

    /// Whether the interpreter can be started at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Script fitting the ART model and writing ANOVA and contrast tables
    pub fn art_script(&self, table: &LongTable, formula: &ArtFormula, dir: &Path) -> String {
        let mut script = self.preamble(table, dir);
        script.push_str("suppressPackageStartupMessages(library(ARTool))\n");

        writeln!(script, "m <- art({formula}, data = data)").ok();
        script.push_str("a <- anova(m)\n");
        writeln!(
            script,
            "write.csv(data.frame(term = a$Term, f = a$F, df = a$Df, df_res = a$Df.res, \
             p = a[[\"Pr(>F)\"]]), {}, row.names = FALSE)",
            r_string(&dir.join(ANOVA_FILE))
        ).ok();

        for (index, term) in formula.contrasts.iter().enumerate() {
            let name = ArtFormula::term_name(term);
            writeln!(script, "con <- as.data.frame(art.con(m, {}))", r_quote(&name)).ok();
            writeln!(
                script,
                "write.csv(data.frame(term = {}, contrast = con$contrast, estimate = con$estimate, \
                 se = con$SE, df = con$df, t = con$t.ratio, p = con$p.value), {}, row.names = FALSE)",
                r_quote(&name),
                r_string(&dir.join(contrast_file(index)))
            ).ok();
        }

        script
    }

    /// Script running one Shapiro-Wilk test per condition cell
    pub fn normality_script(&self, table: &LongTable, dir: &Path) -> String {
        let mut script = self.preamble(table, dir);
        let factors: Vec<String> = table
            .factors
            .iter()
            .map(|f| r_quote(f.column_name()))
            .collect();

        writeln!(
            script,
            "cells <- split(data[[{}]], interaction(data[c({})], sep = \"_\", drop = TRUE, lex.order = TRUE))",
            r_quote(table.dependent.column_name()),
            factors.join(", ")
        ).ok();
        script.push_str(
            "rows <- lapply(names(cells), function(n) {\n\
             \x20 x <- cells[[n]]\n\
             \x20 if (length(x) >= 3 && length(x) <= 5000 && length(unique(x)) > 1) {\n\
             \x20   r <- shapiro.test(x)\n\
             \x20   data.frame(condition = n, n = length(x), w = unname(r$statistic), p = r$p.value)\n\
             \x20 } else {\n\
             \x20   data.frame(condition = n, n = length(x), w = NA, p = NA)\n\
             \x20 }\n\
             })\n",
        );
        writeln!(
            script,
            "write.csv(do.call(rbind, rows), {}, row.names = FALSE, na = \"\")",
            r_string(&dir.join(NORMALITY_FILE))
        ).ok();

        script
    }

    /// Read the data and declare every factor with its level order
    fn preamble(&self, table: &LongTable, dir: &Path) -> String {
        let mut script = String::new();
        writeln!(
            script,
            "data <- read.csv({}, check.names = FALSE, stringsAsFactors = FALSE, \
             colClasses = \"character\")",
            r_string(&dir.join(DATA_FILE))
        ).ok();
        writeln!(
            script,
            "data${SUBJECT_COLUMN} <- factor(data${SUBJECT_COLUMN})"
        ).ok();
        for factor in &table.factors {
            let levels: Vec<String> = table
                .levels_present(*factor, &self.levels)
                .iter()
                .map(|l| r_quote(l))
                .collect();
            let column = factor.column_name();
            writeln!(
                script,
                "data${column} <- factor(data${column}, levels = c({}))",
                levels.join(", ")
            ).ok();
        }
        let dependent = table.dependent.column_name();
        writeln!(script, "data${dependent} <- as.numeric(data${dependent})").ok();
        script
    }

    fn run(&self, script: &str, dir: &Path) -> Result<()> {
        let script_path = dir.join(SCRIPT_FILE);
        fs::write(&script_path, script)?;
        debug!("Running {} {}", self.program.display(), script_path.display());

        let output = Command::new(&self.program)
            .arg(&script_path)
            .current_dir(dir)
            .output()
            .map_err(|e| {
                Error::Statistics(format!("failed to start {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Statistics(format!(
                "{} failed with exit code {:?}: {}",
                self.program.display(),
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl StatisticalBackend for RscriptBackend {
    fn name(&self) -> &str {
        "Rscript/ARTool"
    }

    fn aligned_rank_anova(&self, table: &LongTable, formula: &ArtFormula) -> Result<ArtReport> {
        formula.validate()?;
        formula.check_table(table)?;
        if table.rows.is_empty() {
            return Err(Error::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let scratch = tempfile::tempdir()?;
        table.write_csv(&scratch.path().join(DATA_FILE))?;
        self.run(&self.art_script(table, formula, scratch.path()), scratch.path())?;

        let anova: Vec<AnovaRow> = read_results(&scratch.path().join(ANOVA_FILE))?;
        let mut contrasts = Vec::new();
        for index in 0..formula.contrasts.len() {
            let mut rows: Vec<ContrastRow> =
                read_results(&scratch.path().join(contrast_file(index)))?;
            contrasts.append(&mut rows);
        }

        info!(
            "ART {}: {} terms, {} contrasts",
            formula,
            anova.len(),
            contrasts.len()
        );
        Ok(ArtReport {
            formula: formula.to_string(),
            anova,
            contrasts,
        })
    }

    fn shapiro_wilk(&self, table: &LongTable) -> Result<Vec<NormalityResult>> {
        let scratch = tempfile::tempdir()?;
        table.write_csv(&scratch.path().join(DATA_FILE))?;
        self.run(&self.normality_script(table, scratch.path()), scratch.path())?;
        read_results(&scratch.path().join(NORMALITY_FILE))
    }
}

pub(crate) fn read_results<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Statistics(format!("missing result {}: {e}", path.display())))?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| Error::Statistics(format!("malformed result {}: {e}", path.display())))
}

fn r_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn r_string(path: &Path) -> String {
    r_quote(&path.to_string_lossy())
}
