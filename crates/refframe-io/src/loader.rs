//! Participant file discovery and CSV loading.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use refframe_core::{Error, Result};

/// The two logs written per participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Selections,
    HighFrequency,
}

impl DatasetKind {
    pub fn file_name(&self, participant: u32) -> String {
        match self {
            DatasetKind::Selections => format!("{participant}_selections.csv"),
            DatasetKind::HighFrequency => format!("{participant}_highFrequency.csv"),
        }
    }
}

/// Inclusive range of participant ids to analyse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRange {
    pub start: u32,
    pub end: u32,
}

impl Default for ParticipantRange {
    fn default() -> Self {
        Self { start: 5, end: 28 }
    }
}

impl ParticipantRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "participant range {start}-{end} is empty"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// Prefix used for output file names, e.g. `5-28`
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Deserialize every row of one CSV file
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Csv(format!("{}: {e}", path.display())))?;

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| Error::Csv(format!("{}: {e}", path.display())))
}

/// Load and concatenate one file per participant, in id order.
///
/// Missing participants are skipped; finding no file at all is an error.
pub fn load_participants<T: DeserializeOwned>(
    dir: &Path,
    range: ParticipantRange,
    kind: DatasetKind,
) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    let mut files = 0usize;

    for id in range.ids() {
        let path = dir.join(kind.file_name(id));
        if !path.is_file() {
            warn!("No {:?} log for participant {} ({})", kind, id, path.display());
            continue;
        }

        let mut participant_rows = read_csv::<T>(&path)?;
        debug!("Loaded {} rows from {}", participant_rows.len(), path.display());
        rows.append(&mut participant_rows);
        files += 1;
    }

    if files == 0 {
        return Err(Error::NoParticipantData {
            dir: dir.to_path_buf(),
            start: range.start,
            end: range.end,
        });
    }

    info!("Loaded {} rows from {} {:?} files", rows.len(), files, kind);
    Ok(rows)
}

/// Load and concatenate an explicit list of files in argument order
pub fn load_files<T: DeserializeOwned>(paths: &[PathBuf]) -> Result<Vec<T>> {
    if paths.is_empty() {
        return Err(Error::InvalidInput("no input files given".to_string()));
    }

    let mut rows = Vec::new();
    for path in paths {
        let mut file_rows = read_csv::<T>(path)?;
        debug!("Loaded {} rows from {}", file_rows.len(), path.display());
        rows.append(&mut file_rows);
    }

    Ok(rows)
}
