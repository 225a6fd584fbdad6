//! Post-study questionnaire: NASA-TLX items and preference ranking.
//!
//! The survey export is semicolon-delimited with one row per respondent.
//! Each reference frame owns six columns, named after the frame for the
//! first item and suffixed `2` to `6` for the others. The preference
//! question stores the dragged order of the frames as one quoted,
//! semicolon-joined cell.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use refframe_core::{Error, Result};

pub const PREFERENCE_COLUMN: &str = "Please arrange the following reference frames in order of preference (the higher in the list the better):";

/// Rated questionnaire items, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectiveItem {
    MentalDemand,
    PhysicalDemand,
    TemporalDemand,
    Performance,
    Effort,
    Frustration,
    Preference,
}

impl SubjectiveItem {
    pub const ALL: [SubjectiveItem; 7] = [
        SubjectiveItem::MentalDemand,
        SubjectiveItem::PhysicalDemand,
        SubjectiveItem::TemporalDemand,
        SubjectiveItem::Performance,
        SubjectiveItem::Effort,
        SubjectiveItem::Frustration,
        SubjectiveItem::Preference,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SubjectiveItem::MentalDemand => "Mental Demand",
            SubjectiveItem::PhysicalDemand => "Physical Demand",
            SubjectiveItem::TemporalDemand => "Temporal Demand",
            SubjectiveItem::Performance => "Performance",
            SubjectiveItem::Effort => "Effort",
            SubjectiveItem::Frustration => "Frustration",
            SubjectiveItem::Preference => "Preference",
        }
    }

    /// Column holding this TLX item for a frame; `None` for the ranking
    fn column(&self, frame: &str) -> Option<String> {
        let suffix = match self {
            SubjectiveItem::MentalDemand => "",
            SubjectiveItem::PhysicalDemand => "2",
            SubjectiveItem::TemporalDemand => "3",
            SubjectiveItem::Performance => "4",
            SubjectiveItem::Effort => "5",
            SubjectiveItem::Frustration => "6",
            SubjectiveItem::Preference => return None,
        };
        Some(format!("{frame}{suffix}"))
    }
}

impl FromStr for SubjectiveItem {
    type Err = Error;

    /// Accepts the label with or without spaces, in any case
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        SubjectiveItem::ALL
            .into_iter()
            .find(|item| item.label().replace(' ', "").eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::InvalidInput(format!("unknown questionnaire item '{s}'")))
    }
}

impl fmt::Display for SubjectiveItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ratings of one respondent for one reference frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectiveResponse {
    pub respondent: usize,
    pub reference_frame: String,
    pub mental_demand: f64,
    pub physical_demand: f64,
    pub temporal_demand: f64,
    pub performance: f64,
    pub effort: f64,
    pub frustration: f64,
    /// 1 is the most preferred frame
    pub preference: u32,
}

impl SubjectiveResponse {
    pub fn value(&self, item: SubjectiveItem) -> f64 {
        match item {
            SubjectiveItem::MentalDemand => self.mental_demand,
            SubjectiveItem::PhysicalDemand => self.physical_demand,
            SubjectiveItem::TemporalDemand => self.temporal_demand,
            SubjectiveItem::Performance => self.performance,
            SubjectiveItem::Effort => self.effort,
            SubjectiveItem::Frustration => self.frustration,
            SubjectiveItem::Preference => f64::from(self.preference),
        }
    }
}

/// Position of `frame` in a semicolon-joined ranking, starting at 1
pub fn preference_rank(ranking: &str, frame: &str) -> Option<u32> {
    ranking
        .split(';')
        .position(|entry| entry.trim() == frame)
        .and_then(|index| u32::try_from(index + 1).ok())
}

pub fn read_questionnaire(path: &Path, frames: &[String]) -> Result<Vec<SubjectiveResponse>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
    parse_questionnaire(file, frames)
}

/// One response per (respondent, frame), respondents in file order
pub fn parse_questionnaire<R: Read>(input: R, frames: &[String]) -> Result<Vec<SubjectiveResponse>> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b';').from_reader(input);

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_string(), index))
        .collect();

    let preference_index = *columns
        .get(PREFERENCE_COLUMN)
        .ok_or_else(|| Error::InvalidInput("questionnaire has no preference column".into()))?;

    let mut responses = Vec::new();
    for (respondent, record) in reader.records().enumerate() {
        let record = record?;
        let ranking = record.get(preference_index).unwrap_or_default();

        for frame in frames {
            let rating = |item: SubjectiveItem| -> Result<f64> {
                let column = item.column(frame).unwrap_or_default();
                let index = columns.get(&column).ok_or_else(|| {
                    Error::InvalidInput(format!("questionnaire has no column '{column}'"))
                })?;
                let raw = record.get(*index).unwrap_or_default().trim();
                raw.replace(',', ".").parse::<f64>().map_err(|_| {
                    Error::InvalidInput(format!(
                        "respondent {}: '{raw}' in '{column}' is not a number",
                        respondent + 1
                    ))
                })
            };

            let preference = preference_rank(ranking, frame).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "respondent {}: '{frame}' missing from preference ranking",
                    respondent + 1
                ))
            })?;

            responses.push(SubjectiveResponse {
                respondent: respondent + 1,
                reference_frame: frame.clone(),
                mental_demand: rating(SubjectiveItem::MentalDemand)?,
                physical_demand: rating(SubjectiveItem::PhysicalDemand)?,
                temporal_demand: rating(SubjectiveItem::TemporalDemand)?,
                performance: rating(SubjectiveItem::Performance)?,
                effort: rating(SubjectiveItem::Effort)?,
                frustration: rating(SubjectiveItem::Frustration)?,
                preference,
            });
        }
    }

    debug!("Parsed {} questionnaire responses", responses.len());
    Ok(responses)
}

/// Per-respondent values of one item, one column per frame, in frame order.
///
/// Respondents lacking a frame are dropped so the blocks stay complete.
pub fn item_blocks(
    responses: &[SubjectiveResponse],
    frames: &[String],
    item: SubjectiveItem,
) -> Vec<Vec<f64>> {
    let mut by_respondent: BTreeMap<usize, Vec<Option<f64>>> = BTreeMap::new();

    for response in responses {
        let Some(slot) = frames.iter().position(|f| *f == response.reference_frame) else {
            continue;
        };
        by_respondent
            .entry(response.respondent)
            .or_insert_with(|| vec![None; frames.len()])[slot] = Some(response.value(item));
    }

    by_respondent
        .into_values()
        .filter_map(|row| row.into_iter().collect::<Option<Vec<f64>>>())
        .collect()
}
