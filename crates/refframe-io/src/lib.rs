//! # Refframe-IO
//!
//! Reading and writing the study's CSV files.
//!
//! Per participant the headset writes `{id}_selections.csv` (one row per
//! target selection) and `{id}_highFrequency.csv` (one row per frame).
//! This crate deserializes both into typed records, checks that the
//! factorial design is complete before anything is derived from it, and
//! writes the derived tables back out.

pub mod export;
pub mod loader;
pub mod questionnaire;
pub mod records;
pub mod validation;

pub use export::{format_value, output_path, write_records, write_table};
pub use loader::{load_files, load_participants, read_csv, DatasetKind, ParticipantRange};
pub use questionnaire::{
    item_blocks, parse_questionnaire, preference_rank, read_questionnaire, SubjectiveItem,
    SubjectiveResponse,
};
pub use records::{HighFrequencyRecord, SelectionRecord};
pub use validation::{check_unique_condition_blocks, DesignExpectations, DesignReport};
