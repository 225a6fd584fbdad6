//! Effective-width throughput per condition.
//!
//! ## Per condition
//!
//! ```text
//! WeCM = SD(dx) · 4.133 · 100
//! IDe  = log2(ae · 100 / WeCM + 1)
//! TP   = IDe / MT
//! ```
//!
//! `MT` is the mean selection duration in seconds. A condition with fewer
//! than two defined `dx` has no spread and therefore no `WeCM`, `IDe` or
//! `TP`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use refframe_core::{
    mean, mean_defined, sample_std, ConditionKey, Error, Factor, FactorLevels, Movement,
    ParticipantId, GEOMETRY_EPSILON,
};

use crate::fitts::PointingTrial;

/// Scale from the standard deviation of the endpoints to effective width
pub const EFFECTIVE_WIDTH_FACTOR: f64 = 4.133;

/// Per-condition dependent variables, in export order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependentVariable {
    Success,
    MovementTime,
    Dx,
    Ae,
    DistanceCm,
    EffectiveWidthCm,
    EffectiveIndex,
    Throughput,
}

impl DependentVariable {
    pub const ALL: [DependentVariable; 8] = [
        DependentVariable::Success,
        DependentVariable::MovementTime,
        DependentVariable::Dx,
        DependentVariable::Ae,
        DependentVariable::DistanceCm,
        DependentVariable::EffectiveWidthCm,
        DependentVariable::EffectiveIndex,
        DependentVariable::Throughput,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            DependentVariable::Success => "Success",
            DependentVariable::MovementTime => "MT",
            DependentVariable::Dx => "dx",
            DependentVariable::Ae => "ae",
            DependentVariable::DistanceCm => "DistanceCM",
            DependentVariable::EffectiveWidthCm => "WeCM",
            DependentVariable::EffectiveIndex => "IDe",
            DependentVariable::Throughput => "TP",
        }
    }
}

impl fmt::Display for DependentVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for DependentVariable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DependentVariable::ALL
            .into_iter()
            .find(|v| v.column_name() == s.trim())
            .ok_or_else(|| Error::InvalidInput(format!("unknown dependent variable '{s}'")))
    }
}

/// Aggregated performance of one participant in one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    #[serde(rename = "ParticipantID")]
    pub participant: ParticipantId,
    #[serde(rename = "Movement")]
    pub movement: Movement,
    #[serde(rename = "CircleDirection")]
    pub circle_direction: Option<String>,
    #[serde(rename = "ReferenceFrame")]
    pub reference_frame: String,
    #[serde(rename = "TargetSize")]
    pub target_size: String,
    /// Success rate in [0, 1]
    #[serde(rename = "Success")]
    pub success: Option<f64>,
    /// Mean movement time (s)
    #[serde(rename = "MT")]
    pub mt: Option<f64>,
    /// Standard deviation of dx (m)
    #[serde(rename = "dx")]
    pub dx: Option<f64>,
    /// Mean effective amplitude (m)
    #[serde(rename = "ae")]
    pub ae: Option<f64>,
    #[serde(rename = "DistanceCM")]
    pub distance_cm: Option<f64>,
    #[serde(rename = "WeCM")]
    pub we_cm: Option<f64>,
    #[serde(rename = "IDe")]
    pub ide: Option<f64>,
    #[serde(rename = "TP")]
    pub tp: Option<f64>,
    #[serde(rename = "Trials", default)]
    pub trials: usize,
}

impl ConditionSummary {
    pub fn key(&self) -> ConditionKey {
        ConditionKey {
            participant: self.participant,
            movement: self.movement,
            circle_direction: self.circle_direction.clone().filter(|d| !d.is_empty()),
            reference_frame: self.reference_frame.clone(),
            target_size: self.target_size.clone(),
        }
    }

    pub fn value(&self, variable: DependentVariable) -> Option<f64> {
        match variable {
            DependentVariable::Success => self.success,
            DependentVariable::MovementTime => self.mt,
            DependentVariable::Dx => self.dx,
            DependentVariable::Ae => self.ae,
            DependentVariable::DistanceCm => self.distance_cm,
            DependentVariable::EffectiveWidthCm => self.we_cm,
            DependentVariable::EffectiveIndex => self.ide,
            DependentVariable::Throughput => self.tp,
        }
    }

    fn from_trials(key: ConditionKey, trials: &[&PointingTrial], width_factor: f64) -> Self {
        let success: Vec<f64> = trials
            .iter()
            .map(|t| if t.success { 1.0 } else { 0.0 })
            .collect();
        let mt_s: Vec<f64> = trials.iter().map(|t| t.movement_time_ms / 1000.0).collect();
        let dx: Vec<f64> = trials.iter().filter_map(|t| t.dx()).collect();
        let distance: Vec<f64> = trials.iter().map(|t| t.distance_cm()).collect();

        let mt = mean(&mt_s);
        let sd_dx = sample_std(&dx);
        let ae = mean_defined(trials.iter().map(|t| t.ae()));

        let we_cm = sd_dx.map(|sd| sd * width_factor * 100.0);
        let ide = match (ae, we_cm) {
            (Some(ae), Some(we)) if we.abs() > GEOMETRY_EPSILON => {
                Some((ae * 100.0 / we + 1.0).log2()).filter(|v| v.is_finite())
            }
            _ => None,
        };
        let tp = match (ide, mt) {
            (Some(ide), Some(mt)) if mt > 0.0 => Some(ide / mt),
            _ => None,
        };

        Self {
            participant: key.participant,
            movement: key.movement,
            circle_direction: key.circle_direction,
            reference_frame: key.reference_frame,
            target_size: key.target_size,
            success: mean(&success),
            mt,
            dx: sd_dx,
            ae,
            distance_cm: mean(&distance),
            we_cm,
            ide,
            tp,
            trials: trials.len(),
        }
    }
}

/// One summary per (participant, Movement, CircleDirection, ReferenceFrame,
/// TargetSize), ordered by participant and declared level order
pub fn summarize(
    trials: &[PointingTrial],
    levels: &FactorLevels,
    width_factor: f64,
) -> Vec<ConditionSummary> {
    let mut groups: BTreeMap<&ConditionKey, Vec<&PointingTrial>> = BTreeMap::new();
    for trial in trials {
        groups.entry(&trial.key).or_default().push(trial);
    }

    let mut keyed: Vec<(ConditionKey, ConditionSummary)> = groups
        .into_iter()
        .map(|(key, group)| {
            let summary = ConditionSummary::from_trials(key.clone(), &group, width_factor);
            if summary.tp.is_none() {
                debug!("No throughput for {}", key.describe());
            }
            (key.clone(), summary)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| levels.compare_keys(a, b));

    info!(
        "Summarised {} trials into {} conditions",
        trials.len(),
        keyed.len()
    );
    keyed.into_iter().map(|(_, summary)| summary).collect()
}

/// Condition means of one participant under one reference frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrameOverview {
    pub participant: ParticipantId,
    pub reference_frame: String,
    pub success: Option<f64>,
    pub mt: Option<f64>,
    /// Sample standard deviation of the condition SDx values, not their mean
    pub dx: Option<f64>,
    pub ae: Option<f64>,
    pub we_cm: Option<f64>,
    pub ide: Option<f64>,
    pub tp: Option<f64>,
    pub conditions: usize,
}

impl ReferenceFrameOverview {
    pub fn from_summaries(summaries: &[ConditionSummary], levels: &FactorLevels) -> Vec<Self> {
        let mut groups: BTreeMap<(ParticipantId, &str), Vec<&ConditionSummary>> = BTreeMap::new();
        for summary in summaries {
            groups
                .entry((summary.participant, summary.reference_frame.as_str()))
                .or_default()
                .push(summary);
        }

        let mut rows: Vec<Self> = groups
            .into_iter()
            .map(|((participant, reference_frame), group)| {
                let avg = |variable: DependentVariable| {
                    mean_defined(group.iter().map(|s| s.value(variable)))
                };
                Self {
                    participant,
                    reference_frame: reference_frame.to_string(),
                    success: avg(DependentVariable::Success),
                    mt: avg(DependentVariable::MovementTime),
                    dx: {
                        let spreads: Vec<f64> = group.iter().filter_map(|s| s.dx).collect();
                        sample_std(&spreads)
                    },
                    ae: avg(DependentVariable::Ae),
                    we_cm: avg(DependentVariable::EffectiveWidthCm),
                    ide: avg(DependentVariable::EffectiveIndex),
                    tp: avg(DependentVariable::Throughput),
                    conditions: group.len(),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.participant.cmp(&b.participant).then_with(|| {
                levels.compare(Factor::ReferenceFrame, &a.reference_frame, &b.reference_frame)
            })
        });
        rows
    }
}

/// Number of summary rows per circle direction, declared directions first
pub fn circle_direction_counts(
    summaries: &[ConditionSummary],
    levels: &FactorLevels,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = levels
        .declared(Factor::CircleDirection)
        .iter()
        .map(|d| (d.clone(), 0))
        .collect();

    for direction in summaries.iter().filter_map(|s| s.circle_direction.as_deref()) {
        if !direction.is_empty() {
            *counts.entry(direction.to_string()).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|(a, _), (b, _)| levels.compare(Factor::CircleDirection, a, b));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitts::derive_trials;
    use refframe_core::{Position2D, SelectionEvent};

    fn event(
        participant: u32,
        rf: &str,
        target: f64,
        selection: f64,
        success: bool,
        duration_ms: f64,
    ) -> SelectionEvent {
        SelectionEvent {
            key: ConditionKey {
                participant: ParticipantId(participant),
                movement: Movement::Walking,
                circle_direction: None,
                reference_frame: rf.into(),
                target_size: "0.025".into(),
            },
            active_target_index: None,
            target: Position2D::new(target, 0.0),
            selection: Position2D::new(selection, 0.0),
            success,
            duration_ms,
        }
    }

    /// Bootstrap at 0, then a = 0.05 with b = 0.01 (overshoot) and
    /// b = 0.03 (undershoot)
    fn participant_events(participant: u32) -> Vec<SelectionEvent> {
        vec![
            event(participant, "Palm", 0.0, 0.0, true, 0.0),
            event(participant, "Palm", 0.05, 0.06, true, 500.0),
            event(participant, "Palm", 0.10, 0.07, false, 700.0),
        ]
    }

    #[test]
    fn test_hand_computed_throughput() {
        let events: Vec<SelectionEvent> = [7, 5, 6].into_iter().flat_map(participant_events).collect();
        let trials = derive_trials(&events);
        assert_eq!(trials.len(), 6);

        let summaries = summarize(&trials, &FactorLevels::default(), EFFECTIVE_WIDTH_FACTOR);
        assert_eq!(summaries.len(), 3);

        // dx = 0.01 and -0.03, ae = 0.06 and 0.02
        let sd = (0.0008f64).sqrt();
        let we_cm = sd * 4.133 * 100.0;
        let ide = (0.04 * 100.0 / we_cm + 1.0).log2();
        let tp = ide / 0.6;

        let ids: Vec<u32> = summaries.iter().map(|s| s.participant.0).collect();
        assert_eq!(ids, vec![5, 6, 7]);

        for s in &summaries {
            assert_eq!(s.trials, 2);
            assert!((s.success.unwrap() - 0.5).abs() < 1e-12);
            assert!((s.mt.unwrap() - 0.6).abs() < 1e-12);
            assert!((s.dx.unwrap() - sd).abs() < 1e-9);
            assert!((s.ae.unwrap() - 0.04).abs() < 1e-9);
            assert!((s.distance_cm.unwrap() - 2.0).abs() < 1e-9);
            assert!((s.we_cm.unwrap() - we_cm).abs() < 1e-9);
            assert!((s.ide.unwrap() - ide).abs() < 1e-9);
            assert!((s.tp.unwrap() - tp).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_trial_has_no_width() {
        let events = vec![
            event(5, "Path", 0.0, 0.0, true, 0.0),
            event(5, "Path", 0.05, 0.05, true, 400.0),
        ];
        let summaries = summarize(&derive_trials(&events), &FactorLevels::default(), 4.133);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].dx, None);
        assert_eq!(summaries[0].we_cm, None);
        assert_eq!(summaries[0].tp, None);
        assert!((summaries[0].mt.unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_first_event_excluded_from_spread() {
        // The very first selection has a duration, but no previous target
        let events = vec![
            event(5, "Palm", 0.0, 0.02, true, 300.0),
            event(5, "Palm", 0.05, 0.06, true, 500.0),
            event(5, "Palm", 0.10, 0.07, true, 700.0),
        ];
        let summaries = summarize(&derive_trials(&events), &FactorLevels::default(), 4.133);
        assert_eq!(summaries[0].trials, 3);
        assert!((summaries[0].dx.unwrap() - (0.0008f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_frames_follow_declared_order() {
        let mut events = Vec::new();
        for rf in ["Path", "Palm w/o Rotation", "Palm"] {
            events.extend(participant_events(5).into_iter().map(|mut e| {
                e.key.reference_frame = rf.to_string();
                e
            }));
        }
        let summaries = summarize(&derive_trials(&events), &FactorLevels::default(), 4.133);
        let frames: Vec<&str> = summaries.iter().map(|s| s.reference_frame.as_str()).collect();
        assert_eq!(frames, vec!["Palm", "Palm w/o Rotation", "Path"]);

        let overview = ReferenceFrameOverview::from_summaries(&summaries, &FactorLevels::default());
        assert_eq!(overview.len(), 3);
        assert_eq!(overview[2].reference_frame, "Path");
        assert_eq!(overview[0].conditions, 1);
    }

    #[test]
    fn test_overview_spread_of_dx() {
        let base = summarize(
            &derive_trials(&participant_events(5)),
            &FactorLevels::default(),
            4.133,
        )
        .remove(0);
        let with = |size: &str, dx: Option<f64>| ConditionSummary {
            target_size: size.to_string(),
            dx,
            ..base.clone()
        };
        let summaries = vec![
            with("0.015", Some(0.01)),
            with("0.025", Some(0.03)),
            with("0.035", None),
        ];

        let overview = ReferenceFrameOverview::from_summaries(&summaries, &FactorLevels::default());
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].conditions, 3);
        assert!((overview[0].dx.unwrap() - 0.0002f64.sqrt()).abs() < 1e-12);
        assert_eq!(overview[0].ae, base.ae);
    }

    #[test]
    fn test_circle_direction_counts() {
        let mut trials = derive_trials(&participant_events(5));
        for t in &mut trials {
            t.key.movement = Movement::Circle;
            t.key.circle_direction = Some("CounterClockwise".into());
        }
        let summaries = summarize(&trials, &FactorLevels::default(), 4.133);
        let counts = circle_direction_counts(&summaries, &FactorLevels::default());
        assert_eq!(
            counts,
            vec![("Clockwise".to_string(), 0), ("CounterClockwise".to_string(), 1)]
        );
    }

    #[test]
    fn test_summary_csv_roundtrip_columns() {
        let summaries = summarize(
            &derive_trials(&participant_events(5)),
            &FactorLevels::default(),
            4.133,
        );
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&summaries[0]).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(text.starts_with(
            "ParticipantID,Movement,CircleDirection,ReferenceFrame,TargetSize,Success,MT,dx,ae,DistanceCM,WeCM,IDe,TP,Trials\n5,Walking,,Palm,0.025,"
        ));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let parsed: ConditionSummary = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed.key(), summaries[0].key());
        assert_eq!(parsed.trials, 2);
    }

    #[test]
    fn test_dependent_variable_names() {
        for v in DependentVariable::ALL {
            assert_eq!(v.column_name().parse::<DependentVariable>().unwrap(), v);
        }
        assert!("Speed".parse::<DependentVariable>().is_err());
    }
}
