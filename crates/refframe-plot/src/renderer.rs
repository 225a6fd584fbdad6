//! Box-plot rendering with `plotters`.

use std::collections::BTreeSet;
use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use refframe_core::{Error, Factor, FactorLevels, Result};

use crate::boxstats::{BoxGroup, BoxStats, GroupLabel, SignificanceAnnotation};

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Share of a category's width taken by its boxes
const CATEGORY_FILL: f64 = 0.8;
/// Vertical distance between stacked brackets, as share of the data range
const BRACKET_STEP: f64 = 0.08;

const PALETTE: [RGBColor; 6] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
    RGBColor(196, 78, 82),
    RGBColor(129, 114, 179),
    RGBColor(147, 120, 96),
];

/// What to plot: one dependent variable over one or two factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotSpec {
    pub dependent: String,
    pub x_factor: Factor,
    pub hue_factor: Option<Factor>,
}

impl BoxPlotSpec {
    pub fn new(dependent: impl Into<String>, x_factor: Factor) -> Self {
        Self {
            dependent: dependent.into(),
            x_factor,
            hue_factor: None,
        }
    }

    pub fn with_hue(mut self, hue: Factor) -> Self {
        self.hue_factor = Some(hue);
        self
    }

    /// `TP_Movement_ReferenceFrame.png`, or `TP_Movement.png` without hue
    pub fn file_name(&self) -> String {
        match self.hue_factor {
            Some(hue) => format!(
                "{}_{}_{}.png",
                self.dependent,
                self.x_factor.column_name(),
                hue.column_name()
            ),
            None => format!("{}_{}.png", self.dependent, self.x_factor.column_name()),
        }
    }
}

/// Horizontal placement of one box
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSlot {
    pub label: GroupLabel,
    pub center: f64,
    pub width: f64,
    pub hue_index: usize,
    pub stats: BoxStats,
}

/// Category `i` spans `[i, i + 1]`; its hue boxes share the middle part
pub fn layout(
    spec: &BoxPlotSpec,
    groups: &[BoxGroup],
    levels: &FactorLevels,
) -> (Vec<String>, Vec<String>, Vec<BoxSlot>) {
    let mut x_levels: Vec<String> = groups.iter().map(|g| g.label.x.clone()).collect();
    levels.sort_labels(spec.x_factor, &mut x_levels);

    let mut hue_levels: Vec<String> = groups.iter().filter_map(|g| g.label.hue.clone()).collect();
    match spec.hue_factor {
        Some(hue) => levels.sort_labels(hue, &mut hue_levels),
        None => hue_levels.clear(),
    }

    let hue_count = hue_levels.len().max(1);
    let width = CATEGORY_FILL / hue_count as f64;

    let mut slots = Vec::with_capacity(groups.len());
    for (xi, x) in x_levels.iter().enumerate() {
        for hi in 0..hue_count {
            let hue = hue_levels.get(hi);
            let Some(group) = groups
                .iter()
                .find(|g| &g.label.x == x && g.label.hue.as_ref() == hue)
            else {
                continue;
            };
            let Some(stats) = BoxStats::from_values(&group.values) else {
                continue;
            };
            let left = xi as f64 + (1.0 - CATEGORY_FILL) / 2.0;
            slots.push(BoxSlot {
                label: group.label.clone(),
                center: left + width * (hi as f64 + 0.5),
                width,
                hue_index: hi,
                stats,
            });
        }
    }

    (x_levels, hue_levels, slots)
}

/// A bracket resolved to plot coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Bracket {
    pub left: f64,
    pub right: f64,
    pub y: f64,
    pub text: &'static str,
}

/// Stack brackets above the data, narrowest first
pub fn brackets(
    annotations: &[SignificanceAnnotation],
    slots: &[BoxSlot],
    y_max: f64,
    y_range: f64,
) -> Vec<Bracket> {
    let center_of = |label: &GroupLabel| slots.iter().find(|s| &s.label == label).map(|s| s.center);

    let mut resolved: Vec<(f64, f64, &'static str)> = annotations
        .iter()
        .filter_map(|a| {
            let (x1, x2) = (center_of(&a.first)?, center_of(&a.second)?);
            Some((x1.min(x2), x1.max(x2), a.text()))
        })
        .collect();
    resolved.sort_by(|a, b| (a.1 - a.0).total_cmp(&(b.1 - b.0)));

    let step = if y_range > 0.0 { y_range * BRACKET_STEP } else { 1.0 };
    resolved
        .into_iter()
        .enumerate()
        .map(|(level, (left, right, text))| Bracket {
            left,
            right,
            y: y_max + step * (level as f64 + 1.0),
            text,
        })
        .collect()
}

/// Renders box plots to PNG files
#[derive(Debug, Clone)]
pub struct BoxPlotRenderer {
    levels: FactorLevels,
    size: (u32, u32),
}

impl BoxPlotRenderer {
    pub fn new(levels: FactorLevels) -> Self {
        Self {
            levels,
            size: (900, 700),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn render(
        &self,
        spec: &BoxPlotSpec,
        groups: &[BoxGroup],
        annotations: &[SignificanceAnnotation],
        path: &Path,
    ) -> Result<()> {
        let (x_levels, hue_levels, slots) = layout(spec, groups, &self.levels);
        if slots.is_empty() {
            return Err(Error::Plot(format!(
                "no finite {} values to plot",
                spec.dependent
            )));
        }

        self.draw(spec, &x_levels, &hue_levels, &slots, annotations, path)
            .map_err(|e| Error::Plot(format!("{}: {e}", path.display())))?;

        info!("Rendered {} boxes to {}", slots.len(), path.display());
        Ok(())
    }

    fn draw(
        &self,
        spec: &BoxPlotSpec,
        x_levels: &[String],
        hue_levels: &[String],
        slots: &[BoxSlot],
        annotations: &[SignificanceAnnotation],
        path: &Path,
    ) -> DrawResult<()> {
        let y_min = slots.iter().map(|s| s.stats.min).fold(f64::INFINITY, f64::min);
        let y_max = slots.iter().map(|s| s.stats.max).fold(f64::NEG_INFINITY, f64::max);
        let range = y_max - y_min;
        let bracket_list = brackets(annotations, slots, y_max, range);
        let pad = if range > 0.0 { range * 0.05 } else { 0.5 };
        let top = bracket_list.last().map_or(y_max, |b| b.y) + 2.0 * pad;
        debug!("{} brackets above {:.3}", bracket_list.len(), y_max);

        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_levels.len() as f64, (y_min - pad)..top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .x_desc(spec.x_factor.column_name())
            .y_desc(spec.dependent.as_str())
            .draw()?;

        for slot in slots {
            let color = PALETTE[slot.hue_index % PALETTE.len()];
            let s = &slot.stats;
            let (x0, x1) = (slot.center - slot.width / 2.0, slot.center + slot.width / 2.0);
            let cap = slot.width / 4.0;

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, s.q1), (x1, s.q3)],
                color.mix(0.7).filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, s.q1), (x1, s.q3)],
                BLACK.stroke_width(1),
            )))?;
            for segment in [
                vec![(x0, s.median), (x1, s.median)],
                vec![(slot.center, s.q3), (slot.center, s.max)],
                vec![(slot.center, s.q1), (slot.center, s.min)],
                vec![(slot.center - cap, s.max), (slot.center + cap, s.max)],
                vec![(slot.center - cap, s.min), (slot.center + cap, s.min)],
            ] {
                chart.draw_series(std::iter::once(PathElement::new(segment, BLACK)))?;
            }
            chart.draw_series(std::iter::once(Cross::new(
                (slot.center, s.mean),
                4,
                BLACK.stroke_width(2),
            )))?;
        }

        for (i, hue) in hue_levels.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                .label(hue.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
        if !hue_levels.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        let tick = if range > 0.0 { range * 0.015 } else { 0.05 };
        for bracket in &bracket_list {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![
                    (bracket.left, bracket.y - tick),
                    (bracket.left, bracket.y),
                    (bracket.right, bracket.y),
                    (bracket.right, bracket.y - tick),
                ],
                BLACK,
            )))?;
            let style = TextStyle::from(("sans-serif", 16).into_font())
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            chart.draw_series(std::iter::once(Text::new(
                bracket.text.to_string(),
                ((bracket.left + bracket.right) / 2.0, bracket.y),
                style,
            )))?;
        }

        // Category names under the axis
        let label_style =
            TextStyle::from(("sans-serif", 15).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
        for (i, level) in x_levels.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(i as f64 + 0.5, y_min - pad));
            root.draw(&Text::new(level.clone(), (px, py + 6), label_style.clone()))?;
        }

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(x: &str, hue: Option<&str>, values: &[f64]) -> BoxGroup {
        let label = match hue {
            Some(h) => GroupLabel::with_hue(x, h),
            None => GroupLabel::new(x),
        };
        BoxGroup {
            label,
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_file_name() {
        let spec = BoxPlotSpec::new("TP", Factor::Movement).with_hue(Factor::ReferenceFrame);
        assert_eq!(spec.file_name(), "TP_Movement_ReferenceFrame.png");
        assert_eq!(
            BoxPlotSpec::new("Preference", Factor::ReferenceFrame).file_name(),
            "Preference_ReferenceFrame.png"
        );
    }

    #[test]
    fn test_layout_follows_declared_order() {
        let spec = BoxPlotSpec::new("TP", Factor::Movement).with_hue(Factor::ReferenceFrame);
        let groups = vec![
            group("Walking", Some("Path"), &[1.0, 2.0]),
            group("Standing", Some("Palm"), &[1.0, 2.0]),
            group("Walking", Some("Palm"), &[1.0, 2.0]),
            group("Standing", Some("Path"), &[f64::NAN]),
        ];
        let (x_levels, hue_levels, slots) = layout(&spec, &groups, &FactorLevels::default());

        assert_eq!(x_levels, vec!["Standing", "Walking"]);
        assert_eq!(hue_levels, vec!["Palm", "Path"]);
        // The all-NaN box is skipped
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].label, GroupLabel::with_hue("Standing", "Palm"));
        assert!((slots[0].center - 0.3).abs() < 1e-12);
        assert!((slots[1].center - 1.3).abs() < 1e-12);
        assert!((slots[2].center - 1.7).abs() < 1e-12);
        assert!((slots[2].width - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_brackets_stack_narrowest_first() {
        let spec = BoxPlotSpec::new("Preference", Factor::ReferenceFrame);
        let groups = vec![
            group("Palm", None, &[1.0, 2.0]),
            group("Palm w/o Rotation", None, &[2.0, 3.0]),
            group("Path", None, &[1.0, 3.0]),
        ];
        let (_, _, slots) = layout(&spec, &groups, &FactorLevels::default());
        let annotations = vec![
            SignificanceAnnotation {
                first: GroupLabel::new("Palm"),
                second: GroupLabel::new("Path"),
                p_value: 0.2,
            },
            SignificanceAnnotation {
                first: GroupLabel::new("Palm w/o Rotation"),
                second: GroupLabel::new("Palm"),
                p_value: 0.004,
            },
            SignificanceAnnotation {
                first: GroupLabel::new("Palm"),
                second: GroupLabel::new("Missing"),
                p_value: 0.01,
            },
        ];

        let result = brackets(&annotations, &slots, 3.0, 2.0);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "**");
        assert!((result[0].left - 0.5).abs() < 1e-12);
        assert!((result[0].right - 1.5).abs() < 1e-12);
        assert!(result[1].y > result[0].y);
        assert_eq!(result[1].text, "ns");
    }

    #[test]
    fn test_render_without_values_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TP_Movement.png");
        let renderer = BoxPlotRenderer::new(FactorLevels::default());
        let result = renderer.render(
            &BoxPlotSpec::new("TP", Factor::Movement),
            &[group("Walking", None, &[])],
            &[],
            &path,
        );
        assert!(matches!(result, Err(Error::Plot(_))));
        assert!(!path.exists());
    }
}
