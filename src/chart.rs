//! Label counts and the two topic charts (horizontal bars and donut).

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use plotters::coord::ranged1d::SegmentValue;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

use crate::classify::Label;
use crate::error::ChartError;

const FONT_COLOR: RGBColor = RGBColor(0x26, 0x25, 0x64);
const BAR_BACKGROUND: RGBColor = RGBColor(0xe6, 0xe4, 0xef);
const DEFAULT_COLOR: &str = "#E6E4EF";

const BAR_WIDTH: u32 = 720;
const DONUT_SIZE: u32 = 320;
const DONUT_RADIUS: f64 = 120.0;
const DONUT_HOLE: i32 = 72;

/// Fixed label colors, matched case-insensitively; anything else gets
/// [`DEFAULT_COLOR`].
pub fn label_color(label: &str) -> &'static str {
    palette(label).0
}

fn palette(label: &str) -> (&'static str, RGBColor) {
    match label.trim().to_ascii_lowercase().as_str() {
        "self-harm" => ("#B42913", RGBColor(0xb4, 0x29, 0x13)),
        "panic" => ("#ED9041", RGBColor(0xed, 0x90, 0x41)),
        "neglect" => ("#F8CAA2", RGBColor(0xf8, 0xca, 0xa2)),
        _ => (DEFAULT_COLOR, RGBColor(0xe6, 0xe4, 0xef)),
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Render(err.to_string())
    }
}

/// A rendered SVG document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Svg(String);

impl Svg {
    pub(crate) fn new(document: String) -> Self {
        Svg(document)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.0.as_bytes())
    }
}

/// Per-label counts, ordered by count ascending then by label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LabelDistribution {
    counts: Vec<(Label, usize)>,
}

impl LabelDistribution {
    /// Group and count; labels that never occur are absent.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a Label>) -> Self {
        let mut map: HashMap<&Label, usize> = HashMap::new();
        for label in labels {
            *map.entry(label).or_insert(0) += 1;
        }
        let mut counts: Vec<(Label, usize)> = map.into_iter().map(|(l, c)| (l.clone(), c)).collect();
        counts.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        LabelDistribution { counts }
    }

    pub fn counts(&self) -> &[(Label, usize)] {
        &self.counts
    }

    pub fn get(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l.as_str() == label)
            .map_or(0, |(_, c)| *c)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Horizontal bar chart, smallest count on top, count printed beside each bar.
pub fn render_bar_chart(dist: &LabelDistribution) -> Result<Svg, ChartError> {
    let counts = dist.counts();
    let rows = counts.len().max(1) as u32;
    let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1) as u32;
    let height = 140 + rows * 44;
    // Segment 0 is the bottom row, so the first (smallest) count maps to the top.
    let row_of = |k: usize| rows - 1 - k as u32;
    let name_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) if *i < rows => counts
            .get((rows - 1 - i) as usize)
            .map(|(label, _)| label.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };

    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (BAR_WIDTH, height)).into_drawing_area();
        root.fill(&BAR_BACKGROUND)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Topic Classification ({} Documents)", dist.total()),
                ("sans-serif", 18).into_font().color(&FONT_COLOR),
            )
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(110)
            .build_cartesian_2d(0u32..max + max / 5 + 1, (0u32..rows).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(rows as usize + 1)
            .y_label_formatter(&name_of)
            .x_desc("Counts")
            .y_desc("Topics")
            .label_style(("sans-serif", 12).into_font().color(&FONT_COLOR))
            .axis_desc_style(("sans-serif", 14).into_font().color(&FONT_COLOR))
            .draw()?;

        chart.draw_series(counts.iter().enumerate().map(|(k, (label, count))| {
            let row = row_of(k);
            let mut bar = Rectangle::new(
                [
                    (0, SegmentValue::Exact(row)),
                    (*count as u32, SegmentValue::Exact(row + 1)),
                ],
                palette(label.as_str()).1.filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))?;

        chart.draw_series(counts.iter().enumerate().map(|(k, (_, count))| {
            EmptyElement::at((*count as u32, SegmentValue::CenterOf(row_of(k))))
                + Text::new(
                    count.to_string(),
                    (6, -6),
                    ("sans-serif", 12).into_font().color(&FONT_COLOR),
                )
        }))?;

        root.present()?;
    }
    Ok(Svg(buf))
}

/// Donut chart with percentages; the hole shows the total and "Documents".
pub fn render_donut_chart(dist: &LabelDistribution) -> Result<Svg, ChartError> {
    let total = dist.total();
    let center = (DONUT_SIZE as i32 / 2, DONUT_SIZE as i32 / 2);

    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (DONUT_SIZE, DONUT_SIZE)).into_drawing_area();
        root.fill(&WHITE)?;

        if total > 0 {
            let sizes: Vec<f64> = dist.counts().iter().map(|(_, c)| *c as f64).collect();
            let colors: Vec<RGBColor> = dist
                .counts()
                .iter()
                .map(|(label, _)| palette(label.as_str()).1)
                .collect();
            let names: Vec<&str> = dist.counts().iter().map(|(label, _)| label.as_str()).collect();

            let mut pie = Pie::new(&center, &DONUT_RADIUS, &sizes, &colors, &names);
            pie.start_angle(-90.0);
            pie.label_style(("sans-serif", 11).into_font().color(&FONT_COLOR));
            root.draw(&pie)?;
            root.draw(&Circle::new(center, DONUT_HOLE, WHITE.filled()))?;

            // Percentages sit in the middle of the ring, clockwise from 12 o'clock.
            let ring = (DONUT_RADIUS + DONUT_HOLE as f64) / 2.0;
            let centred = ("sans-serif", 10)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            let mut angle = -PI / 2.0;
            for (_, count) in dist.counts() {
                let share = *count as f64 / total as f64;
                let mid = angle + share * PI;
                let at = (
                    center.0 + (ring * mid.cos()).round() as i32,
                    center.1 + (ring * mid.sin()).round() as i32,
                );
                root.draw(&Text::new(format!("{:.0}%", share * 100.0), at, centred.clone()))?;
                angle += share * 2.0 * PI;
            }
        }

        let big = ("sans-serif", 44)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let small = ("sans-serif", 11)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        root.draw(&Text::new(thousands(total), (center.0, center.1 - 8), big))?;
        root.draw(&Text::new("Documents", (center.0, center.1 + 24), small))?;
        root.present()?;
    }
    Ok(Svg(buf))
}

// ---- Internal helpers ----

fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub(crate) fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::LabelSet;

    fn labels(names: &[&str]) -> Vec<Label> {
        let set = LabelSet::default_topics();
        names.iter().map(|n| set.get(n).unwrap().clone()).collect()
    }

    fn has_color(svg: &Svg, hex: &str) -> bool {
        svg.as_str().to_ascii_uppercase().contains(hex)
    }

    #[test]
    fn counts_sum_to_record_count_and_sort_ascending() {
        let l = labels(&["Panic", "Neglect", "Panic", "Self-harm", "Panic", "Neglect"]);
        let dist = LabelDistribution::from_labels(&l);
        assert_eq!(dist.total(), l.len());
        let order: Vec<_> = dist.counts().iter().map(|(l, c)| (l.as_str(), *c)).collect();
        assert_eq!(order, vec![("Self-harm", 1), ("Neglect", 2), ("Panic", 3)]);
        assert_eq!(dist.get("Education"), 0);
    }

    #[test]
    fn label_colors_ignore_case() {
        assert_eq!(label_color("Self-harm"), "#B42913");
        assert_eq!(label_color("self-harm"), "#B42913");
        assert_eq!(label_color("PANIC"), "#ED9041");
        assert_eq!(label_color(" neglect "), "#F8CAA2");
        assert_eq!(label_color("Education"), DEFAULT_COLOR);
    }

    #[test]
    fn bar_chart_draws_labels_colors_and_axis_titles() {
        let dist = LabelDistribution::from_labels(&labels(&["Panic", "Education", "Panic"]));
        let svg = render_bar_chart(&dist).unwrap();
        let s = svg.as_str();
        assert!(s.starts_with("<svg"));
        assert!(s.contains("Topic Classification (3 Documents)"));
        assert!(s.contains("Counts"));
        assert!(s.contains("Topics"));
        assert!(s.contains("Education"));
        assert!(s.contains("Panic"));
        assert!(has_color(&svg, "#ED9041"));
        assert!(has_color(&svg, DEFAULT_COLOR));
        assert!(!has_color(&svg, "#B42913"));
    }

    #[test]
    fn donut_chart_annotates_total_and_shares() {
        let dist = LabelDistribution::from_labels(&labels(&["Panic", "Neglect", "Self-harm"]));
        let svg = render_donut_chart(&dist).unwrap();
        for hex in ["#ED9041", "#F8CAA2", "#B42913"] {
            assert!(has_color(&svg, hex), "{hex} missing");
        }
        assert!(svg.as_str().contains("Documents"));
        assert_eq!(svg.as_str().matches("33%").count(), 3);
    }

    #[test]
    fn single_label_donut_is_a_full_ring() {
        let dist = LabelDistribution::from_labels(&labels(&["Panic", "Panic"]));
        let svg = render_donut_chart(&dist).unwrap();
        assert!(svg.as_str().contains("100%"));
        assert!(has_color(&svg, "#ED9041"));
    }

    #[test]
    fn empty_distribution_renders_without_dividing_by_zero() {
        let dist = LabelDistribution::default();
        assert_eq!(dist.total(), 0);
        let bar = render_bar_chart(&dist).unwrap();
        assert!(!bar.as_str().contains("NaN"));
        assert!(bar.as_str().contains("(0 Documents)"));
        let donut = render_donut_chart(&dist).unwrap();
        assert!(donut.as_str().contains("Documents"));
        assert!(!has_color(&donut, "#ED9041"));
        assert!(!donut.as_str().contains("NaN"));
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(1234), "1,234");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
