//! Writing a run's artifacts into a timestamped report directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use csv::WriterBuilder;
use serde::Serialize;

use crate::error::ExportError;
use crate::pipeline::Report;
use crate::recommend::bullet_items;
use crate::wordcloud::frequencies;

const TABLE_TEXT_CHARS: usize = 60;

/// Neutralize spreadsheet formula prefixes (`=`, `+`, `-`, `@`, tab, CR).
pub fn csv_safe_cell(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    documents: usize,
    labels: Vec<JsonRow<'a>>,
    distribution: Vec<JsonCount<'a>>,
    top_words: Vec<JsonCount<'a>>,
    summary: Option<&'a str>,
    recommendations: Option<&'a str>,
    recommendation_items: Vec<&'a str>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    text: &'a str,
    label: &'a str,
}

#[derive(Serialize)]
struct JsonCount<'a> {
    item: &'a str,
    count: usize,
}

/// Create `<out_dir>/<YYYY_MM_DD_HH_MM_SS_mmm>_moodguard/` and write every
/// artifact of `report` into it. Returns the directory path.
///
/// An existing directory is never reused: a clash within the same
/// millisecond gets a numeric suffix (`..._1_moodguard`).
pub fn write_report(report: &Report, out_dir: &Path) -> Result<PathBuf, ExportError> {
    let local: DateTime<Local> = Local::now();
    let dir = create_report_dir(out_dir, &local.format("%Y_%m_%d_%H_%M_%S_%3f").to_string())?;

    let mut wtr = WriterBuilder::new().from_path(dir.join("labels.csv"))?;
    wtr.write_record(["Text Response", "Label"])?;
    for row in report.table.rows() {
        wtr.write_record([csv_safe_cell(&row.text), csv_safe_cell(row.label.as_str())])?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: dir.join("labels.csv"),
        source,
    })?;

    let charts = [
        ("topics_bar.svg", &report.bar_chart),
        ("topics_donut.svg", &report.donut_chart),
        ("wordcloud.svg", &report.word_cloud),
    ];
    for (name, svg) in charts {
        if let Some(svg) = svg {
            let path = dir.join(name);
            svg.write_to(&path)
                .map_err(|source| ExportError::Io { path, source })?;
        }
    }

    if report.summary.is_some() || report.recommendations.is_some() {
        let path = dir.join("summary.md");
        fs::write(&path, summary_markdown(report)).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
    }

    let words = frequencies(&report.tokens);
    let json = JsonReport {
        generated_at: local.to_rfc3339(),
        documents: report.table.len(),
        labels: report
            .table
            .rows()
            .iter()
            .map(|r| JsonRow {
                text: &r.text,
                label: r.label.as_str(),
            })
            .collect(),
        distribution: report
            .distribution
            .counts()
            .iter()
            .map(|(l, c)| JsonCount {
                item: l.as_str(),
                count: *c,
            })
            .collect(),
        top_words: words
            .iter()
            .take(50)
            .map(|(w, c)| JsonCount { item: w, count: *c })
            .collect(),
        summary: report.summary.as_deref(),
        recommendations: report.recommendations.as_deref(),
        recommendation_items: report
            .recommendations
            .as_deref()
            .map(bullet_items)
            .unwrap_or_default(),
    };
    let path = dir.join("report.json");
    fs::write(&path, serde_json::to_string_pretty(&json)?)
        .map_err(|source| ExportError::Io { path, source })?;

    log::info!("Report written to {}", dir.display());
    Ok(dir)
}

fn create_report_dir(out_dir: &Path, stamp: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let mut attempt = 0u32;
    loop {
        let name = match attempt {
            0 => format!("{stamp}_moodguard"),
            n => format!("{stamp}_{n}_moodguard"),
        };
        let dir = out_dir.join(name);
        match fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(ExportError::Io { path: dir, source }),
        }
    }
}

/// Summary and recommendations as one markdown document.
pub fn summary_markdown(report: &Report) -> String {
    let mut md = String::new();
    if let Some(summary) = &report.summary {
        md.push_str("### Summary\n\n");
        md.push_str(summary);
        md.push_str("\n\n");
    }
    if let Some(recs) = &report.recommendations {
        md.push_str("#### Recommendations\n\n");
        md.push_str(recs);
        md.push('\n');
    }
    md
}

/// Plain-text overview for stdout.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!("Topic Classification ({} documents)\n", report.table.len()));
    for (label, count) in report.distribution.counts().iter().rev() {
        out.push_str(&format!("  {label:<12} {count}\n"));
    }
    if !report.table.is_empty() {
        let cells: Vec<String> = report.table.rows().iter().map(|r| table_cell(&r.text)).collect();
        let width = cells
            .iter()
            .map(|c| c.chars().count())
            .chain(std::iter::once("Text Response".len()))
            .max()
            .unwrap_or(0);
        out.push_str(&format!("\n{:<width$} | Label\n", "Text Response"));
        for (cell, row) in cells.iter().zip(report.table.rows()) {
            out.push_str(&format!("{cell:<width$} | {}\n", row.label));
        }
    }
    let words = frequencies(&report.tokens);
    if !words.is_empty() {
        let top: Vec<String> = words.iter().take(20).map(|(w, c)| format!("{w} ({c})")).collect();
        out.push_str(&format!("\nTop words: {}\n", top.join(", ")));
    }
    let md = summary_markdown(report);
    if !md.is_empty() {
        out.push('\n');
        out.push_str(&md);
    }
    out
}

/// One-line rendering of a record's text, cut to [`TABLE_TEXT_CHARS`].
fn table_cell(text: &str) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= TABLE_TEXT_CHARS {
        return line;
    }
    let cut: String = line.chars().take(TABLE_TEXT_CHARS - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::LabelSet;
    use crate::ingest::Record;
    use crate::pipeline::LabeledTable;

    fn report(rows: &[(&str, &str)]) -> Report {
        let set = LabelSet::default_topics();
        let records: Vec<Record> = rows.iter().map(|(t, _)| Record::new(*t)).collect();
        let labels = rows.iter().map(|(_, l)| set.get(l).unwrap().clone()).collect();
        let table = LabeledTable::new(&records, labels).unwrap();
        Report {
            distribution: table.distribution(),
            table,
            bar_chart: None,
            donut_chart: None,
            tokens: Vec::new(),
            word_cloud: None,
            summary: None,
            recommendations: None,
        }
    }

    #[test]
    fn text_output_lists_every_record_with_its_label() {
        let out = render_text(&report(&[
            ("I feel ignored at home", "Neglect"),
            ("I had a panic\nattack", "Panic"),
        ]));
        assert!(out.starts_with("Topic Classification (2 documents)\n"));
        assert!(out.contains("  Neglect      1\n"));
        assert!(out.contains("Text Response          | Label\n"));
        assert!(out.contains("I feel ignored at home | Neglect\n"));
        assert!(out.contains("I had a panic attack   | Panic\n"));
    }

    #[test]
    fn long_texts_are_cut_on_char_boundaries() {
        let text = "\u{e9}".repeat(TABLE_TEXT_CHARS + 10);
        let cell = table_cell(&text);
        assert_eq!(cell.chars().count(), TABLE_TEXT_CHARS);
        assert!(cell.ends_with("..."));
    }

    #[test]
    fn empty_report_prints_no_table() {
        let out = render_text(&report(&[]));
        assert_eq!(out, "Topic Classification (0 documents)\n");
    }

    #[test]
    fn clashing_stamp_gets_a_numeric_suffix() {
        let out = tempfile::tempdir().unwrap();
        let stamp = "2026_01_02_03_04_05_006";
        let first = create_report_dir(out.path(), stamp).unwrap();
        let second = create_report_dir(out.path(), stamp).unwrap();
        assert!(first.ends_with("2026_01_02_03_04_05_006_moodguard"));
        assert!(second.ends_with("2026_01_02_03_04_05_006_1_moodguard"));
    }

    #[test]
    fn back_to_back_reports_get_their_own_directories() {
        let out = tempfile::tempdir().unwrap();
        let r = report(&[("I feel ignored at home", "Neglect")]);
        let first = write_report(&r, out.path()).unwrap();
        let second = write_report(&r, out.path()).unwrap();
        assert_ne!(first, second);
        assert!(first.join("labels.csv").exists());
        assert!(second.join("labels.csv").exists());
    }

    #[test]
    fn csv_cells_are_neutralized() {
        assert_eq!(csv_safe_cell("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(csv_safe_cell("-harm"), "'-harm");
        assert_eq!(csv_safe_cell("I feel ok"), "I feel ok");
        assert_eq!(csv_safe_cell(""), "");
    }
}
