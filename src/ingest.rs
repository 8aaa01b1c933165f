//! CSV ingestion: uploaded entries and few-shot reference data.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;

use crate::error::IngestionError;

/// Column every input table must carry.
pub const TEXT_COLUMN: &str = "text";
/// Label column of the reference dataset.
pub const TOPIC_COLUMN: &str = "main_topic";

/// One input row: the free text plus any passthrough columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub text: String,
    /// Other columns as `(header, value)`, in header order. Unused downstream.
    pub extra: Vec<(String, String)>,
}

impl Record {
    pub fn new(text: impl Into<String>) -> Self {
        Record {
            text: text.into(),
            extra: Vec::new(),
        }
    }
}

/// A labeled example for in-context classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    pub text: String,
    pub label: String,
}

/// Read records from a CSV file on disk.
pub fn read_records_from_path(path: &Path) -> Result<Vec<Record>, IngestionError> {
    let file = File::open(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(file)
}

/// Read records from any CSV source with a header row containing `text`.
///
/// Short rows are accepted; a missing `text` cell becomes an empty string so
/// that one bad row does not abort the run.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>, IngestionError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let text_idx = column_index(&headers, TEXT_COLUMN)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let text = row.get(text_idx).unwrap_or_default().to_string();
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != text_idx)
            .map(|(i, h)| (h.trim().to_string(), row.get(i).unwrap_or_default().to_string()))
            .collect();
        records.push(Record { text, extra });
    }
    log::debug!("Ingested {} records", records.len());
    Ok(records)
}

/// Read `(text, main_topic)` pairs. Rows with an empty topic are skipped.
pub fn read_examples<R: Read>(reader: R) -> Result<Vec<Example>, IngestionError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let text_idx = column_index(&headers, TEXT_COLUMN)?;
    let topic_idx = column_index(&headers, TOPIC_COLUMN)?;

    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let label = row.get(topic_idx).unwrap_or_default().trim();
        if label.is_empty() {
            continue;
        }
        out.push(Example {
            text: row.get(text_idx).unwrap_or_default().to_string(),
            label: label.to_string(),
        });
    }
    Ok(out)
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, IngestionError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| IngestionError::MissingColumn(name.to_string()))
}
