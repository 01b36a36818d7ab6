//! CSV upload utility
//!
//! Decodes a browser file payload (`data:<type>;base64,<data>`) and parses it
//! into a generic string table. Unrelated to the forecast pipeline; every
//! failure ends up as a message for the page instead of an error.

use crate::{PmcastError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Rows shown per table page
pub const PAGE_SIZE: usize = 10;

/// Shown when the filename does not end in `.csv`
pub const NOT_CSV_MESSAGE: &str = "The selected file is not a CSV file";

/// Shown before anything was uploaded
pub const EMPTY_MESSAGE: &str = "No CSV file selected yet";

/// Prefix of decoding/parsing failure messages
pub const ERROR_PREFIX: &str = "An error occurred: ";

/// Parsed CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTable {
    pub filename: String,
    /// Header fields, exactly as in the file
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub page_size: usize,
}

impl UploadTable {
    /// Rows of page `index` (zero based); empty past the end
    #[must_use]
    pub fn page(&self, index: usize) -> &[Vec<String>] {
        let start = index.saturating_mul(self.page_size).min(self.rows.len());
        let end = start.saturating_add(self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size.max(1))
    }
}

/// Result of handling one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadOutcome {
    Table(UploadTable),
    Empty { message: String },
    NotCsv { message: String },
    Failed { message: String },
}

impl UploadOutcome {
    #[must_use]
    pub fn empty() -> Self {
        UploadOutcome::Empty {
            message: EMPTY_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn not_csv() -> Self {
        UploadOutcome::NotCsv {
            message: NOT_CSV_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn failed(err: &PmcastError) -> Self {
        UploadOutcome::Failed {
            message: format!("{ERROR_PREFIX}{}", err.user_message()),
        }
    }

    /// User-visible message when there is no table
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            UploadOutcome::Table(_) => None,
            UploadOutcome::Empty { message }
            | UploadOutcome::NotCsv { message }
            | UploadOutcome::Failed { message } => Some(message),
        }
    }

    #[must_use]
    pub fn table(&self) -> Option<&UploadTable> {
        match self {
            UploadOutcome::Table(table) => Some(table),
            _ => None,
        }
    }
}

/// Handle an upload callback where either part may be missing
#[must_use]
pub fn handle_upload(contents: Option<&str>, filename: Option<&str>) -> UploadOutcome {
    match (contents, filename) {
        (Some(contents), Some(filename)) if !contents.is_empty() && !filename.is_empty() => {
            parse_contents(contents, filename)
        }
        _ => UploadOutcome::empty(),
    }
}

/// Decode a `data:` URL payload and parse it as CSV
#[must_use]
pub fn parse_contents(contents: &str, filename: &str) -> UploadOutcome {
    if !is_csv(filename) {
        debug!("Rejected upload {}: not a CSV file", filename);
        return UploadOutcome::not_csv();
    }

    match decode_payload(contents) {
        Ok(bytes) => parse_bytes(&bytes, filename),
        Err(e) => {
            warn!("Failed to decode upload {}: {}", filename, e);
            UploadOutcome::failed(&e)
        }
    }
}

/// Parse already-decoded file bytes
#[must_use]
pub fn parse_bytes(bytes: &[u8], filename: &str) -> UploadOutcome {
    if !is_csv(filename) {
        debug!("Rejected upload {}: not a CSV file", filename);
        return UploadOutcome::not_csv();
    }

    match read_table(bytes) {
        Ok((columns, rows)) => {
            debug!(
                "Parsed {}: {} columns, {} rows",
                filename,
                columns.len(),
                rows.len()
            );
            UploadOutcome::Table(UploadTable {
                filename: filename.to_string(),
                columns,
                rows,
                page_size: PAGE_SIZE,
            })
        }
        Err(e) => {
            warn!("Failed to parse upload {}: {}", filename, e);
            UploadOutcome::failed(&e)
        }
    }
}

fn is_csv(filename: &str) -> bool {
    filename.ends_with(".csv")
}

/// Split `<content type>,<base64>` and decode the data part
pub fn decode_payload(contents: &str) -> Result<Vec<u8>> {
    let (_content_type, data) = contents
        .split_once(',')
        .ok_or_else(|| PmcastError::upload("payload has no ',' separating type and data"))?;

    STANDARD
        .decode(data.trim())
        .map_err(|e| PmcastError::upload(format!("invalid base64 data: {e}")))
}

fn read_table(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PmcastError::upload(format!("file is not valid UTF-8: {e}")))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| PmcastError::upload(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if columns.is_empty() {
        return Err(PmcastError::upload("no columns to parse from file"));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PmcastError::upload(e.to_string()))?;
        if record.len() > columns.len() {
            return Err(PmcastError::upload(format!(
                "expected {} fields in row {}, saw {}",
                columns.len(),
                index + 1,
                record.len()
            )));
        }

        // Short rows are padded with empty cells
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok((columns, rows))
}
