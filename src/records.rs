//! Record file loading.
//!
//! The input is a three-column CSV (name, number, extra text) with a header
//! row. Rows that are comments or do not describe a usable card are skipped
//! and reported instead of failing the run.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};

use crate::error::{Result, SheetError};

const COMMENT_MARKER: char = '#';
const FIELD_COUNT: usize = 3;

/// One business card worth of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub number: String,
    pub extra: String,
}

impl Record {
    /// The large text printed on the front: the second word of the name, or
    /// the whole name when it is a single word.
    pub fn display_name(&self) -> &str {
        self.name.split_whitespace().nth(1).unwrap_or(&self.name)
    }
}

/// Why a row was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Comment,
    FieldCount(usize),
    EmptyField,
    NonNumeric,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Comment => write!(f, "comment row"),
            SkipReason::FieldCount(n) => write!(f, "expected {FIELD_COUNT} fields, found {n}"),
            SkipReason::EmptyField => write!(f, "empty field"),
            SkipReason::NonNumeric => write!(f, "number is not numeric"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the source file.
    pub line: u64,
    pub reason: SkipReason,
}

/// Parsed contents of a record file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub header: Vec<String>,
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRow>,
}

/// Load and validate the record file at `path`.
pub fn load_records(path: &Path, has_header: bool) -> Result<RecordSet> {
    info!("Loading records from {}", path.display());
    if !path.is_file() {
        return Err(SheetError::MissingResource {
            what: "record file",
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| SheetError::io(path, source))?;
    let set = parse_records(file, path, has_header)?;
    info!(
        "Loaded {} record(s), skipped {} row(s)",
        set.records.len(),
        set.skipped.len()
    );
    Ok(set)
}

/// Parse records from any reader; `source` only labels errors.
pub fn parse_records<R: Read>(input: R, source: &Path, has_header: bool) -> Result<RecordSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let read_error = |source_err: csv::Error| SheetError::ReadRecords {
        path: source.to_path_buf(),
        source: source_err,
    };

    let mut set = RecordSet::default();
    let mut rows = reader.records();

    if has_header {
        let header = rows.next().ok_or_else(|| SheetError::EmptyRecords {
            path: source.to_path_buf(),
        })?;
        let header = header.map_err(read_error)?;
        set.header = header
            .iter()
            .map(|field| field.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
    }

    for row in rows {
        let row = row.map_err(read_error)?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        match classify(&row) {
            Ok(record) => set.records.push(record),
            Err(reason) => {
                debug!("Skipping line {line}: {reason}");
                set.skipped.push(SkippedRow { line, reason });
            }
        }
    }
    Ok(set)
}

fn classify(row: &StringRecord) -> std::result::Result<Record, SkipReason> {
    if row.len() != FIELD_COUNT {
        return Err(SkipReason::FieldCount(row.len()));
    }
    let name = row[0].trim();
    let number = row[1].trim();
    let extra = row[2].trim();
    if name.starts_with(COMMENT_MARKER) {
        return Err(SkipReason::Comment);
    }
    if name.is_empty() || number.is_empty() || extra.is_empty() {
        return Err(SkipReason::EmptyField);
    }
    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(SkipReason::NonNumeric);
    }
    Ok(Record {
        name: name.to_string(),
        number: number.to_string(),
        extra: extra.to_string(),
    })
}
