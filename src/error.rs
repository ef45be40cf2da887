//! Error types shared by the card sheet pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, SheetError>;

/// Failure categories a run can end with.
///
/// Malformed input rows never surface here: they are skipped and reported
/// through [`RecordSet::skipped`](crate::RecordSet). Cleanup failures are
/// logged and counted in the [`SheetReport`](crate::SheetReport).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input file is absent; raised before any processing.
    MissingResource,
    /// The record file exists but could not be read or parsed.
    Read,
    /// Composing a card or writing the document failed.
    Render,
    /// The configuration itself is unusable.
    Config,
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("{what} not found: {}", path.display())]
    MissingResource { what: &'static str, path: PathBuf },

    #[error("failed to read records from {}: {source}", path.display())]
    ReadRecords {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("record file {} has no header row", path.display())]
    EmptyRecords { path: PathBuf },

    #[error("record file {} contains no usable records", path.display())]
    NoRecords { path: PathBuf },

    #[error("failed to load font {}: {message}", path.display())]
    Font { path: PathBuf, message: String },

    #[error("failed to load template image {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("barcode payload must be digits only (got '{0}')")]
    InvalidPayload(String),

    #[error("text '{text}' does not fit in {max_width}x{max_height} px at any font size")]
    DoesNotFit {
        text: String,
        max_width: u32,
        max_height: u32,
    },

    #[error("failed to write image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to build PDF document: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout file {}: {source}", path.display())]
    LayoutFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid layout: {0}")]
    Layout(String),
}

impl SheetError {
    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetError::MissingResource { .. } => ErrorKind::MissingResource,
            SheetError::ReadRecords { .. }
            | SheetError::EmptyRecords { .. }
            | SheetError::NoRecords { .. } => ErrorKind::Read,
            SheetError::LayoutFile { .. } | SheetError::Layout(_) => ErrorKind::Config,
            SheetError::Font { .. }
            | SheetError::Template { .. }
            | SheetError::InvalidPayload(_)
            | SheetError::DoesNotFit { .. }
            | SheetError::Image { .. }
            | SheetError::Pdf(_)
            | SheetError::Io { .. } => ErrorKind::Render,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SheetError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        SheetError::Image {
            path: path.into(),
            source,
        }
    }
}
