//! Error taxonomy for the import pipeline.
//!
//! Three families surface to callers:
//!
//! - [`ParseError`]: structural problems that abort a parse attempt outright.
//! - [`ReadError`]: the selected file could not be turned into text.
//! - [`ImportError`]: everything an [`ImportSession`](crate::session::ImportSession)
//!   operation can report, including the two above.
//!
//! Semantic (per-cell) problems are not errors in this sense; they are
//! collected as [`ValidationError`](crate::validate::ValidationError) records.

use thiserror::Error;

use crate::session::ImportStep;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("The file is empty.")]
    EmptyInput,
    #[error("Invalid headers detected (empty column names).")]
    InvalidHeader { position: usize, header: String },
    #[error("Row {row_number} has {actual} columns, but expected {expected}.")]
    RowShapeMismatch {
        row_number: usize,
        actual: usize,
        expected: usize,
    },
    #[error("Columns '{first}' and '{second}' both map to '{key}'.")]
    DuplicateColumn {
        key: String,
        first: String,
        second: String,
    },
    /// A record error from the quote-aware tokenizer. The `csv` reader is
    /// lenient about stray quotes and runs in flexible mode over in-memory
    /// UTF-8 text, so parsing a `&str` does not produce this today; it is
    /// kept because `csv::Reader::read_record` is fallible.
    #[error("Malformed quoting on row {row_number}: {detail}")]
    Quoting { row_number: usize, detail: String },
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read file as text: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read file as text: content is not valid {encoding}")]
    Decode { encoding: &'static str },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Format Restricted: {accepted}")]
    Extension { accepted: String },
    #[error("Size Overflow: {} Cap", size_label(.max_bytes))]
    TooLarge { size: u64, max_bytes: u64 },
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// `2MB`, `1.5MB`, `512KB` or `1000 bytes`, whichever reads exactly.
fn size_label(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("No file selected")]
    NoFileSelected,
    #[error("Cannot {operation} while the import is at the {step} step")]
    InvalidState {
        operation: &'static str,
        step: ImportStep,
    },
    #[error("{error_count} validation error(s) found. Please correct your CSV.")]
    ConfirmBlocked { error_count: usize },
    #[error("Persisting confirmed rows failed: {0:#}")]
    Commit(anyhow::Error),
}

impl ImportError {
    /// Structural and I/O failures stop forward progress; the session stays put.
    pub fn is_structural(&self) -> bool {
        matches!(self, ImportError::Parse(_) | ImportError::Read(_))
    }
}
