//! Per-kind row validation.
//!
//! [`validate`] walks every row of a [`RawTable`] in order and records one
//! [`ValidationError`] per failed check. It is pure: the same table and kind
//! always produce the same list, and malformed values never cause a failure of
//! the call itself.

use std::{fmt, sync::OnceLock};

use clap::ValueEnum;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    mapping::{CanonicalField, SchemaMapper},
    parser::{RawTable, Row},
};

/// Offset from a zero-based row index to the 1-based line number of that row
/// when the header line is counted as line 1.
pub const HEADER_ROW_OFFSET: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ImportKind {
    /// Student roster (name, email, batch)
    Student,
    /// Teacher roster (name, email)
    Teacher,
    /// Weekly timetable (batch, day, time, subject)
    Timetable,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Student => "student",
            ImportKind::Teacher => "teacher",
            ImportKind::Timetable => "timetable",
        }
    }

    pub fn is_roster(&self) -> bool {
        matches!(self, ImportKind::Student | ImportKind::Teacher)
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Zero-based position in [`RawTable::rows`].
    pub row_index: usize,
    pub column: CanonicalField,
    pub message: String,
}

impl ValidationError {
    fn new(row_index: usize, column: CanonicalField, message: impl Into<String>) -> Self {
        Self {
            row_index,
            column,
            message: message.into(),
        }
    }

    /// Line number of the row in a file whose header is line 1.
    pub fn display_row(&self) -> usize {
        self.row_index + HEADER_ROW_OFFSET
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} column '{}': {}",
            self.display_row(),
            self.column,
            self.message
        )
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value)
}

pub fn validate(table: &RawTable, kind: ImportKind) -> Vec<ValidationError> {
    let mapper = SchemaMapper::for_kind(kind);
    let mut errors = Vec::new();
    for (row_index, row) in table.rows().iter().enumerate() {
        let before = errors.len();
        match kind {
            ImportKind::Student | ImportKind::Teacher => {
                check_roster_row(&mapper, row, row_index, kind, &mut errors)
            }
            ImportKind::Timetable => check_timetable_row(&mapper, row, row_index, &mut errors),
        }
        if errors.len() > before {
            debug!(
                "Row {} failed {} check(s)",
                row_index + HEADER_ROW_OFFSET,
                errors.len() - before
            );
        }
    }
    errors
}

fn present<'r>(mapper: &SchemaMapper, row: &'r Row, field: CanonicalField) -> Option<&'r str> {
    mapper.resolve(row, field).filter(|value| !value.is_empty())
}

fn check_roster_row(
    mapper: &SchemaMapper,
    row: &Row,
    row_index: usize,
    kind: ImportKind,
    errors: &mut Vec<ValidationError>,
) {
    if present(mapper, row, CanonicalField::Name).is_none() {
        errors.push(ValidationError::new(
            row_index,
            CanonicalField::Name,
            "Name is required",
        ));
    }

    match present(mapper, row, CanonicalField::Email) {
        None => errors.push(ValidationError::new(
            row_index,
            CanonicalField::Email,
            "Email is required",
        )),
        Some(email) if !is_valid_email(email) => errors.push(ValidationError::new(
            row_index,
            CanonicalField::Email,
            "Invalid email format",
        )),
        Some(_) => {}
    }

    if kind == ImportKind::Student && present(mapper, row, CanonicalField::Batch).is_none() {
        errors.push(ValidationError::new(
            row_index,
            CanonicalField::Batch,
            "Batch is required for students",
        ));
    }
}

fn check_timetable_row(
    mapper: &SchemaMapper,
    row: &Row,
    row_index: usize,
    errors: &mut Vec<ValidationError>,
) {
    const REQUIRED: [(CanonicalField, &str); 4] = [
        (CanonicalField::Batch, "Batch is required"),
        (CanonicalField::Day, "Day is required"),
        (CanonicalField::Time, "Time is required"),
        (CanonicalField::Subject, "Subject is required"),
    ];
    for (field, message) in REQUIRED {
        if present(mapper, row, field).is_none() {
            errors.push(ValidationError::new(row_index, field, message));
        }
    }
}
