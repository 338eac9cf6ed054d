//! Preview rendering and per-cell error attribution.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::{
    mapping::{CanonicalField, SchemaMapper},
    parser::RawTable,
    session::PreviewWindow,
    table::{self, Cell},
    validate::{ImportKind, ValidationError},
};

pub const EMPTY_PLACEHOLDER: &str = "(empty)";

/// Which displayed cell each validation error belongs to.
///
/// Every display column is attributed to at most one canonical field, using
/// the alias table of the import kind. Errors for a field with no column in
/// the file (e.g. a missing `batch` column) match no cell and only appear in
/// the error list.
#[derive(Debug, Clone)]
pub struct CellErrors<'e> {
    column_fields: Vec<Option<CanonicalField>>,
    by_cell: HashMap<(usize, CanonicalField), &'e ValidationError>,
}

impl<'e> CellErrors<'e> {
    pub fn build(table: &RawTable, errors: &'e [ValidationError], kind: ImportKind) -> Self {
        Self::from_keys(table.keys(), errors, kind)
    }

    pub fn from_keys(keys: &[String], errors: &'e [ValidationError], kind: ImportKind) -> Self {
        let mapper = SchemaMapper::for_kind(kind);
        // a repeated key is read from its last column only, so earlier copies stay unflagged
        let column_fields = keys
            .iter()
            .enumerate()
            .map(|(column, key)| {
                if keys[column + 1..].contains(key) {
                    None
                } else {
                    mapper.field_for_key(key)
                }
            })
            .collect();
        let mut by_cell = HashMap::new();
        for error in errors {
            by_cell.entry((error.row_index, error.column)).or_insert(error);
        }
        Self {
            column_fields,
            by_cell,
        }
    }

    pub fn column_field(&self, column: usize) -> Option<CanonicalField> {
        self.column_fields.get(column).copied().flatten()
    }

    pub fn cell(&self, row_index: usize, column: usize) -> Option<&'e ValidationError> {
        let field = self.column_field(column)?;
        self.by_cell.get(&(row_index, field)).copied()
    }
}

pub fn render_preview(window: &PreviewWindow<'_>) -> String {
    let cells = CellErrors::from_keys(window.keys, window.errors, window.kind);
    let rows = window
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            window
                .keys
                .iter()
                .enumerate()
                .map(|(column, key)| {
                    let value = row.get(key).unwrap_or_default();
                    let text = if value.is_empty() {
                        EMPTY_PLACEHOLDER
                    } else {
                        value
                    };
                    if cells.cell(row_index, column).is_some() {
                        Cell::flagged(text)
                    } else {
                        Cell::plain(text)
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut output = table::render_table(window.headers, &rows);
    if window.remaining() > 0 {
        let _ = writeln!(
            output,
            "+ {} more records identified",
            window.remaining()
        );
    }
    let _ = writeln!(output, "{} total entries detected", window.total_rows);
    if !window.errors.is_empty() {
        let _ = writeln!(
            output,
            "{} validation errors found. Please correct your CSV.",
            window.errors.len()
        );
    }
    output
}
