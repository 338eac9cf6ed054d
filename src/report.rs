//! Text and JSON renderings of a validation pass.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    parser::RawTable,
    validate::{HEADER_ROW_OFFSET, ImportKind, ValidationError},
};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport<'a> {
    pub kind: ImportKind,
    pub total_rows: usize,
    pub headers: &'a [String],
    pub can_confirm: bool,
    pub errors: &'a [ValidationError],
}

impl<'a> ValidationReport<'a> {
    pub fn new(kind: ImportKind, table: &'a RawTable, errors: &'a [ValidationError]) -> Self {
        Self {
            kind,
            total_rows: table.row_count(),
            headers: table.headers(),
            can_confirm: errors.is_empty(),
            errors,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing validation report")
    }

    /// One line per offending row, listing each failed column.
    pub fn render_text(&self) -> String {
        let mut output = String::new();
        if self.errors.is_empty() {
            let _ = writeln!(
                output,
                "{} {} row(s) passed validation",
                self.total_rows, self.kind
            );
            return output;
        }
        for (row_index, group) in &self.errors.iter().chunk_by(|error| error.row_index) {
            let details = group
                .map(|error| format!("{}: {}", error.column, error.message))
                .join("; ");
            let _ = writeln!(output, "row {}: {details}", row_index + HEADER_ROW_OFFSET);
        }
        let rows_affected = self.errors.iter().map(|e| e.row_index).unique().count();
        let _ = writeln!(
            output,
            "{} error(s) across {} of {} row(s)",
            self.errors.len(),
            rows_affected,
            self.total_rows
        );
        output
    }
}
