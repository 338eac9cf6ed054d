//! The upload → preview → confirm workflow.
//!
//! ```text
//!   UPLOAD --start_analysis--> PREVIEW --confirm--> SUCCESS
//!      ^                          |
//!      +---------discard----------+
//! ```
//!
//! A session owns its selected file, parsed table and error list outright.
//! The file reader and persistence sink are injected, so a session never
//! reaches for shared state. `SUCCESS` is terminal; start a new session for
//! the next import.

use std::fmt;

use log::{info, warn};
use serde::Serialize;

use crate::{
    error::ImportError,
    parser::{ParseOptions, RawTable, Row, parse_with},
    preview::CellErrors,
    sink::{CommitReceipt, PersistenceSink},
    source::{FileHandle, FileReader, UploadPolicy},
    validate::{ImportKind, ValidationError, validate},
};

pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportStep {
    Upload,
    Preview,
    Success,
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportStep::Upload => "UPLOAD",
            ImportStep::Preview => "PREVIEW",
            ImportStep::Success => "SUCCESS",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub parse: ParseOptions,
    pub upload: UploadPolicy,
    pub preview_rows: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            upload: UploadPolicy::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// The leading slice of a parsed table shown before commit.
#[derive(Debug, Clone, Copy)]
pub struct PreviewWindow<'s> {
    pub kind: ImportKind,
    pub headers: &'s [String],
    pub keys: &'s [String],
    pub rows: &'s [Row],
    pub total_rows: usize,
    pub errors: &'s [ValidationError],
}

impl PreviewWindow<'_> {
    /// Rows parsed but not shown in the window.
    pub fn remaining(&self) -> usize {
        self.total_rows - self.rows.len()
    }
}

pub struct ImportSession<R, S> {
    kind: ImportKind,
    step: ImportStep,
    settings: SessionSettings,
    reader: R,
    sink: S,
    selected: Option<FileHandle>,
    table: Option<RawTable>,
    errors: Vec<ValidationError>,
    last_error: Option<String>,
    receipt: Option<CommitReceipt>,
}

impl<R, S> ImportSession<R, S>
where
    R: FileReader,
    S: PersistenceSink,
{
    pub fn new(kind: ImportKind, reader: R, sink: S) -> Self {
        Self::with_settings(kind, reader, sink, SessionSettings::default())
    }

    pub fn with_settings(kind: ImportKind, reader: R, sink: S, settings: SessionSettings) -> Self {
        Self {
            kind,
            step: ImportStep::Upload,
            settings,
            reader,
            sink,
            selected: None,
            table: None,
            errors: Vec::new(),
            last_error: None,
            receipt: None,
        }
    }

    pub fn step(&self) -> ImportStep {
        self.step
    }

    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    pub fn selected_file(&self) -> Option<&FileHandle> {
        self.selected.as_ref()
    }

    /// Message of the most recent selection, read or parse failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn table(&self) -> Option<&RawTable> {
        self.table.as_ref()
    }

    /// Mutable access to the held table while previewing. The cached error
    /// list is not refreshed until [`ImportSession::revalidate`] or
    /// [`ImportSession::confirm`] runs.
    pub fn table_mut(&mut self) -> Option<&mut RawTable> {
        self.table.as_mut()
    }

    /// Errors as of the most recent validation pass.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn total_rows(&self) -> usize {
        match (&self.table, &self.receipt) {
            (Some(table), _) => table.row_count(),
            (None, Some(receipt)) => receipt.count,
            (None, None) => 0,
        }
    }

    pub fn receipt(&self) -> Option<&CommitReceipt> {
        self.receipt.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (R, S) {
        (self.reader, self.sink)
    }

    /// Switches the rule set. While previewing, errors are recomputed at once.
    pub fn set_kind(&mut self, kind: ImportKind) -> Result<(), ImportError> {
        self.ensure_not_finished("change the import kind")?;
        self.kind = kind;
        if self.step == ImportStep::Preview {
            self.revalidate();
        }
        Ok(())
    }

    pub fn select_file(&mut self, file: FileHandle) -> Result<(), ImportError> {
        self.ensure_step(ImportStep::Upload, "select a file")?;
        self.last_error = None;
        if let Err(err) = self.settings.upload.check(&file) {
            warn!("Rejected {}: {err}", file.name());
            self.selected = None;
            return Err(self.record(err.into()));
        }
        info!("Selected {} ({} bytes)", file.name(), file.size());
        self.selected = Some(file);
        Ok(())
    }

    pub fn clear_file(&mut self) -> Result<(), ImportError> {
        self.ensure_step(ImportStep::Upload, "clear the file")?;
        self.selected = None;
        self.last_error = None;
        Ok(())
    }

    /// Reads and parses the selected file, validates every row and moves to
    /// `PREVIEW`. On failure the session stays in `UPLOAD` with the file still
    /// selected.
    pub fn start_analysis(&mut self) -> Result<(), ImportError> {
        self.ensure_step(ImportStep::Upload, "start analysis")?;
        let file = self.selected.as_ref().ok_or(ImportError::NoFileSelected)?;
        self.last_error = None;

        let parsed = self
            .reader
            .read(file)
            .map_err(ImportError::from)
            .and_then(|text| parse_with(&text, &self.settings.parse).map_err(ImportError::from));
        let table = match parsed {
            Ok(table) => table,
            Err(err) => {
                warn!("Analysis of {} failed: {err}", file.name());
                return Err(self.record(err));
            }
        };

        self.errors = validate(&table, self.kind);
        info!(
            "Analysed {}: {} row(s), {} validation error(s)",
            file.name(),
            table.row_count(),
            self.errors.len()
        );
        self.table = Some(table);
        self.step = ImportStep::Preview;
        Ok(())
    }

    /// Recomputes the error list from the held table.
    pub fn revalidate(&mut self) -> &[ValidationError] {
        self.errors = self
            .table
            .as_ref()
            .map(|table| validate(table, self.kind))
            .unwrap_or_default();
        &self.errors
    }

    /// True when previewing and the held table validates cleanly right now.
    pub fn can_confirm(&self) -> bool {
        self.step == ImportStep::Preview
            && self
                .table
                .as_ref()
                .is_some_and(|table| validate(table, self.kind).is_empty())
    }

    pub fn preview(&self) -> Option<PreviewWindow<'_>> {
        if self.step != ImportStep::Preview {
            return None;
        }
        let table = self.table.as_ref()?;
        let shown = table.row_count().min(self.settings.preview_rows);
        Some(PreviewWindow {
            kind: self.kind,
            headers: table.headers(),
            keys: table.keys(),
            rows: &table.rows()[..shown],
            total_rows: table.row_count(),
            errors: &self.errors,
        })
    }

    pub fn cell_errors(&self) -> Option<CellErrors<'_>> {
        let table = self.table.as_ref()?;
        Some(CellErrors::build(table, &self.errors, self.kind))
    }

    /// Hands every row to the sink and finishes the session.
    ///
    /// Rows are revalidated first; any error rejects the call with
    /// [`ImportError::ConfirmBlocked`] and leaves the session untouched.
    pub fn confirm(&mut self) -> Result<CommitReceipt, ImportError> {
        self.ensure_step(ImportStep::Preview, "confirm")?;
        let error_count = self.revalidate().len();
        if error_count > 0 {
            warn!("Confirm rejected: {error_count} validation error(s) outstanding");
            return Err(ImportError::ConfirmBlocked { error_count });
        }
        let table = self.table.as_ref().ok_or(ImportError::InvalidState {
            operation: "confirm",
            step: self.step,
        })?;

        let receipt = match self.sink.commit(self.kind, table.rows()) {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.record(ImportError::Commit(err))),
        };
        info!(
            "Confirmed {} {} row(s) (batch {})",
            receipt.count, self.kind, receipt.batch_id
        );

        self.step = ImportStep::Success;
        self.selected = None;
        self.table = None;
        self.errors.clear();
        self.last_error = None;
        self.receipt = Some(receipt.clone());
        Ok(receipt)
    }

    /// Drops the parsed table and selected file and returns to `UPLOAD`.
    pub fn discard(&mut self) -> Result<(), ImportError> {
        self.ensure_step(ImportStep::Preview, "discard")?;
        info!("Discarded preview of {} row(s)", self.total_rows());
        self.step = ImportStep::Upload;
        self.selected = None;
        self.table = None;
        self.errors.clear();
        self.last_error = None;
        Ok(())
    }

    fn record(&mut self, err: ImportError) -> ImportError {
        self.last_error = Some(err.to_string());
        err
    }

    fn ensure_step(&self, expected: ImportStep, operation: &'static str) -> Result<(), ImportError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidState {
                operation,
                step: self.step,
            })
        }
    }

    fn ensure_not_finished(&self, operation: &'static str) -> Result<(), ImportError> {
        if self.step == ImportStep::Success {
            Err(ImportError::InvalidState {
                operation,
                step: self.step,
            })
        } else {
            Ok(())
        }
    }
}
