//! Persistence collaborators that receive confirmed rows.
//!
//! A sink is called exactly once per successful confirm, with the complete
//! validated row set. Sinks are injected into the session; nothing here is
//! process-global.

use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::{io_utils, parser::Row, validate::ImportKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub batch_id: Uuid,
    pub count: usize,
    pub committed_at: DateTime<Utc>,
    /// SHA-256 of the persisted payload, when the sink writes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl CommitReceipt {
    pub fn new(count: usize) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            count,
            committed_at: Utc::now(),
            checksum: None,
        }
    }
}

pub trait PersistenceSink {
    fn commit(&mut self, kind: ImportKind, rows: &[Row]) -> Result<CommitReceipt>;
}

impl<S: PersistenceSink + ?Sized> PersistenceSink for &mut S {
    fn commit(&mut self, kind: ImportKind, rows: &[Row]) -> Result<CommitReceipt> {
        (**self).commit(kind, rows)
    }
}

impl<S: PersistenceSink + ?Sized> PersistenceSink for Box<S> {
    fn commit(&mut self, kind: ImportKind, rows: &[Row]) -> Result<CommitReceipt> {
        (**self).commit(kind, rows)
    }
}

#[derive(Debug, Clone)]
pub struct CommittedBatch {
    pub kind: ImportKind,
    pub rows: Vec<Row>,
    pub receipt: CommitReceipt,
}

/// Keeps every commit in memory. Backs `--dry-run`.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<CommittedBatch>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[CommittedBatch] {
        &self.batches
    }

    pub fn commit_count(&self) -> usize {
        self.batches.len()
    }
}

impl PersistenceSink for MemorySink {
    fn commit(&mut self, kind: ImportKind, rows: &[Row]) -> Result<CommitReceipt> {
        let receipt = CommitReceipt::new(rows.len());
        self.batches.push(CommittedBatch {
            kind,
            rows: rows.to_vec(),
            receipt: receipt.clone(),
        });
        Ok(receipt)
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    kind: ImportKind,
    batch_id: Uuid,
    committed_at: DateTime<Utc>,
    fields: &'a Row,
}

/// Appends one JSON object per confirmed row to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for JsonLinesSink {
    fn commit(&mut self, kind: ImportKind, rows: &[Row]) -> Result<CommitReceipt> {
        let mut receipt = CommitReceipt::new(rows.len());

        // nothing touches the file until every row has serialized
        let mut payload = Vec::new();
        for row in rows {
            let line = JsonLine {
                kind,
                batch_id: receipt.batch_id,
                committed_at: receipt.committed_at,
                fields: row,
            };
            serde_json::to_writer(&mut payload, &line).context("Serializing confirmed row")?;
            payload.push(b'\n');
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Opening sink file {:?}", self.path))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&payload)
            .with_context(|| format!("Writing confirmed rows to {:?}", self.path))?;
        writer.flush()?;

        receipt.checksum = Some(io_utils::sha256_hex(&payload));
        info!(
            "Persisted {} {} row(s) to {:?} (batch {})",
            receipt.count, kind, self.path, receipt.batch_id
        );
        Ok(receipt)
    }
}
