#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use lurnip_import::error::ReadError;
use lurnip_import::sink::{CommitReceipt, PersistenceSink};
use lurnip_import::source::{FileHandle, FileReader};
use lurnip_import::{ImportKind, Row};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// In-memory reader keyed by file name. Unknown names fail like a missing file.
#[derive(Default)]
pub struct FakeReader {
    files: HashMap<String, String>,
    reads: RefCell<usize>,
}

impl FakeReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, contents: &str) -> Self {
        self.files.insert(name.to_string(), contents.to_string());
        self
    }

    pub fn reads(&self) -> usize {
        *self.reads.borrow()
    }
}

impl FileReader for FakeReader {
    fn read(&self, file: &FileHandle) -> Result<String, ReadError> {
        *self.reads.borrow_mut() += 1;
        self.files.get(&file.name()).cloned().ok_or_else(|| {
            ReadError::Io(io::Error::new(io::ErrorKind::NotFound, "no such fixture"))
        })
    }
}

/// Sink that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingSink {
    pub commits: Vec<(ImportKind, Vec<Row>)>,
    pub fail_with: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            commits: Vec::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

impl PersistenceSink for RecordingSink {
    fn commit(&mut self, kind: ImportKind, rows: &[Row]) -> Result<CommitReceipt> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{message}"));
        }
        self.commits.push((kind, rows.to_vec()));
        Ok(CommitReceipt::new(rows.len()))
    }
}

pub fn handle(name: &str) -> FileHandle {
    FileHandle::new(name, 128)
}
