//! File selection and the text-reading collaborator.
//!
//! A [`FileHandle`] is what the user picked; an [`UploadPolicy`] decides
//! whether it may be selected at all; a [`FileReader`] turns it into text when
//! analysis starts.

use std::{
    fs,
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    error::{ReadError, SelectionError},
    io_utils,
};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
    size: u64,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Builds a handle for an existing file, taking its size from the filesystem.
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        let metadata = fs::metadata(path)?;
        Ok(Self::new(path, metadata.len()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

pub trait FileReader {
    fn read(&self, file: &FileHandle) -> Result<String, ReadError>;
}

impl<R: FileReader + ?Sized> FileReader for &R {
    fn read(&self, file: &FileHandle) -> Result<String, ReadError> {
        (**self).read(file)
    }
}

impl<R: FileReader + ?Sized> FileReader for Box<R> {
    fn read(&self, file: &FileHandle) -> Result<String, ReadError> {
        (**self).read(file)
    }
}

/// Reads handles from the local filesystem and decodes them with a fixed
/// encoding.
#[derive(Debug, Clone, Copy)]
pub struct FsReader {
    encoding: &'static Encoding,
}

impl FsReader {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }
}

impl Default for FsReader {
    fn default() -> Self {
        Self::new(UTF_8)
    }
}

impl FileReader for FsReader {
    fn read(&self, file: &FileHandle) -> Result<String, ReadError> {
        let bytes = fs::read(file.path())?;
        debug!("Read {} byte(s) from {:?}", bytes.len(), file.path());
        io_utils::decode_text(&bytes, self.encoding)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub accepted_extensions: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_extensions: vec!["csv".to_string()],
            max_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, file: &FileHandle) -> Result<(), SelectionError> {
        if !self.accepted_extensions.is_empty() {
            let extension = file.extension().unwrap_or_default();
            let accepted = self
                .accepted_extensions
                .iter()
                .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(&extension));
            if !accepted {
                return Err(SelectionError::Extension {
                    accepted: self.accepted_label(),
                });
            }
        }
        if file.size() > self.max_bytes {
            return Err(SelectionError::TooLarge {
                size: file.size(),
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    fn accepted_label(&self) -> String {
        self.accepted_extensions
            .iter()
            .map(|ext| format!(".{}", ext.trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join(",")
    }
}
