//! Import configuration, loaded from YAML and overridable from the CLI.
//!
//! ```yaml
//! preview_rows: 5
//! max_file_bytes: 2097152
//! accepted_extensions: [csv]
//! delimiter: ","
//! quoting: split          # or rfc4180
//! duplicate_columns: overwrite   # or reject
//! encoding: utf-8
//! ```
//!
//! Every key is optional.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::{
    io_utils,
    parser::{DuplicateColumnPolicy, ParseOptions, QuoteMode},
    session::{DEFAULT_PREVIEW_ROWS, SessionSettings},
    source::{DEFAULT_MAX_FILE_BYTES, UploadPolicy},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub preview_rows: usize,
    pub max_file_bytes: u64,
    pub accepted_extensions: Vec<String>,
    /// Unset means "infer from the file extension".
    pub delimiter: Option<char>,
    pub quoting: QuoteMode,
    pub duplicate_columns: DuplicateColumnPolicy,
    pub encoding: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            accepted_extensions: vec!["csv".to_string()],
            delimiter: None,
            quoting: QuoteMode::default(),
            duplicate_columns: DuplicateColumnPolicy::default(),
            encoding: None,
        }
    }
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: ImportConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn ensure_valid(&self) -> Result<()> {
        if let Some(delimiter) = self.delimiter {
            ensure!(delimiter.is_ascii(), "Delimiter must be ASCII");
            ensure!(
                !matches!(delimiter, '\n' | '\r' | '"'),
                "Delimiter cannot be a newline or quote"
            );
        }
        io_utils::resolve_encoding(self.encoding.as_deref())?;
        Ok(())
    }

    pub fn encoding(&self) -> Result<&'static Encoding> {
        io_utils::resolve_encoding(self.encoding.as_deref())
    }

    /// Settings for a session reading `input`.
    pub fn session_settings(&self, input: &Path) -> SessionSettings {
        let delimiter =
            io_utils::resolve_input_delimiter(input, self.delimiter.map(|c| c as u8));
        SessionSettings {
            parse: ParseOptions {
                delimiter,
                quoting: self.quoting,
                duplicate_columns: self.duplicate_columns,
            },
            upload: UploadPolicy {
                accepted_extensions: self.accepted_extensions.clone(),
                max_bytes: self.max_file_bytes,
            },
            preview_rows: self.preview_rows,
        }
    }
}
