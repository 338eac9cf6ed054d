use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    parser::{DuplicateColumnPolicy, QuoteMode},
    validate::ImportKind,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Validate and import roster and timetable CSV files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse and validate a CSV file, then show the first rows with flagged cells
    Preview(PreviewArgs),
    /// Report every validation error in a CSV file
    Validate(ValidateArgs),
    /// Run the full import: analyse, confirm, and persist the rows
    Import(ImportArgs),
    /// Write a starter CSV for an import kind
    Template(TemplateArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// CSV file to import
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Which rule set applies (student, teacher, timetable)
    #[arg(short = 'k', long = "kind", value_enum)]
    pub kind: ImportKind,
    /// YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// How quoted fields are tokenized
    #[arg(long, value_enum)]
    pub quoting: Option<QuoteMode>,
    /// What happens when two headers normalize to the same key
    #[arg(long = "duplicate-columns", value_enum)]
    pub duplicate_columns: Option<DuplicateColumnPolicy>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Number of rows to display
    #[arg(long)]
    pub rows: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Append confirmed rows as JSON lines to this file
    #[arg(short = 'o', long = "output", conflicts_with = "dry_run")]
    pub output: Option<PathBuf>,
    /// Confirm in memory only; nothing is written
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Which import kind to generate a template for
    #[arg(short = 'k', long = "kind", value_enum)]
    pub kind: ImportKind,
    /// Destination file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter used in the template
    #[arg(long, value_parser = parse_delimiter, default_value = ",")]
    pub delimiter: u8,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() || matches!(first, '\n' | '\r' | '"') {
                return Err("Delimiter must be a printable ASCII character".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn delimiter_names_resolve() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("::").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
