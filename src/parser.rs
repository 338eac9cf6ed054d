//! Delimited-text tokenizer producing a [`RawTable`].
//!
//! The parser is deliberately strict about shape and lenient about content:
//!
//! - Lines may end in `\n` or `\r\n`; whitespace-only lines are dropped before
//!   anything else happens, so they never shift row indices. Fields are
//!   trimmed individually after splitting.
//! - The first remaining line is the header. Each header keeps its trimmed
//!   display form and gets a normalized key (see [`normalize_header`]).
//! - Every data line must split into exactly as many fields as the header.
//!   A single ragged line fails the whole parse; no rows are salvaged.
//!
//! Two tokenizers are available through [`QuoteMode`]. [`QuoteMode::Split`]
//! splits on the delimiter and nothing else, so a quoted field that contains
//! the delimiter becomes two fields. [`QuoteMode::Rfc4180`] runs the line
//! through the `csv` crate and honours double-quoted fields.

use std::{collections::BTreeMap, fmt, sync::Arc};

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::error::ParseError;

pub const DEFAULT_DELIMITER: u8 = b',';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum QuoteMode {
    /// Plain delimiter split; quotes are ordinary characters
    #[default]
    Split,
    /// Quote-aware tokenizer (double quotes, doubled-quote escapes)
    Rfc4180,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum DuplicateColumnPolicy {
    /// Later columns silently replace earlier ones sharing a normalized key
    #[default]
    Overwrite,
    /// Two headers normalizing to the same key fail the parse
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: u8,
    pub quoting: QuoteMode,
    pub duplicate_columns: DuplicateColumnPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            quoting: QuoteMode::Split,
            duplicate_columns: DuplicateColumnPolicy::Overwrite,
        }
    }
}

/// Lowercases and trims `raw`, then replaces anything outside `[a-z0-9_]`
/// with `_`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect()
}

fn is_usable_key(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_alphanumeric())
}

/// One data row: the table's normalized keys paired with this row's values.
///
/// Lookups by key return the value of the *last* column carrying that key,
/// which is how duplicate headers collapse under
/// [`DuplicateColumnPolicy::Overwrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    keys: Arc<[String]>,
    values: Vec<String>,
}

impl Row {
    fn new(keys: Arc<[String]>, values: Vec<String>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self { keys, values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .rposition(|candidate| candidate == key)
            .map(|idx| self.values[idx].as_str())
    }

    /// Replaces the value stored under `key`. Returns `false` when the row has
    /// no such column.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.keys.iter().rposition(|candidate| candidate == key) {
            Some(idx) => {
                self.values[idx] = value.into();
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|candidate| candidate == key)
    }

    /// Positional value, as it appeared in the source line.
    pub fn value_at(&self, column: usize) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.to_map();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    keys: Arc<[String]>,
    rows: Vec<Row>,
}

impl RawTable {
    /// Trimmed headers in source order, for display.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Normalized keys, position-aligned with [`RawTable::headers`].
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access to cell values. Row count and shape stay fixed.
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl fmt::Display for RawTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row(s) x {} column(s) [{}]",
            self.rows.len(),
            self.headers.len(),
            self.headers.join(", ")
        )
    }
}

pub fn parse(text: &str) -> Result<RawTable, ParseError> {
    parse_with(text, &ParseOptions::default())
}

pub fn parse_with(text: &str, options: &ParseOptions) -> Result<RawTable, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = tokenize(text, options)?.into_iter();

    let header_fields = lines.next().ok_or(ParseError::EmptyInput)?;
    let (headers, keys) = build_header(header_fields, options.duplicate_columns)?;
    let expected = headers.len();
    let keys: Arc<[String]> = keys.into();

    let mut rows = Vec::new();
    for (offset, fields) in lines.enumerate() {
        if fields.len() != expected {
            return Err(ParseError::RowShapeMismatch {
                // header is row 1
                row_number: offset + 2,
                actual: fields.len(),
                expected,
            });
        }
        rows.push(Row::new(Arc::clone(&keys), fields));
    }

    debug!(
        "Parsed {} data row(s) across {} column(s)",
        rows.len(),
        expected
    );
    Ok(RawTable {
        headers,
        keys,
        rows,
    })
}

fn build_header(
    fields: Vec<String>,
    duplicates: DuplicateColumnPolicy,
) -> Result<(Vec<String>, Vec<String>), ParseError> {
    let mut keys = Vec::with_capacity(fields.len());
    for (position, header) in fields.iter().enumerate() {
        let key = normalize_header(header);
        if !is_usable_key(&key) {
            return Err(ParseError::InvalidHeader {
                position,
                header: header.clone(),
            });
        }
        if duplicates == DuplicateColumnPolicy::Reject {
            if let Some(first) = keys.iter().position(|existing| existing == &key) {
                return Err(ParseError::DuplicateColumn {
                    key,
                    first: fields[first].clone(),
                    second: header.clone(),
                });
            }
        }
        keys.push(key);
    }
    Ok((fields, keys))
}

/// Splits `text` into non-blank lines of trimmed fields.
fn tokenize(text: &str, options: &ParseOptions) -> Result<Vec<Vec<String>>, ParseError> {
    match options.quoting {
        QuoteMode::Split => Ok(split_lines(text, options.delimiter)),
        QuoteMode::Rfc4180 => quoted_lines(text, options.delimiter),
    }
}

fn split_lines(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    let delimiter = delimiter as char;
    // the raw line is split; trimming it first drops empty edge cells under tab
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(delimiter)
                .map(|field| field.trim().to_string())
                .collect()
        })
        .collect()
}

/// Quote-aware tokenizing. A record is blank when its source span, including
/// any skipped lines before it, is whitespace only; a quoted empty field
/// (`""`) is a value, not a blank line.
fn quoted_lines(text: &str, delimiter: u8) -> Result<Vec<Vec<String>>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut lines = Vec::new();
    let mut record = csv::StringRecord::new();
    let mut span_start = 0usize;
    loop {
        let more = reader
            .read_record(&mut record)
            .map_err(|err| ParseError::Quoting {
                row_number: lines.len() + 1,
                detail: err.to_string(),
            })?;
        if !more {
            break;
        }
        let span_end = usize::try_from(reader.position().byte()).unwrap_or(text.len());
        let span = text.get(span_start..span_end).unwrap_or_default();
        span_start = span_end;
        if span.trim().is_empty() {
            continue;
        }
        lines.push(record.iter().map(|field| field.trim().to_string()).collect());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_header_lowercases_and_replaces_symbols() {
        assert_eq!(normalize_header("  Email Address "), "email_address");
        assert_eq!(normalize_header("Day-Of-Week"), "day_of_week");
        assert_eq!(normalize_header("batch_id"), "batch_id");
        assert_eq!(normalize_header("Café"), "caf_");
    }

    #[test]
    fn crlf_and_blank_lines_are_ignored() {
        let table = parse("Name,Email\r\n\r\n  \nAda,ada@x.io\r\n\nBob,bob@x.io\n").unwrap();
        assert_eq!(table.headers(), ["Name", "Email"]);
        assert_eq!(table.keys(), ["name", "email"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1].get("name"), Some("Bob"));
    }

    #[test]
    fn whitespace_only_input_is_empty() {
        assert_eq!(parse(" \n\r\n\t\n"), Err(ParseError::EmptyInput));
    }

    #[test]
    fn leading_byte_order_mark_is_dropped() {
        let table = parse("\u{feff}Name\nAda\n").unwrap();
        assert_eq!(table.keys(), ["name"]);
    }

    #[test]
    fn empty_or_symbol_only_header_is_invalid() {
        assert!(matches!(
            parse("Name,,Email\nA,B,C"),
            Err(ParseError::InvalidHeader { position: 1, .. })
        ));
        assert!(matches!(
            parse("Name,##\nA,B"),
            Err(ParseError::InvalidHeader { position: 1, .. })
        ));
    }

    #[test]
    fn ragged_row_reports_line_number_counting_header() {
        let err = parse("a,b,c\n1,2,3\n\n4,5\n6,7,8").unwrap_err();
        assert_eq!(
            err,
            ParseError::RowShapeMismatch {
                row_number: 3,
                actual: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn header_only_file_yields_zero_rows() {
        let table = parse("Name,Email\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn duplicate_keys_overwrite_by_default() {
        let table = parse("Name,Name\nfirst,second").unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("name"), Some("second"));
        assert_eq!(row.value_at(0), Some("first"));
        assert_eq!(row.to_map().len(), 1);
    }

    #[test]
    fn duplicate_keys_can_be_rejected() {
        let options = ParseOptions {
            duplicate_columns: DuplicateColumnPolicy::Reject,
            ..ParseOptions::default()
        };
        let err = parse_with("Full Name,full-name\nA,B", &options).unwrap_err();
        assert_eq!(
            err,
            ParseError::DuplicateColumn {
                key: "full_name".into(),
                first: "Full Name".into(),
                second: "full-name".into(),
            }
        );
    }

    #[test]
    fn split_mode_treats_quoted_delimiters_as_boundaries() {
        let err = parse("name,email\n\"Doe, John\",j@x.io").unwrap_err();
        assert!(matches!(
            err,
            ParseError::RowShapeMismatch {
                actual: 3,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn rfc4180_mode_keeps_quoted_delimiters() {
        let options = ParseOptions {
            quoting: QuoteMode::Rfc4180,
            ..ParseOptions::default()
        };
        let table = parse_with("name,email\n\n\" Doe, John \",j@x.io\n", &options).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows()[0].get("name"), Some("Doe, John"));
    }

    #[test]
    fn alternate_delimiter_is_honoured() {
        let options = ParseOptions {
            delimiter: b';',
            ..ParseOptions::default()
        };
        let table = parse_with("name;email\nAda;ada@x.io", &options).unwrap();
        assert_eq!(table.rows()[0].get("email"), Some("ada@x.io"));
    }

    #[test]
    fn set_updates_last_column_for_key() {
        let mut table = parse("name,email\nAda,").unwrap();
        assert!(table.rows_mut()[0].set("email", "ada@x.io"));
        assert!(!table.rows_mut()[0].set("batch", "B1"));
        assert_eq!(table.rows()[0].get("email"), Some("ada@x.io"));
    }

    #[test]
    fn row_serializes_as_key_value_map() {
        let table = parse("Name,Email\nAda,ada@x.io").unwrap();
        let json = serde_json::to_string(&table.rows()[0]).unwrap();
        assert_eq!(json, r#"{"email":"ada@x.io","name":"Ada"}"#);
    }
}
