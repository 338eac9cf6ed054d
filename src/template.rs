//! Starter CSV files for each import kind.

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};

use crate::{
    mapping::{CanonicalField, SchemaMapper},
    validate::ImportKind,
};

fn template_fields(kind: ImportKind) -> Vec<CanonicalField> {
    SchemaMapper::for_kind(kind)
        .fields()
        .filter(|field| kind != ImportKind::Teacher || *field != CanonicalField::Batch)
        .collect()
}

fn sample_value(kind: ImportKind, field: CanonicalField) -> &'static str {
    match (kind, field) {
        (ImportKind::Teacher, CanonicalField::Name) => "Imran Ali",
        (ImportKind::Teacher, CanonicalField::Email) => "imran.ali@example.edu",
        (_, CanonicalField::Name) => "Ayesha Khan",
        (_, CanonicalField::Email) => "ayesha.khan@example.edu",
        (_, CanonicalField::Batch) => "BSCS-2024-A",
        (_, CanonicalField::Day) => "Monday",
        (_, CanonicalField::Time) => "09:00",
        (_, CanonicalField::Subject) => "Data Structures",
    }
}

/// Header line plus one sample row that passes validation for `kind`.
pub fn render(kind: ImportKind, delimiter: u8) -> Result<String> {
    let fields = template_fields(kind);
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer
        .write_record(fields.iter().map(CanonicalField::label))
        .context("Writing template header")?;
    writer
        .write_record(fields.iter().map(|field| sample_value(kind, *field)))
        .context("Writing template sample row")?;
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Flushing template: {}", err.error()))?;
    String::from_utf8(bytes).context("Template is not valid UTF-8")
}
