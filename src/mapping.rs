//! Canonical field resolution over normalized header keys.
//!
//! Source files spell their headers in many ways ("Email", "Email Address",
//! "email_address"). Each import kind carries a fixed alias table mapping a
//! [`CanonicalField`] to the normalized keys that may hold it, in priority
//! order. The same table drives both value lookup ([`SchemaMapper::resolve`])
//! and display-column labelling ([`SchemaMapper::field_for_key`]), so a column
//! is attributed to a field in exactly one place.

use std::fmt;

use heck::ToTitleCase;
use serde::{Deserialize, Serialize};

use crate::{parser::Row, validate::ImportKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Name,
    Email,
    Batch,
    Day,
    Time,
    Subject,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Email => "email",
            CanonicalField::Batch => "batch",
            CanonicalField::Day => "day",
            CanonicalField::Time => "time",
            CanonicalField::Subject => "subject",
        }
    }

    /// Human-facing column title, e.g. `Email`.
    pub fn label(&self) -> String {
        self.as_str().to_title_case()
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub field: CanonicalField,
    pub aliases: &'static [&'static str],
}

const ROSTER_FIELDS: &[FieldAliases] = &[
    FieldAliases {
        field: CanonicalField::Name,
        aliases: &["name", "full_name"],
    },
    FieldAliases {
        field: CanonicalField::Email,
        aliases: &["email", "email_address"],
    },
    FieldAliases {
        field: CanonicalField::Batch,
        aliases: &["batch", "batch_id", "class"],
    },
];

const TIMETABLE_FIELDS: &[FieldAliases] = &[
    FieldAliases {
        field: CanonicalField::Batch,
        aliases: &["batch", "batch_id"],
    },
    FieldAliases {
        field: CanonicalField::Day,
        aliases: &["day", "day_of_week"],
    },
    FieldAliases {
        field: CanonicalField::Time,
        aliases: &["time", "start_time"],
    },
    FieldAliases {
        field: CanonicalField::Subject,
        aliases: &["subject", "course"],
    },
];

#[derive(Debug, Clone, Copy)]
pub struct SchemaMapper {
    fields: &'static [FieldAliases],
}

impl SchemaMapper {
    pub fn for_kind(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Student | ImportKind::Teacher => Self::roster(),
            ImportKind::Timetable => Self::timetable(),
        }
    }

    pub fn roster() -> Self {
        Self {
            fields: ROSTER_FIELDS,
        }
    }

    pub fn timetable() -> Self {
        Self {
            fields: TIMETABLE_FIELDS,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.fields.iter().map(|entry| entry.field)
    }

    /// Aliases for `field` in priority order; empty when the field is not
    /// part of this mapper's vocabulary.
    pub fn aliases(&self, field: CanonicalField) -> &'static [&'static str] {
        self.fields
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.aliases)
            .unwrap_or(&[])
    }

    /// Value of `field` in `row`.
    ///
    /// The first alias holding a non-empty value wins. When aliases are present
    /// but all blank, the first present one is returned (as `""`). `None` means
    /// no alias column exists at all.
    pub fn resolve<'r>(&self, row: &'r Row, field: CanonicalField) -> Option<&'r str> {
        let mut first_present = None;
        for alias in self.aliases(field) {
            match row.get(alias) {
                Some(value) if !value.is_empty() => return Some(value),
                Some(value) => {
                    first_present.get_or_insert(value);
                }
                None => {}
            }
        }
        first_present
    }

    /// Canonical field a normalized header key feeds, if any.
    pub fn field_for_key(&self, key: &str) -> Option<CanonicalField> {
        self.fields
            .iter()
            .find(|entry| entry.aliases.contains(&key))
            .map(|entry| entry.field)
    }
}
