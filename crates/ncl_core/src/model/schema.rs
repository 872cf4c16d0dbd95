//! Static field schema shared by all tabular records.
//!
//! # Responsibility
//! - Let each record type declare which named fields it exposes.
//! - Give aggregation a typed way to ask for a field without runtime
//!   column probing on every record.
//!
//! # Invariants
//! - `category` returns `Some` for every record when the schema declares the
//!   field as `Category` or `Text`.
//! - `decimal` returns `Some` for every record when the schema declares the
//!   field as `Decimal`.

use super::RecordKind;
use rust_decimal::Decimal;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Value shape of one named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text or identifier.
    Text,
    /// Closed set of labels, suitable for grouping.
    Category,
    /// Monetary or rate value.
    Decimal,
    Integer,
    Date,
}

/// One entry of a record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether individual records may leave the field empty.
    pub optional: bool,
}

impl FieldDef {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            optional: true,
        }
    }

    /// Whether values of this field can be used as grouping keys.
    pub fn is_groupable(&self) -> bool {
        matches!(self.kind, FieldKind::Category | FieldKind::Text) && !self.optional
    }

    /// Whether values of this field can be summed.
    pub fn is_summable(&self) -> bool {
        self.kind == FieldKind::Decimal && !self.optional
    }
}

/// A required field is absent from a record schema or has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingColumn {
    pub record: RecordKind,
    pub field: String,
    /// What the consumer needed the field for (`group` or `sum`).
    pub usage: &'static str,
}

impl Display for MissingColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records have no {} field `{}`",
            self.record, self.usage, self.field
        )
    }
}

impl Error for MissingColumn {}

/// Record that exposes named fields through a static schema.
pub trait TabularRecord {
    const KIND: RecordKind;

    /// Declared fields, in display order.
    fn schema() -> &'static [FieldDef];

    /// Label value of a `Category` or `Text` field.
    fn category(&self, field: &str) -> Option<&str>;

    /// Value of a `Decimal` field.
    fn decimal(&self, field: &str) -> Option<Decimal>;

    /// Looks up one field definition by name.
    fn field(name: &str) -> Option<&'static FieldDef> {
        Self::schema().iter().find(|def| def.name == name)
    }
}

/// Checks that `name` exists and is usable as a grouping key.
pub fn require_groupable<R: TabularRecord>(name: &str) -> Result<(), MissingColumn> {
    match R::field(name) {
        Some(def) if def.is_groupable() => Ok(()),
        _ => Err(MissingColumn {
            record: R::KIND,
            field: name.to_string(),
            usage: "group",
        }),
    }
}

/// Checks that `name` exists and is usable as a summed measure.
pub fn require_summable<R: TabularRecord>(name: &str) -> Result<(), MissingColumn> {
    match R::field(name) {
        Some(def) if def.is_summable() => Ok(()),
        _ => Err(MissingColumn {
            record: R::KIND,
            field: name.to_string(),
            usage: "sum",
        }),
    }
}
