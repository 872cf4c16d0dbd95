//! Domain model for non-current liability records.
//!
//! # Responsibility
//! - Define the debt and provision records produced by synthesis.
//! - Declare a static field schema per record type so consumers can check
//!   field availability before touching any record.
//!
//! # Invariants
//! - Records are immutable once generated; analysis derives new values.
//! - Monetary fields are `Decimal` with cent resolution.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod debt;
pub mod provision;
pub mod schema;

/// Record family tag used by caches, features and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Long-term debt (loans, bonds, leases).
    Debt,
    /// Estimated liability for a probable future obligation.
    Provision,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debt => "debt",
            Self::Provision => "provision",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
