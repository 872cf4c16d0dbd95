//! Provision record.
//!
//! # Responsibility
//! - Define the canonical provision row and its vocabularies.
//! - Expose provision fields through the shared tabular schema.
//!
//! # Invariants
//! - `last_review_date` never passes the generation reference date.
//! - `estimated_use_date` is empty only when the status leaves it undefined.

use super::schema::{FieldDef, FieldKind, TabularRecord};
use super::RecordKind;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionType {
    Warranties,
    Litigation,
    DoubtfulAccounts,
    Restructuring,
    SalesReturns,
    Decommissioning,
}

impl ProvisionType {
    pub const ALL: [ProvisionType; 6] = [
        ProvisionType::Warranties,
        ProvisionType::Litigation,
        ProvisionType::DoubtfulAccounts,
        ProvisionType::Restructuring,
        ProvisionType::SalesReturns,
        ProvisionType::Decommissioning,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Warranties => "Warranties",
            Self::Litigation => "Litigation",
            Self::DoubtfulAccounts => "Doubtful Accounts",
            Self::Restructuring => "Restructuring",
            Self::SalesReturns => "Sales Returns",
            Self::Decommissioning => "Decommissioning",
        }
    }
}

impl Display for ProvisionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Likelihood that the provisioned obligation materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceProbability {
    Low,
    Medium,
    High,
}

impl OccurrenceProbability {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Numeric encoding used as a scoring feature.
    pub fn as_value(self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.50,
            Self::High => 0.75,
        }
    }
}

impl Display for OccurrenceProbability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStatus {
    Active,
    Used,
    Reversed,
    Adjusted,
}

impl ProvisionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Used => "Used",
            Self::Reversed => "Reversed",
            Self::Adjusted => "Adjusted",
        }
    }

    /// Whether the expected use date lies ahead of the reference date.
    pub fn expects_future_use(self) -> bool {
        matches!(self, Self::Active | Self::Adjusted)
    }
}

impl Display for ProvisionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical provision row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRecord {
    pub id: String,
    pub provision_type: ProvisionType,
    pub description: String,
    pub creation_date: NaiveDate,
    pub estimated_amount: Decimal,
    pub occurrence_probability: OccurrenceProbability,
    pub status: ProvisionStatus,
    pub last_review_date: NaiveDate,
    pub estimated_use_date: Option<NaiveDate>,
}

impl ProvisionRecord {
    /// Whole days between creation and `as_of` (negative if created later).
    pub fn days_since_creation(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.creation_date).num_days()
    }
}

const PROVISION_SCHEMA: &[FieldDef] = &[
    FieldDef::required("id", FieldKind::Text),
    FieldDef::required("provision_type", FieldKind::Category),
    FieldDef::required("description", FieldKind::Text),
    FieldDef::required("creation_date", FieldKind::Date),
    FieldDef::required("estimated_amount", FieldKind::Decimal),
    FieldDef::required("occurrence_probability", FieldKind::Category),
    FieldDef::required("status", FieldKind::Category),
    FieldDef::required("last_review_date", FieldKind::Date),
    FieldDef::optional("estimated_use_date", FieldKind::Date),
];

impl TabularRecord for ProvisionRecord {
    const KIND: RecordKind = RecordKind::Provision;

    fn schema() -> &'static [FieldDef] {
        PROVISION_SCHEMA
    }

    fn category(&self, field: &str) -> Option<&str> {
        match field {
            "id" => Some(self.id.as_str()),
            "provision_type" => Some(self.provision_type.label()),
            "description" => Some(self.description.as_str()),
            "occurrence_probability" => Some(self.occurrence_probability.label()),
            "status" => Some(self.status.label()),
            _ => None,
        }
    }

    fn decimal(&self, field: &str) -> Option<Decimal> {
        match field {
            "estimated_amount" => Some(self.estimated_amount),
            _ => None,
        }
    }
}
