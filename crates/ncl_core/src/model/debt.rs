//! Long-term debt record.
//!
//! # Responsibility
//! - Define the canonical debt row and its categorical vocabularies.
//! - Expose debt fields through the shared tabular schema.
//!
//! # Invariants
//! - `outstanding_balance <= original_amount` is expected but not enforced;
//!   synthetic noise is preserved as generated.
//! - `maturity_date` is derived from `issue_date` and `term_years`.

use super::schema::{FieldDef, FieldKind, TabularRecord};
use super::RecordKind;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Non-current debt instrument category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtType {
    BankLoan,
    IssuedBonds,
    Mortgage,
    FinanceLease,
    RelatedPartyDebt,
    NegotiableObligations,
}

impl DebtType {
    pub const ALL: [DebtType; 6] = [
        DebtType::BankLoan,
        DebtType::IssuedBonds,
        DebtType::Mortgage,
        DebtType::FinanceLease,
        DebtType::RelatedPartyDebt,
        DebtType::NegotiableObligations,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::BankLoan => "Long-Term Bank Loan",
            Self::IssuedBonds => "Issued Bonds",
            Self::Mortgage => "Real Estate Mortgage",
            Self::FinanceLease => "Finance Lease",
            Self::RelatedPartyDebt => "Related-Party Debt",
            Self::NegotiableObligations => "Negotiable Obligations",
        }
    }

    /// Inclusive annual rate range in basis points of 1/10000.
    pub fn rate_range_bp(self) -> (u32, u32) {
        match self {
            Self::BankLoan => (600, 1500),
            Self::IssuedBonds | Self::NegotiableObligations => (400, 1200),
            _ => (300, 1000),
        }
    }
}

impl Display for DebtType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Debt lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    Paid,
    Defaulted,
    Refinanced,
}

impl DebtStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Paid => "Paid",
            Self::Defaulted => "Defaulted",
            Self::Refinanced => "Refinanced",
        }
    }

    /// Whether a debt in this state still carries scoring-relevant exposure.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Defaulted)
    }
}

impl Display for DebtStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Company owing one or more debts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debtor {
    pub id: u32,
    pub name: String,
    /// CUIT-style tax id, `30-XXXXXXXX-X`.
    pub tax_id: String,
}

/// Canonical non-current debt row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: String,
    pub debtor_id: u32,
    pub debt_type: DebtType,
    pub issue_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub term_years: u32,
    pub original_amount: Decimal,
    pub annual_rate: Decimal,
    pub outstanding_balance: Decimal,
    pub accrued_interest: Decimal,
    pub status: DebtStatus,
    pub debtor_name: String,
    pub debtor_tax_id: String,
}

const DEBT_SCHEMA: &[FieldDef] = &[
    FieldDef::required("id", FieldKind::Text),
    FieldDef::required("debtor_id", FieldKind::Integer),
    FieldDef::required("debt_type", FieldKind::Category),
    FieldDef::required("issue_date", FieldKind::Date),
    FieldDef::required("maturity_date", FieldKind::Date),
    FieldDef::required("term_years", FieldKind::Integer),
    FieldDef::required("original_amount", FieldKind::Decimal),
    FieldDef::required("annual_rate", FieldKind::Decimal),
    FieldDef::required("outstanding_balance", FieldKind::Decimal),
    FieldDef::required("accrued_interest", FieldKind::Decimal),
    FieldDef::required("status", FieldKind::Category),
    FieldDef::required("debtor_name", FieldKind::Text),
    FieldDef::required("debtor_tax_id", FieldKind::Text),
];

impl TabularRecord for DebtRecord {
    const KIND: RecordKind = RecordKind::Debt;

    fn schema() -> &'static [FieldDef] {
        DEBT_SCHEMA
    }

    fn category(&self, field: &str) -> Option<&str> {
        match field {
            "id" => Some(self.id.as_str()),
            "debt_type" => Some(self.debt_type.label()),
            "status" => Some(self.status.label()),
            "debtor_name" => Some(self.debtor_name.as_str()),
            "debtor_tax_id" => Some(self.debtor_tax_id.as_str()),
            _ => None,
        }
    }

    fn decimal(&self, field: &str) -> Option<Decimal> {
        match field {
            "original_amount" => Some(self.original_amount),
            "annual_rate" => Some(self.annual_rate),
            "outstanding_balance" => Some(self.outstanding_balance),
            "accrued_interest" => Some(self.accrued_interest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DebtRecord, DebtStatus, DebtType};
    use crate::model::schema::{require_groupable, require_summable, TabularRecord};

    #[test]
    fn only_active_and_defaulted_are_open() {
        assert!(DebtStatus::Active.is_open());
        assert!(DebtStatus::Defaulted.is_open());
        assert!(!DebtStatus::Paid.is_open());
        assert!(!DebtStatus::Refinanced.is_open());
    }

    #[test]
    fn bond_like_types_share_rate_band() {
        assert_eq!(
            DebtType::IssuedBonds.rate_range_bp(),
            DebtType::NegotiableObligations.rate_range_bp()
        );
        assert_eq!(DebtType::BankLoan.rate_range_bp(), (600, 1500));
        assert_eq!(DebtType::Mortgage.rate_range_bp(), (300, 1000));
    }

    #[test]
    fn schema_exposes_dashboard_fields() {
        require_groupable::<DebtRecord>("debt_type").expect("debt_type groups");
        require_groupable::<DebtRecord>("status").expect("status groups");
        require_summable::<DebtRecord>("outstanding_balance").expect("balance sums");
        assert!(require_summable::<DebtRecord>("term_years").is_err());
        assert!(DebtRecord::field("estimated_amount").is_none());
    }
}
