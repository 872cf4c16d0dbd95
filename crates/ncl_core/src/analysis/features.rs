//! Feature extraction for anomaly scoring.
//!
//! # Responsibility
//! - Turn records into fixed-order numeric rows, one row per scored record.
//! - Apply the per-kind participation filter before scoring.
//!
//! # Invariants
//! - Row order follows input order; `ids[i]` names the record of `rows[i]`.
//! - Every cell is finite; unrepresentable values are imputed to `0.0`.

use crate::model::debt::DebtRecord;
use crate::model::provision::ProvisionRecord;
use crate::model::RecordKind;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Number of features per row for every record kind.
pub const FEATURE_COUNT: usize = 3;

pub type FeatureRow = [f64; FEATURE_COUNT];

pub const DEBT_FEATURES: [&str; FEATURE_COUNT] =
    ["outstanding_balance", "annual_rate", "term_years"];
pub const PROVISION_FEATURES: [&str; FEATURE_COUNT] = [
    "estimated_amount",
    "probability_value",
    "days_since_creation",
];

/// Numeric matrix handed to the detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    pub kind: RecordKind,
    pub ids: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in row order.
    pub fn columns(&self) -> [&'static str; FEATURE_COUNT] {
        feature_names(self.kind)
    }
}

/// Column names for one record kind.
pub fn feature_names(kind: RecordKind) -> [&'static str; FEATURE_COUNT] {
    match kind {
        RecordKind::Debt => DEBT_FEATURES,
        RecordKind::Provision => PROVISION_FEATURES,
    }
}

/// Builds feature rows relative to one reference date.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    as_of: NaiveDate,
}

impl FeatureExtractor {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    /// Rows for debts still open (`Active` or `Defaulted`); closed and
    /// refinanced debts do not participate.
    pub fn debts(&self, records: &[DebtRecord]) -> FeatureMatrix {
        let (ids, rows): (Vec<String>, Vec<FeatureRow>) = records
            .iter()
            .filter(|record| record.status.is_open())
            .map(|record| {
                (
                    record.id.clone(),
                    [
                        decimal_feature(record.outstanding_balance),
                        decimal_feature(record.annual_rate),
                        impute(Some(f64::from(record.term_years))),
                    ],
                )
            })
            .unzip();

        FeatureMatrix {
            kind: RecordKind::Debt,
            ids,
            rows,
        }
    }

    /// Rows for every provision.
    pub fn provisions(&self, records: &[ProvisionRecord]) -> FeatureMatrix {
        let (ids, rows): (Vec<String>, Vec<FeatureRow>) = records
            .iter()
            .map(|record| {
                (
                    record.id.clone(),
                    [
                        decimal_feature(record.estimated_amount),
                        impute(Some(record.occurrence_probability.as_value())),
                        impute(record.days_since_creation(self.as_of).to_f64()),
                    ],
                )
            })
            .unzip();

        FeatureMatrix {
            kind: RecordKind::Provision,
            ids,
            rows,
        }
    }
}

fn decimal_feature(value: Decimal) -> f64 {
    impute(value.to_f64())
}

/// Missing or non-finite values become `0.0`.
pub fn impute(value: Option<f64>) -> f64 {
    match value {
        Some(number) if number.is_finite() => number,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::impute;

    #[test]
    fn impute_replaces_missing_and_non_finite() {
        assert_eq!(impute(None), 0.0);
        assert_eq!(impute(Some(f64::NAN)), 0.0);
        assert_eq!(impute(Some(f64::INFINITY)), 0.0);
        assert_eq!(impute(Some(2.5)), 2.5);
    }
}
