//! Deterministic synthesis of debt and provision records.
//!
//! # Responsibility
//! - Produce mock non-current liability data from a seed and a reference
//!   date.
//! - Keep generation reproducible: the same `(seed, reference_date, count)`
//!   always yields the same records, field by field.
//!
//! # Invariants
//! - Every stream is a `ChaCha8Rng` seeded from the caller's seed, so output
//!   is stable across platforms.
//! - Generation never fails; `count == 0` yields an empty vector.
//! - Balance and status quirks (flooring, the post-hoc default override) are
//!   reproduced as stated and never corrected.

mod debtors;

use crate::model::debt::{DebtRecord, DebtStatus, DebtType};
use crate::model::provision::{
    OccurrenceProbability, ProvisionRecord, ProvisionStatus, ProvisionType,
};
use chrono::{Duration, NaiveDate};
use log::info;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use std::time::Instant;

pub const DEBTOR_POOL_SIZE: usize = 25;
pub const TERM_CHOICES_YEARS: [u32; 6] = [3, 5, 7, 10, 15, 20];

const FIRST_DEBT_NUMBER: usize = 50_000;
const ISSUE_MIN_AGE_DAYS: i64 = 90;
const ISSUE_MAX_AGE_DAYS: i64 = 3_652;
const DEBT_AMOUNT_CENTS: (i64, i64) = (50_000_000, 1_000_000_000);
const MATURED_STATUS_WEIGHTS: [(DebtStatus, u32); 3] = [
    (DebtStatus::Paid, 60),
    (DebtStatus::Defaulted, 20),
    (DebtStatus::Refinanced, 20),
];
const LATE_DEFAULT_PROBABILITY: f64 = 0.02;

const PROVISION_AMOUNT_CENTS: (i64, i64) = (10_000_000, 500_000_000);
const PROVISION_STATUS_WEIGHTS: [(ProvisionStatus, u32); 4] = [
    (ProvisionStatus::Active, 60),
    (ProvisionStatus::Used, 20),
    (ProvisionStatus::Reversed, 10),
    (ProvisionStatus::Adjusted, 10),
];
const PROBABILITY_CHOICES: [OccurrenceProbability; 3] = [
    OccurrenceProbability::High,
    OccurrenceProbability::Medium,
    OccurrenceProbability::Low,
];

/// Seeded generator of liability records relative to one reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSynthesizer {
    seed: u64,
    reference_date: NaiveDate,
}

impl RecordSynthesizer {
    pub fn new(seed: u64, reference_date: NaiveDate) -> Self {
        Self {
            seed,
            reference_date,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Generates `count` debts, sorted by issue date.
    pub fn debts(&self, count: usize) -> Vec<DebtRecord> {
        let started_at = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let pool = debtors::debtor_pool(&mut rng, DEBTOR_POOL_SIZE);
        let today = self.reference_date;

        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let Some(debtor) = pool.choose(&mut rng) else {
                break;
            };
            let debt_type = DebtType::ALL.choose(&mut rng).copied().unwrap_or(DebtType::BankLoan);
            let issue_date =
                today - Duration::days(rng.gen_range(ISSUE_MIN_AGE_DAYS..=ISSUE_MAX_AGE_DAYS));
            let term_years = TERM_CHOICES_YEARS.choose(&mut rng).copied().unwrap_or(5);
            let maturity_date = issue_date + Duration::days(term_days(term_years));
            let original_amount = Decimal::new(
                rng.gen_range(DEBT_AMOUNT_CENTS.0..=DEBT_AMOUNT_CENTS.1),
                2,
            );
            let (rate_min, rate_max) = debt_type.rate_range_bp();
            let annual_rate = Decimal::new(i64::from(rng.gen_range(rate_min..=rate_max)), 4);

            let days_passed = (today - issue_date).num_days();
            let (status, outstanding_balance) = if maturity_date < today {
                let status = MATURED_STATUS_WEIGHTS
                    .choose_weighted(&mut rng, |(_, weight)| *weight)
                    .map_or(DebtStatus::Paid, |(status, _)| *status);
                let balance = if status == DebtStatus::Paid {
                    Decimal::ZERO
                } else {
                    let factor = Decimal::new(rng.gen_range(1_000..=10_000), 4);
                    (original_amount * factor).round_dp(2)
                };
                (status, balance)
            } else {
                let total_days = (maturity_date - issue_date).num_days();
                let balance = amortized_balance(original_amount, days_passed, total_days);
                let status = if rng.gen_bool(LATE_DEFAULT_PROBABILITY) {
                    DebtStatus::Defaulted
                } else {
                    DebtStatus::Active
                };
                (status, balance)
            };

            let accrued_interest = accrued_interest(original_amount, annual_rate, days_passed);

            records.push(DebtRecord {
                id: format!("LTD-{}", FIRST_DEBT_NUMBER + index),
                debtor_id: debtor.id,
                debt_type,
                issue_date,
                maturity_date,
                term_years,
                original_amount,
                annual_rate,
                outstanding_balance,
                accrued_interest,
                status,
                debtor_name: debtor.name.clone(),
                debtor_tax_id: debtor.tax_id.clone(),
            });
        }

        records.sort_by_key(|record| record.issue_date);

        info!(
            "event=synthesize module=synth status=ok kind=debt seed={} count={} duration_ms={}",
            self.seed,
            records.len(),
            started_at.elapsed().as_millis()
        );
        records
    }

    /// Generates `count` provisions in creation order of the stream.
    pub fn provisions(&self, count: usize) -> Vec<ProvisionRecord> {
        let started_at = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let reference = self.reference_date;

        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let provision_type = ProvisionType::ALL
                .choose(&mut rng)
                .copied()
                .unwrap_or(ProvisionType::Warranties);
            let status = PROVISION_STATUS_WEIGHTS
                .choose_weighted(&mut rng, |(_, weight)| *weight)
                .map_or(ProvisionStatus::Active, |(status, _)| *status);
            let creation_date = reference - Duration::days(rng.gen_range(30..=365 * 3));
            let estimated_amount = Decimal::new(
                rng.gen_range(PROVISION_AMOUNT_CENTS.0..=PROVISION_AMOUNT_CENTS.1),
                2,
            );

            let last_review_date =
                (creation_date + Duration::days(rng.gen_range(15..=365))).min(reference);

            let estimated_use_date = if status.expects_future_use() {
                Some(reference + Duration::days(rng.gen_range(30..=365 * 2)))
            } else {
                let planned = creation_date + Duration::days(rng.gen_range(30..=500));
                if planned > reference {
                    Some(reference - Duration::days(rng.gen_range(1..=60)))
                } else {
                    Some(planned)
                }
            };

            let occurrence_probability = PROBABILITY_CHOICES
                .choose(&mut rng)
                .copied()
                .unwrap_or(OccurrenceProbability::Medium);

            records.push(ProvisionRecord {
                id: format!("PRV-{index:04}"),
                provision_type,
                description: format!("Provision for {provision_type} - Event {}", index + 1),
                creation_date,
                estimated_amount,
                occurrence_probability,
                status,
                last_review_date,
                estimated_use_date,
            });
        }

        info!(
            "event=synthesize module=synth status=ok kind=provision seed={} count={} duration_ms={}",
            self.seed,
            records.len(),
            started_at.elapsed().as_millis()
        );
        records
    }
}

/// `⌊term × 365.25⌋` days.
pub fn term_days(term_years: u32) -> i64 {
    i64::from(term_years) * 36_525 / 100
}

/// Straight-line remaining balance, rounded to cents and floored at zero.
pub fn amortized_balance(original: Decimal, days_passed: i64, total_days: i64) -> Decimal {
    if total_days <= 0 {
        return original;
    }
    let elapsed = Decimal::from(days_passed) / Decimal::from(total_days);
    (original * (Decimal::ONE - elapsed))
        .round_dp(2)
        .max(Decimal::ZERO)
}

/// Simple interest accrued since issue, rounded to cents and floored at zero.
pub fn accrued_interest(original: Decimal, annual_rate: Decimal, days_passed: i64) -> Decimal {
    let years = Decimal::from(days_passed) / Decimal::new(36_525, 2);
    (original * annual_rate * years)
        .round_dp(2)
        .max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::{accrued_interest, amortized_balance, term_days};
    use rust_decimal::Decimal;

    #[test]
    fn term_days_floors_quarter_days() {
        assert_eq!(term_days(3), 1095);
        assert_eq!(term_days(5), 1826);
        assert_eq!(term_days(20), 7305);
    }

    #[test]
    fn amortized_balance_floors_at_zero() {
        let original = Decimal::new(1_000_000, 2);
        assert_eq!(amortized_balance(original, 50, 100), Decimal::new(500_000, 2));
        assert_eq!(amortized_balance(original, 150, 100), Decimal::ZERO);
        assert_eq!(amortized_balance(original, 10, 0), original);
    }

    #[test]
    fn accrued_interest_is_never_negative() {
        let original = Decimal::new(100_000_000, 2);
        let rate = Decimal::new(1000, 4);
        assert_eq!(
            accrued_interest(original, rate, 36525 / 100),
            Decimal::new(9_993_155, 2)
        );
        assert_eq!(accrued_interest(original, rate, -10), Decimal::ZERO);
    }
}
