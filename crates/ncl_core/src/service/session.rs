//! Analysis session use-cases.
//!
//! # Responsibility
//! - Cache generated datasets per `(seed, count, kind)` with explicit
//!   invalidation.
//! - Run generation, feature extraction, scoring and aggregation for the
//!   debt and provision panels, the consolidated summary and reports.
//!
//! # Invariants
//! - A cache hit returns the same shared allocation; invalidation forces
//!   regeneration with identical content.
//! - Labels and metrics are recomputed on every call and never stored.
//! - No analysis fails: detector errors become `Scoring::Skipped` and
//!   missing fields become `Breakdown::Unavailable`.

use crate::analysis::aggregate::{count_by, sum_by, Breakdown};
use crate::analysis::detector::{AnomalyDetector, Detection, DetectionError};
use crate::analysis::features::FeatureExtractor;
use crate::config::{
    DEFAULT_DEBT_COUNT, DEFAULT_DEBT_SEED, DEFAULT_PROVISION_COUNT, DEFAULT_PROVISION_SEED,
};
use crate::model::debt::{DebtRecord, DebtType};
use crate::model::provision::{ProvisionRecord, ProvisionStatus, ProvisionType};
use crate::model::RecordKind;
use crate::report::{
    FlaggedRecord, ReportData, ReportSection, SectionTotals, StatusShare, TypeShare,
};
use crate::synth::RecordSynthesizer;
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

/// Cache key of one generated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    pub seed: u64,
    pub count: usize,
    pub kind: RecordKind,
}

impl DatasetKey {
    pub fn debts(seed: u64, count: usize) -> Self {
        Self {
            seed,
            count,
            kind: RecordKind::Debt,
        }
    }

    pub fn provisions(seed: u64, count: usize) -> Self {
        Self {
            seed,
            count,
            kind: RecordKind::Provision,
        }
    }
}

/// Which datasets a panel, summary or report is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSelection {
    pub debt_seed: u64,
    pub debt_count: usize,
    pub provision_seed: u64,
    pub provision_count: usize,
}

impl Default for DatasetSelection {
    fn default() -> Self {
        Self {
            debt_seed: DEFAULT_DEBT_SEED,
            debt_count: DEFAULT_DEBT_COUNT,
            provision_seed: DEFAULT_PROVISION_SEED,
            provision_count: DEFAULT_PROVISION_COUNT,
        }
    }
}

/// Anomaly scoring outcome of one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Scoring {
    Scored(Detection),
    /// Scoring did not run; the panel reports zero anomalies.
    Skipped { reason: String },
}

impl Scoring {
    pub fn anomaly_count(&self) -> usize {
        match self {
            Self::Scored(detection) => detection.outlier_count(),
            Self::Skipped { .. } => 0,
        }
    }

    pub fn detection(&self) -> Option<&Detection> {
        match self {
            Self::Scored(detection) => Some(detection),
            Self::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedDebt {
    pub id: String,
    pub debtor_name: String,
    pub debt_type: DebtType,
    pub outstanding_balance: Decimal,
    pub score: f64,
}

/// Everything the debt panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtAnalysis {
    pub key: DatasetKey,
    pub total_count: usize,
    pub original_total: Decimal,
    pub outstanding_total: Decimal,
    pub accrued_interest_total: Decimal,
    /// Outstanding balance per debt type.
    pub by_type: Breakdown<Decimal>,
    pub by_status: Breakdown<u64>,
    pub scoring: Scoring,
    pub flagged: Vec<FlaggedDebt>,
}

impl DebtAnalysis {
    pub fn anomaly_count(&self) -> usize {
        self.scoring.anomaly_count()
    }

    pub fn report_section(&self) -> ReportSection {
        ReportSection {
            totals: SectionTotals {
                count: self.total_count,
                amount: self.outstanding_total,
            },
            by_type: type_shares(&self.by_type),
            by_status: status_shares(&self.by_status),
            anomaly_count: self.anomaly_count(),
            flagged: self
                .flagged
                .iter()
                .map(|debt| FlaggedRecord {
                    id: debt.id.clone(),
                    label: debt.debt_type.label().to_string(),
                    amount: debt.outstanding_balance,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedProvision {
    pub id: String,
    pub provision_type: ProvisionType,
    pub estimated_amount: Decimal,
    pub status: ProvisionStatus,
    pub score: f64,
}

/// Everything the provision panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionAnalysis {
    pub key: DatasetKey,
    pub total_count: usize,
    pub active_count: usize,
    pub estimated_total: Decimal,
    /// Estimated amount per provision type.
    pub by_type: Breakdown<Decimal>,
    pub by_status: Breakdown<u64>,
    pub scoring: Scoring,
    pub flagged: Vec<FlaggedProvision>,
}

impl ProvisionAnalysis {
    pub fn anomaly_count(&self) -> usize {
        self.scoring.anomaly_count()
    }

    pub fn report_section(&self) -> ReportSection {
        ReportSection {
            totals: SectionTotals {
                count: self.total_count,
                amount: self.estimated_total,
            },
            by_type: type_shares(&self.by_type),
            by_status: status_shares(&self.by_status),
            anomaly_count: self.anomaly_count(),
            flagged: self
                .flagged
                .iter()
                .map(|provision| FlaggedRecord {
                    id: provision.id.clone(),
                    label: provision.provision_type.label().to_string(),
                    amount: provision.estimated_amount,
                })
                .collect(),
        }
    }
}

/// Consolidated non-current liability figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedSummary {
    pub debt_count: usize,
    pub debt_balance: Decimal,
    pub provision_count: usize,
    pub provision_amount: Decimal,
    pub total_count: usize,
    pub total_liability: Decimal,
    /// Share of the total in percent; `0.0` when the total is zero.
    pub debt_share: f64,
    pub provision_share: f64,
}

/// Process-scoped analysis context.
#[derive(Debug)]
pub struct AnalysisSession {
    reference_date: NaiveDate,
    detector: AnomalyDetector,
    debt_cache: HashMap<DatasetKey, Rc<[DebtRecord]>>,
    provision_cache: HashMap<DatasetKey, Rc<[ProvisionRecord]>>,
}

impl AnalysisSession {
    pub fn new(reference_date: NaiveDate, detector: AnomalyDetector) -> Self {
        Self {
            reference_date,
            detector,
            debt_cache: HashMap::new(),
            provision_cache: HashMap::new(),
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    /// Number of cached datasets across both kinds.
    pub fn cached_datasets(&self) -> usize {
        self.debt_cache.len() + self.provision_cache.len()
    }

    /// Debts for `(seed, count)`, generated on first use.
    pub fn debts(&mut self, seed: u64, count: usize) -> Rc<[DebtRecord]> {
        let key = DatasetKey::debts(seed, count);
        if let Some(records) = self.debt_cache.get(&key) {
            log_cache(key, "hit");
            return Rc::clone(records);
        }
        log_cache(key, "miss");
        let records: Rc<[DebtRecord]> = RecordSynthesizer::new(seed, self.reference_date)
            .debts(count)
            .into();
        self.debt_cache.insert(key, Rc::clone(&records));
        records
    }

    /// Provisions for `(seed, count)`, generated on first use.
    pub fn provisions(&mut self, seed: u64, count: usize) -> Rc<[ProvisionRecord]> {
        let key = DatasetKey::provisions(seed, count);
        if let Some(records) = self.provision_cache.get(&key) {
            log_cache(key, "hit");
            return Rc::clone(records);
        }
        log_cache(key, "miss");
        let records: Rc<[ProvisionRecord]> = RecordSynthesizer::new(seed, self.reference_date)
            .provisions(count)
            .into();
        self.provision_cache.insert(key, Rc::clone(&records));
        records
    }

    /// Drops one cached dataset. Returns whether it was cached.
    pub fn invalidate(&mut self, key: DatasetKey) -> bool {
        let removed = match key.kind {
            RecordKind::Debt => self.debt_cache.remove(&key).is_some(),
            RecordKind::Provision => self.provision_cache.remove(&key).is_some(),
        };
        info!(
            "event=cache_invalidate module=session status=ok kind={} seed={} count={} removed={}",
            key.kind, key.seed, key.count, removed
        );
        removed
    }

    /// Drops every cached dataset. Returns how many were dropped.
    pub fn invalidate_all(&mut self) -> usize {
        let dropped = self.cached_datasets();
        self.debt_cache.clear();
        self.provision_cache.clear();
        info!("event=cache_invalidate module=session status=ok scope=all removed={dropped}");
        dropped
    }

    pub fn analyze_debts(&mut self, seed: u64, count: usize) -> DebtAnalysis {
        let started_at = Instant::now();
        let records = self.debts(seed, count);

        let matrix = FeatureExtractor::new(self.reference_date).debts(&records);
        let scoring = scoring_of(self.detector.fit_predict(&matrix));
        let flagged = scoring
            .detection()
            .map(|detection| {
                let by_id: HashMap<&str, &DebtRecord> = records
                    .iter()
                    .map(|record| (record.id.as_str(), record))
                    .collect();
                detection
                    .outliers()
                    .filter_map(|scored| {
                        by_id.get(scored.id.as_str()).map(|record| FlaggedDebt {
                            id: record.id.clone(),
                            debtor_name: record.debtor_name.clone(),
                            debt_type: record.debt_type,
                            outstanding_balance: record.outstanding_balance,
                            score: scored.score,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let analysis = DebtAnalysis {
            key: DatasetKey::debts(seed, count),
            total_count: records.len(),
            original_total: records.iter().map(|record| record.original_amount).sum(),
            outstanding_total: records.iter().map(|record| record.outstanding_balance).sum(),
            accrued_interest_total: records.iter().map(|record| record.accrued_interest).sum(),
            by_type: sum_by(&records[..], "debt_type", "outstanding_balance"),
            by_status: count_by(&records[..], "status"),
            scoring,
            flagged,
        };
        info!(
            "event=analyze module=session status=ok kind=debt seed={} count={} anomalies={} duration_ms={}",
            seed,
            analysis.total_count,
            analysis.anomaly_count(),
            started_at.elapsed().as_millis()
        );
        analysis
    }

    pub fn analyze_provisions(&mut self, seed: u64, count: usize) -> ProvisionAnalysis {
        let started_at = Instant::now();
        let records = self.provisions(seed, count);

        let matrix = FeatureExtractor::new(self.reference_date).provisions(&records);
        let scoring = scoring_of(self.detector.fit_predict(&matrix));
        let flagged = scoring
            .detection()
            .map(|detection| {
                let by_id: HashMap<&str, &ProvisionRecord> = records
                    .iter()
                    .map(|record| (record.id.as_str(), record))
                    .collect();
                detection
                    .outliers()
                    .filter_map(|scored| {
                        by_id.get(scored.id.as_str()).map(|record| FlaggedProvision {
                            id: record.id.clone(),
                            provision_type: record.provision_type,
                            estimated_amount: record.estimated_amount,
                            status: record.status,
                            score: scored.score,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let analysis = ProvisionAnalysis {
            key: DatasetKey::provisions(seed, count),
            total_count: records.len(),
            active_count: records
                .iter()
                .filter(|record| record.status == ProvisionStatus::Active)
                .count(),
            estimated_total: records.iter().map(|record| record.estimated_amount).sum(),
            by_type: sum_by(&records[..], "provision_type", "estimated_amount"),
            by_status: count_by(&records[..], "status"),
            scoring,
            flagged,
        };
        info!(
            "event=analyze module=session status=ok kind=provision seed={} count={} anomalies={} duration_ms={}",
            seed,
            analysis.total_count,
            analysis.anomaly_count(),
            started_at.elapsed().as_millis()
        );
        analysis
    }

    /// Consolidated totals; needs no scoring.
    pub fn consolidated(&mut self, selection: &DatasetSelection) -> ConsolidatedSummary {
        let debts = self.debts(selection.debt_seed, selection.debt_count);
        let provisions = self.provisions(selection.provision_seed, selection.provision_count);

        let debt_balance: Decimal = debts.iter().map(|record| record.outstanding_balance).sum();
        let provision_amount: Decimal =
            provisions.iter().map(|record| record.estimated_amount).sum();
        let total_liability = debt_balance + provision_amount;

        ConsolidatedSummary {
            debt_count: debts.len(),
            debt_balance,
            provision_count: provisions.len(),
            provision_amount,
            total_count: debts.len() + provisions.len(),
            total_liability,
            debt_share: percent_of(debt_balance, total_liability),
            provision_share: percent_of(provision_amount, total_liability),
        }
    }

    /// Builds report input from fresh panel analyses.
    pub fn report_data(
        &mut self,
        selection: &DatasetSelection,
        period_label: impl Into<String>,
        issued_on: NaiveDate,
    ) -> ReportData {
        let debts = self.analyze_debts(selection.debt_seed, selection.debt_count);
        let provisions =
            self.analyze_provisions(selection.provision_seed, selection.provision_count);
        ReportData {
            period_label: period_label.into(),
            issued_on,
            debts: debts.report_section(),
            provisions: provisions.report_section(),
        }
    }
}

fn scoring_of(outcome: Result<Detection, DetectionError>) -> Scoring {
    match outcome {
        Ok(detection) => Scoring::Scored(detection),
        Err(err) => Scoring::Skipped {
            reason: err.to_string(),
        },
    }
}

fn log_cache(key: DatasetKey, outcome: &str) {
    debug!(
        "event=dataset_cache module=session status={} kind={} seed={} count={}",
        outcome, key.kind, key.seed, key.count
    );
}

fn percent_of(part: Decimal, total: Decimal) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (part / total * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}

fn type_shares(breakdown: &Breakdown<Decimal>) -> Vec<TypeShare> {
    breakdown
        .metrics()
        .iter()
        .map(|metric| TypeShare {
            label: metric.group.clone(),
            amount: metric.value,
            percentage: metric.percentage,
        })
        .collect()
}

fn status_shares(breakdown: &Breakdown<u64>) -> Vec<StatusShare> {
    breakdown
        .metrics()
        .iter()
        .map(|metric| StatusShare {
            label: metric.group.clone(),
            count: metric.value,
            percentage: metric.percentage,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{percent_of, Scoring};
    use rust_decimal::Decimal;

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent_of(Decimal::ZERO, Decimal::ZERO), 0.0);
        assert_eq!(percent_of(Decimal::new(1, 0), Decimal::new(4, 0)), 25.0);
    }

    #[test]
    fn skipped_scoring_reports_zero_anomalies() {
        let scoring = Scoring::Skipped {
            reason: "no debt records to score".to_string(),
        };
        assert_eq!(scoring.anomaly_count(), 0);
        assert!(scoring.detection().is_none());
    }
}
