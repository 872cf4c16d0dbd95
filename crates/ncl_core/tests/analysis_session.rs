use chrono::NaiveDate;
use ncl_core::{
    AnalysisConfig, AnalysisSession, AnomalyDetector, DatasetKey, DatasetSelection,
    RecordSynthesizer, Scoring,
};
use rust_decimal::Decimal;
use std::rc::Rc;

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
}

fn session() -> AnalysisSession {
    AnalysisSession::new(reference_date(), AnomalyDetector::default())
}

#[test]
fn repeated_requests_reuse_the_cached_dataset() {
    let mut session = session();
    let first = session.debts(1011, 30);
    let second = session.debts(1011, 30);
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(session.cached_datasets(), 1);

    let other = session.debts(1011, 31);
    assert!(!Rc::ptr_eq(&first, &other));
    assert_eq!(session.cached_datasets(), 2);
}

#[test]
fn cached_content_matches_fresh_synthesis() {
    let mut session = session();
    let cached = session.provisions(42, 30);
    let fresh = RecordSynthesizer::new(42, reference_date()).provisions(30);
    assert_eq!(&cached[..], &fresh[..]);
}

#[test]
fn invalidation_regenerates_identical_records() {
    let mut session = session();
    let before = session.debts(1011, 30);

    assert!(session.invalidate(DatasetKey::debts(1011, 30)));
    assert!(!session.invalidate(DatasetKey::debts(1011, 30)));
    let after = session.debts(1011, 30);

    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(&before[..], &after[..]);

    session.provisions(42, 30);
    assert_eq!(session.invalidate_all(), 2);
    assert_eq!(session.cached_datasets(), 0);
}

#[test]
fn debt_panel_totals_match_the_records() {
    let mut session = session();
    let analysis = session.analyze_debts(1011, 30);
    let records = session.debts(1011, 30);

    assert_eq!(analysis.total_count, 30);
    let outstanding: Decimal = records.iter().map(|debt| debt.outstanding_balance).sum();
    assert_eq!(analysis.outstanding_total, outstanding);
    assert!(analysis.by_type.is_available());
    assert_eq!(analysis.flagged.len(), analysis.anomaly_count());
    assert!(analysis
        .flagged
        .iter()
        .all(|flagged| records.iter().any(|debt| debt.id == flagged.id)));
}

#[test]
fn empty_provision_panel_is_skipped_not_failed() {
    let mut session = session();
    let analysis = session.analyze_provisions(42, 0);

    assert_eq!(analysis.total_count, 0);
    assert_eq!(analysis.estimated_total, Decimal::ZERO);
    assert!(matches!(analysis.scoring, Scoring::Skipped { .. }));
    assert_eq!(analysis.anomaly_count(), 0);
    assert!(analysis.by_type.metrics().is_empty());
}

#[test]
fn consolidated_shares_split_the_total() {
    let mut session = session();
    let summary = session.consolidated(&DatasetSelection::default());

    assert_eq!(summary.debt_count, 30);
    assert_eq!(summary.provision_count, 30);
    assert_eq!(summary.total_count, 60);
    assert_eq!(
        summary.total_liability,
        summary.debt_balance + summary.provision_amount
    );
    assert!((summary.debt_share + summary.provision_share - 100.0).abs() < 1e-6);
}

#[test]
fn report_data_mirrors_both_panels() {
    let mut session = session();
    let selection = DatasetSelection::default();
    let data = session.report_data(&selection, "Fiscal Year 2025", reference_date());

    assert_eq!(data.period_label, "Fiscal Year 2025");
    assert_eq!(data.total_records(), 60);
    let debts = session.analyze_debts(selection.debt_seed, selection.debt_count);
    assert_eq!(data.debts.totals.amount, debts.outstanding_total);
    assert_eq!(data.debts.anomaly_count, debts.anomaly_count());
    assert_eq!(data.debts.flagged, debts.report_section().flagged);
    assert_eq!(data.debts.flagged.len(), data.debts.anomaly_count);
}

#[test]
fn config_builds_a_session_with_its_reference_date() {
    let config = AnalysisConfig::with_reference_date(reference_date());
    let session = config.session().unwrap();
    assert_eq!(session.reference_date(), reference_date());
    assert_eq!(session.cached_datasets(), 0);
}
