use chrono::NaiveDate;
use ncl_core::{
    count_by, sum_by, Breakdown, OccurrenceProbability, ProvisionRecord, ProvisionStatus,
    ProvisionType, RecordKind, RecordSynthesizer,
};
use rust_decimal::Decimal;

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
}

fn zero_provision(id: &str, provision_type: ProvisionType) -> ProvisionRecord {
    ProvisionRecord {
        id: id.to_string(),
        provision_type,
        description: format!("Provision for {provision_type} - Event 1"),
        creation_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        estimated_amount: Decimal::ZERO,
        occurrence_probability: OccurrenceProbability::Low,
        status: ProvisionStatus::Active,
        last_review_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        estimated_use_date: None,
    }
}

#[test]
fn debt_balance_by_type_adds_up_to_the_total() {
    let debts = RecordSynthesizer::new(1011, reference_date()).debts(30);
    let breakdown = sum_by(&debts, "debt_type", "outstanding_balance");
    let metrics = breakdown.metrics();
    assert!(!metrics.is_empty());

    let total: Decimal = debts.iter().map(|debt| debt.outstanding_balance).sum();
    let grouped: Decimal = metrics.iter().map(|metric| metric.value).sum();
    assert_eq!(grouped, total);

    let percent: f64 = metrics.iter().map(|metric| metric.percentage).sum();
    assert!((percent - 100.0).abs() < 0.1, "percentages sum to {percent}");
    assert!(metrics.windows(2).all(|pair| pair[0].value >= pair[1].value));
}

#[test]
fn status_counts_cover_every_record() {
    let provisions = RecordSynthesizer::new(42, reference_date()).provisions(30);
    let breakdown = count_by(&provisions, "status");
    let counted: u64 = breakdown.metrics().iter().map(|metric| metric.value).sum();
    assert_eq!(counted, 30);
    assert!(breakdown
        .metrics()
        .iter()
        .all(|metric| ["Active", "Used", "Reversed", "Adjusted"].contains(&metric.group.as_str())));
}

#[test]
fn aggregation_is_idempotent() {
    let debts = RecordSynthesizer::new(1011, reference_date()).debts(30);
    assert_eq!(
        sum_by(&debts, "debt_type", "outstanding_balance"),
        sum_by(&debts, "debt_type", "outstanding_balance")
    );
    assert_eq!(count_by(&debts, "status"), count_by(&debts, "status"));
}

#[test]
fn unknown_or_unsuitable_fields_are_unavailable() {
    let debts = RecordSynthesizer::new(1011, reference_date()).debts(5);

    let missing = sum_by(&debts, "sector", "outstanding_balance");
    assert!(!missing.is_available());
    let column = missing.missing().unwrap();
    assert_eq!(column.record, RecordKind::Debt);
    assert_eq!(column.field, "sector");

    let not_summable = sum_by(&debts, "debt_type", "status");
    assert_eq!(not_summable.missing().unwrap().field, "status");
    assert!(not_summable.metrics().is_empty());
}

#[test]
fn zero_total_yields_zero_percentages() {
    let provisions = vec![
        zero_provision("PRV-0000", ProvisionType::Litigation),
        zero_provision("PRV-0001", ProvisionType::Warranties),
    ];
    let Breakdown::Available(metrics) =
        sum_by(&provisions, "provision_type", "estimated_amount")
    else {
        panic!("provision_type is groupable");
    };
    assert_eq!(metrics.len(), 2);
    assert!(metrics.iter().all(|metric| metric.percentage == 0.0));
    assert!(metrics.iter().all(|metric| metric.value == Decimal::ZERO));
}

#[test]
fn empty_input_yields_no_groups() {
    let empty: Vec<ProvisionRecord> = Vec::new();
    let breakdown = count_by(&empty, "status");
    assert!(breakdown.is_available());
    assert!(breakdown.metrics().is_empty());
}
