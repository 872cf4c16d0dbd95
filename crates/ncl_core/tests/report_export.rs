use chrono::NaiveDate;
use ncl_core::{
    AnalysisSession, AnomalyDetector, DatasetSelection, ExportService, ReportData, ReportFormat,
};
use std::path::Path;

fn sample_report() -> ReportData {
    let as_of = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let mut session = AnalysisSession::new(as_of, AnomalyDetector::default());
    session.report_data(&DatasetSelection::default(), "Fiscal Year 2024", as_of)
}

#[test]
fn pdf_export_writes_a_pdf_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.pdf");

    let outcome = ExportService::new().export(ReportFormat::Pdf, &sample_report(), &path);

    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(outcome.path.as_deref(), Some(path.as_path()));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn docx_export_writes_a_zip_package() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.docx");

    let outcome = ExportService::new().export(ReportFormat::Docx, &sample_report(), &path);

    assert!(outcome.is_success(), "{}", outcome.message);
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn unwritable_target_reports_failure_without_a_path() {
    let data = sample_report();
    let target = Path::new("/nonexistent/ncl/audit/report.pdf");

    for format in [ReportFormat::Pdf, ReportFormat::Docx] {
        let outcome = ExportService::new().export(format, &data, target);
        assert!(!outcome.is_success());
        assert!(outcome.path.is_none());
        assert!(!outcome.message.is_empty());
    }
    assert!(!target.exists());
}

#[test]
fn empty_sections_still_render() {
    let as_of = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let mut session = AnalysisSession::new(as_of, AnomalyDetector::default());
    let selection = DatasetSelection {
        debt_count: 0,
        provision_count: 0,
        ..DatasetSelection::default()
    };
    let data = session.report_data(&selection, "Empty Period", as_of);
    assert_eq!(data.total_records(), 0);

    let dir = tempfile::tempdir().unwrap();
    let outcome = ExportService::new().export(ReportFormat::Pdf, &data, &dir.path().join("empty.pdf"));
    assert!(outcome.is_success(), "{}", outcome.message);
}

#[test]
fn report_data_serializes_sections_by_name() {
    let value = serde_json::to_value(sample_report()).unwrap();
    assert_eq!(value["period_label"], "Fiscal Year 2024");
    assert_eq!(value["issued_on"], "2024-12-31");
    assert_eq!(value["debts"]["totals"]["count"], 30);
    assert!(value["provisions"]["by_status"].is_array());
}
