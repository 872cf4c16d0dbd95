use chrono::NaiveDate;
use ncl_core::{AnalysisConfig, ArchiveError, ReportArchive};

fn config() -> AnalysisConfig {
    AnalysisConfig::with_reference_date(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap())
}

#[test]
fn opening_a_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("audit_reports");
    let err = ReportArchive::open(&missing).unwrap_err();
    assert!(matches!(err, ArchiveError::MissingDirectory(path) if path == missing));
}

#[test]
fn listing_keeps_only_pdf_files_sorted_by_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("audit_report_2023.pdf"), b"%PDF-1.3").unwrap();
    std::fs::write(dir.path().join("audit_report_2021.pdf"), b"%PDF-1.3").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not a report").unwrap();

    let archive = ReportArchive::open(dir.path()).unwrap();
    let reports = archive.list().unwrap();

    let names = reports
        .iter()
        .map(|report| report.file_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["audit_report_2021.pdf", "audit_report_2023.pdf"]);
    assert_eq!(reports[0].title, "Audit Report 2021");
    assert_eq!(reports[0].fiscal_year, Some(2021));
}

#[test]
fn inverted_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let archive = ReportArchive::create(dir.path()).unwrap();
    let err = archive.generate_yearly(2024, 2022, &config()).unwrap_err();
    assert!(matches!(err, ArchiveError::InvalidRange { from: 2024, to: 2022 }));
}

#[test]
fn unknown_and_traversing_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let archive = ReportArchive::create(dir.path()).unwrap();
    assert!(matches!(
        archive.extract("missing.pdf"),
        Err(ArchiveError::UnknownReport(_))
    ));
    assert!(matches!(
        archive.extract("../audit_report_2022.pdf"),
        Err(ArchiveError::UnknownReport(_))
    ));
}

#[test]
fn yearly_reports_are_listed_and_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let archive = ReportArchive::create(dir.path().join("audit_reports")).unwrap();

    let written = archive.generate_yearly(2022, 2023, &config()).unwrap();
    assert_eq!(written.len(), 2);

    let reports = archive.list().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].fiscal_year, Some(2023));
    assert_eq!(reports[1].title, "Audit Report 2023");

    let text = archive.extract("audit_report_2022.pdf").unwrap();
    let stats = text.stats();
    assert!(stats.pages >= 1);
    assert!(stats.words > 0);

    let found = archive.search("audit_report_2022.pdf", "audit", true).unwrap();
    assert!(found.matches >= 1);
    assert!(found.highlighted.contains("**"));
}
