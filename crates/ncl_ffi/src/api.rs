//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose panel-level functions (debts, provisions, consolidated, export,
//!   archive) to Dart via FRB.
//! - Flatten core types into plain DTOs: amounts travel as decimal strings,
//!   dates as `YYYY-MM-DD`.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Generated datasets are cached per thread by `(kind, seed, count)`;
//!   `invalidate_cache` is the only way to force regeneration.

use ncl_core::config::parse_date;
use ncl_core::report::archive::search_text;
use ncl_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AnalysisConfig, AnalysisSession, Breakdown, DatasetKey, ExportService, ReportArchive,
    ReportFormat, Scoring,
};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

const DATE_ARG: &str = "as_of";

thread_local! {
    static SESSION: RefCell<Option<AnalysisSession>> = const { RefCell::new(None) };
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One grouped row of a breakdown chart.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricItem {
    pub group: String,
    /// Amount as a decimal string, or the record count.
    pub value: String,
    pub percentage: f64,
}

/// Record flagged by the anomaly detector.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedItem {
    pub id: String,
    /// Debtor name or provision status.
    pub label: String,
    /// Debt or provision type label.
    pub category: String,
    pub amount: String,
    pub score: f64,
}

/// Response envelope of the debt and provision panels.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelResponse {
    pub ok: bool,
    pub record_count: u32,
    /// Headline amount: outstanding balance or estimated provisions.
    pub total_amount: String,
    pub by_type: Vec<MetricItem>,
    pub by_status: Vec<MetricItem>,
    pub anomaly_count: u32,
    pub flagged: Vec<FlaggedItem>,
    /// Diagnostics: skipped scoring or unavailable breakdowns.
    pub message: String,
}

impl PanelResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_count: 0,
            total_amount: Decimal::ZERO.to_string(),
            by_type: Vec::new(),
            by_status: Vec::new(),
            anomaly_count: 0,
            flagged: Vec::new(),
            message: message.into(),
        }
    }
}

/// Consolidated liability totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedResponse {
    pub ok: bool,
    pub debt_count: u32,
    pub debt_balance: String,
    pub provision_count: u32,
    pub provision_amount: String,
    pub total_count: u32,
    pub total_liability: String,
    pub debt_share: f64,
    pub provision_share: f64,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Written file path on success.
    pub path: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            path: None,
            message: message.into(),
        }
    }
}

/// Archived report listing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem {
    pub file_name: String,
    pub title: String,
    pub fiscal_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportListResponse {
    pub items: Vec<ReportItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSearchResponse {
    pub ok: bool,
    pub pages: u32,
    pub words: u32,
    pub characters: u32,
    pub matches: u32,
    pub highlighted: String,
    pub message: String,
}

impl ReportSearchResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            pages: 0,
            words: 0,
            characters: 0,
            matches: 0,
            highlighted: String::new(),
            message: message.into(),
        }
    }
}

/// Debt panel for `(seed, count)` at reference date `as_of` (`YYYY-MM-DD`).
///
/// # FFI contract
/// - Sync call; first request per `(seed, count)` synthesizes and caches.
/// - Never panics; invalid dates yield `ok=false` with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_panel(as_of: String, seed: u64, count: u32) -> PanelResponse {
    let result = with_session(&as_of, |session| {
        let analysis = session.analyze_debts(seed, count as usize);
        let flagged = analysis
            .flagged
            .iter()
            .map(|debt| FlaggedItem {
                id: debt.id.clone(),
                label: debt.debtor_name.clone(),
                category: debt.debt_type.label().to_string(),
                amount: debt.outstanding_balance.to_string(),
                score: debt.score,
            })
            .collect();
        PanelResponse {
            ok: true,
            record_count: clamp_u32(analysis.total_count),
            total_amount: analysis.outstanding_total.to_string(),
            by_type: amount_items(&analysis.by_type),
            by_status: count_items(&analysis.by_status),
            anomaly_count: clamp_u32(analysis.anomaly_count()),
            flagged,
            message: panel_message(&analysis.scoring, &analysis.by_type),
        }
    });
    result.unwrap_or_else(|err| PanelResponse::failure(format!("debt_panel failed: {err}")))
}

/// Provision panel for `(seed, count)` at reference date `as_of`.
#[flutter_rust_bridge::frb(sync)]
pub fn provision_panel(as_of: String, seed: u64, count: u32) -> PanelResponse {
    let result = with_session(&as_of, |session| {
        let analysis = session.analyze_provisions(seed, count as usize);
        let flagged = analysis
            .flagged
            .iter()
            .map(|provision| FlaggedItem {
                id: provision.id.clone(),
                label: provision.status.label().to_string(),
                category: provision.provision_type.label().to_string(),
                amount: provision.estimated_amount.to_string(),
                score: provision.score,
            })
            .collect();
        PanelResponse {
            ok: true,
            record_count: clamp_u32(analysis.total_count),
            total_amount: analysis.estimated_total.to_string(),
            by_type: amount_items(&analysis.by_type),
            by_status: count_items(&analysis.by_status),
            anomaly_count: clamp_u32(analysis.anomaly_count()),
            flagged,
            message: panel_message(&analysis.scoring, &analysis.by_type),
        }
    });
    result.unwrap_or_else(|err| PanelResponse::failure(format!("provision_panel failed: {err}")))
}

/// Consolidated debt plus provision totals; no anomaly scoring.
#[flutter_rust_bridge::frb(sync)]
pub fn consolidated_panel(
    as_of: String,
    debt_seed: u64,
    debt_count: u32,
    provision_seed: u64,
    provision_count: u32,
) -> ConsolidatedResponse {
    let result = with_session(&as_of, |session| {
        let mut config = AnalysisConfig::with_reference_date(session.reference_date());
        config.datasets.debt_seed = debt_seed;
        config.datasets.debt_count = debt_count as usize;
        config.datasets.provision_seed = provision_seed;
        config.datasets.provision_count = provision_count as usize;
        session.consolidated(&config.datasets)
    });
    match result {
        Ok(summary) => ConsolidatedResponse {
            ok: true,
            debt_count: clamp_u32(summary.debt_count),
            debt_balance: summary.debt_balance.to_string(),
            provision_count: clamp_u32(summary.provision_count),
            provision_amount: summary.provision_amount.to_string(),
            total_count: clamp_u32(summary.total_count),
            total_liability: summary.total_liability.to_string(),
            debt_share: summary.debt_share,
            provision_share: summary.provision_share,
            message: String::new(),
        },
        Err(err) => ConsolidatedResponse {
            ok: false,
            debt_count: 0,
            debt_balance: Decimal::ZERO.to_string(),
            provision_count: 0,
            provision_amount: Decimal::ZERO.to_string(),
            total_count: 0,
            total_liability: Decimal::ZERO.to_string(),
            debt_share: 0.0,
            provision_share: 0.0,
            message: format!("consolidated_panel failed: {err}"),
        },
    }
}

/// Renders the audit report for the default selection to `path`.
///
/// Input semantics:
/// - `format`: `pdf` or `docx` (`word` accepted).
/// - `period_label`: cover label; empty means `Fiscal Year <as_of year>`.
#[flutter_rust_bridge::frb(sync)]
pub fn export_report(
    as_of: String,
    format: String,
    path: String,
    period_label: String,
) -> ActionResponse {
    let Some(format) = ReportFormat::parse(&format) else {
        return ActionResponse::failure(format!(
            "export_report failed: unknown format `{format}`; expected pdf|docx"
        ));
    };
    let result = with_session(&as_of, |session| {
        let issued_on = session.reference_date();
        let label = if period_label.trim().is_empty() {
            format!("Fiscal Year {}", issued_on.format("%Y"))
        } else {
            period_label.trim().to_string()
        };
        let selection = AnalysisConfig::with_reference_date(issued_on).datasets;
        session.report_data(&selection, label, issued_on)
    });
    let data = match result {
        Ok(data) => data,
        Err(err) => return ActionResponse::failure(format!("export_report failed: {err}")),
    };

    let outcome = ExportService::new().export(format, &data, Path::new(path.trim()));
    ActionResponse {
        ok: outcome.is_success(),
        path: outcome.path.map(|path| path.display().to_string()),
        message: outcome.message,
    }
}

/// Lists archived PDF reports in `reports_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn list_reports(reports_dir: String) -> ReportListResponse {
    let listing = ReportArchive::open(PathBuf::from(reports_dir.trim()))
        .and_then(|archive| archive.list());
    match listing {
        Ok(reports) => {
            let items = reports
                .into_iter()
                .map(|report| ReportItem {
                    file_name: report.file_name,
                    title: report.title,
                    fiscal_year: report.fiscal_year,
                })
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No archived reports.".to_string()
            } else {
                format!("Found {} report(s).", items.len())
            };
            ReportListResponse { items, message }
        }
        Err(err) => ReportListResponse {
            items: Vec::new(),
            message: format!("list_reports failed: {err}"),
        },
    }
}

/// Extracts one archived report and searches it for `term`.
///
/// An empty `term` returns text statistics with zero matches.
#[flutter_rust_bridge::frb(sync)]
pub fn search_report(
    reports_dir: String,
    file_name: String,
    term: String,
    case_insensitive: bool,
) -> ReportSearchResponse {
    let extracted = ReportArchive::open(PathBuf::from(reports_dir.trim()))
        .and_then(|archive| archive.extract(file_name.trim()));
    let text = match extracted {
        Ok(text) => text,
        Err(err) => {
            return ReportSearchResponse::failure(format!("search_report failed: {err}"));
        }
    };

    let stats = text.stats();
    let result = search_text(&text.full_text(), term.trim(), case_insensitive);
    ReportSearchResponse {
        ok: true,
        pages: clamp_u32(stats.pages),
        words: clamp_u32(stats.words),
        characters: clamp_u32(stats.characters),
        matches: clamp_u32(result.matches),
        highlighted: result.highlighted,
        message: format!("{} match(es).", result.matches),
    }
}

/// Drops cached datasets; `kind` is `debt`, `provision` or empty for all.
///
/// Returns the number of datasets removed.
#[flutter_rust_bridge::frb(sync)]
pub fn invalidate_cache(kind: String, seed: u64, count: u32) -> u32 {
    SESSION.with(|cell| {
        let mut slot = cell.borrow_mut();
        let Some(session) = slot.as_mut() else {
            return 0;
        };
        match kind.trim() {
            "debt" => u32::from(session.invalidate(DatasetKey::debts(seed, count as usize))),
            "provision" => {
                u32::from(session.invalidate(DatasetKey::provisions(seed, count as usize)))
            }
            _ => clamp_u32(session.invalidate_all()),
        }
    })
}

/// Runs `f` on this thread's session, replacing it when `as_of` changes.
fn with_session<T>(
    as_of: &str,
    f: impl FnOnce(&mut AnalysisSession) -> T,
) -> Result<T, String> {
    let as_of = parse_date(DATE_ARG, as_of).map_err(|err| err.to_string())?;
    SESSION.with(|cell| {
        let mut slot = cell.borrow_mut();
        let stale = slot
            .as_ref()
            .map_or(true, |session| session.reference_date() != as_of);
        if stale {
            let session = AnalysisConfig::with_reference_date(as_of)
                .session()
                .map_err(|err| err.to_string())?;
            *slot = Some(session);
        }
        match slot.as_mut() {
            Some(session) => Ok(f(session)),
            None => Err("analysis session unavailable".to_string()),
        }
    })
}

fn amount_items(breakdown: &Breakdown<Decimal>) -> Vec<MetricItem> {
    breakdown
        .metrics()
        .iter()
        .map(|metric| MetricItem {
            group: metric.group.clone(),
            value: metric.value.to_string(),
            percentage: metric.percentage,
        })
        .collect()
}

fn count_items(breakdown: &Breakdown<u64>) -> Vec<MetricItem> {
    breakdown
        .metrics()
        .iter()
        .map(|metric| MetricItem {
            group: metric.group.clone(),
            value: metric.value.to_string(),
            percentage: metric.percentage,
        })
        .collect()
}

fn panel_message(scoring: &Scoring, by_type: &Breakdown<Decimal>) -> String {
    let mut notes = Vec::new();
    if let Scoring::Skipped { reason } = scoring {
        notes.push(format!("scoring skipped: {reason}"));
    }
    if let Some(missing) = by_type.missing() {
        notes.push(format!("breakdown unavailable: {missing}"));
    }
    notes.join("; ")
}

fn clamp_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        consolidated_panel, core_version, debt_panel, export_report, init_logging,
        invalidate_cache, list_reports, ping, provision_panel, search_report,
    };

    const AS_OF: &str = "2025-07-10";

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn debt_panel_is_stable_across_calls() {
        let first = debt_panel(AS_OF.to_string(), 1011, 30);
        assert!(first.ok, "{}", first.message);
        assert_eq!(first.record_count, 30);
        assert_eq!(first.flagged.len(), first.anomaly_count as usize);

        let second = debt_panel(AS_OF.to_string(), 1011, 30);
        assert_eq!(second.total_amount, first.total_amount);
        assert_eq!(second.by_type, first.by_type);
    }

    #[test]
    fn invalid_date_fails_without_panicking() {
        let response = provision_panel("10/07/2025".to_string(), 42, 30);
        assert!(!response.ok);
        assert!(response.message.contains("provision_panel failed"));
    }

    #[test]
    fn empty_provision_panel_reports_skipped_scoring() {
        let response = provision_panel(AS_OF.to_string(), 42, 0);
        assert!(response.ok);
        assert_eq!(response.record_count, 0);
        assert_eq!(response.anomaly_count, 0);
        assert!(response.message.contains("scoring skipped"));
    }

    #[test]
    fn consolidated_shares_add_up() {
        let response = consolidated_panel(AS_OF.to_string(), 1011, 30, 42, 30);
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.total_count, 60);
        assert!((response.debt_share + response.provision_share - 100.0).abs() < 1e-6);
    }

    #[test]
    fn invalidate_cache_counts_removed_datasets() {
        debt_panel(AS_OF.to_string(), 7, 5);
        assert_eq!(invalidate_cache("debt".to_string(), 7, 5), 1);
        assert_eq!(invalidate_cache("debt".to_string(), 7, 5), 0);
    }

    #[test]
    fn export_rejects_unknown_format_and_bad_path() {
        let unknown = export_report(
            AS_OF.to_string(),
            "xlsx".to_string(),
            "report.xlsx".to_string(),
            String::new(),
        );
        assert!(!unknown.ok);

        let unwritable = export_report(
            AS_OF.to_string(),
            "pdf".to_string(),
            "/nonexistent/ncl/report.pdf".to_string(),
            String::new(),
        );
        assert!(!unwritable.ok);
        assert!(unwritable.path.is_none());
    }

    #[test]
    fn exported_pdf_is_listed_in_the_archive() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("audit_report_2025.pdf");
        let response = export_report(
            AS_OF.to_string(),
            "pdf".to_string(),
            target.display().to_string(),
            String::new(),
        );
        assert!(response.ok, "{}", response.message);

        let listing = list_reports(dir.path().display().to_string());
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].fiscal_year, Some(2025));
    }

    #[test]
    fn missing_archive_reports_failure() {
        let listing = list_reports("/nonexistent/ncl/reports".to_string());
        assert!(listing.items.is_empty());
        assert!(listing.message.contains("list_reports failed"));

        let search = search_report(
            "/nonexistent/ncl/reports".to_string(),
            "audit_report_2025.pdf".to_string(),
            "debt".to_string(),
            true,
        );
        assert!(!search.ok);
    }
}
