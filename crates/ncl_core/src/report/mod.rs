//! Audit report rendering.
//!
//! # Responsibility
//! - Define the `ReportData` input shared by every output format.
//! - Build one document block list from the data and hand it to a format
//!   backend behind `ReportRenderer`.
//!
//! # Invariants
//! - Renderers never panic on valid data; every failure is a `RenderError`.
//! - A renderer either writes the whole file or reports an error.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub mod archive;
pub mod content;
pub mod docx;
pub mod format;
pub mod pdf;

pub use archive::{
    ArchiveError, ArchivedReport, ExtractedText, ReportArchive, SearchResult, TextStats,
};
pub use docx::DocxReportRenderer;
pub use pdf::PdfReportRenderer;

/// Output format of an exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Pdf,
    Docx,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// Parses `pdf` / `docx` (case-insensitive); `word` is accepted as an alias.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "word" => Some(Self::Docx),
            _ => None,
        }
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Count and amount headline of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTotals {
    pub count: usize,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeShare {
    pub label: String,
    pub amount: Decimal,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusShare {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

/// A record the detector flagged for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedRecord {
    pub id: String,
    pub label: String,
    pub amount: Decimal,
}

/// Per-kind content of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub totals: SectionTotals,
    pub by_type: Vec<TypeShare>,
    pub by_status: Vec<StatusShare>,
    pub anomaly_count: usize,
    pub flagged: Vec<FlaggedRecord>,
}

impl ReportSection {
    pub fn empty() -> Self {
        Self {
            totals: SectionTotals {
                count: 0,
                amount: Decimal::ZERO,
            },
            by_type: Vec::new(),
            by_status: Vec::new(),
            anomaly_count: 0,
            flagged: Vec::new(),
        }
    }

    pub fn flagged_amount(&self) -> Decimal {
        self.flagged.iter().map(|record| record.amount).sum()
    }
}

/// Everything a renderer needs to produce one audit report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub period_label: String,
    pub issued_on: NaiveDate,
    pub debts: ReportSection,
    pub provisions: ReportSection,
}

impl ReportData {
    pub fn total_records(&self) -> usize {
        self.debts.totals.count + self.provisions.totals.count
    }

    pub fn total_liability(&self) -> Decimal {
        self.debts.totals.amount + self.provisions.totals.amount
    }

    pub fn total_anomalies(&self) -> usize {
        self.debts.anomaly_count + self.provisions.anomaly_count
    }
}

/// Rendering failure.
#[derive(Debug)]
pub enum RenderError {
    /// Target file could not be created or written.
    Io(std::io::Error),
    /// The document backend rejected the content.
    Backend(String),
    /// Target path cannot hold a report file.
    InvalidPath(String),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "report write failed: {err}"),
            Self::Backend(message) => write!(f, "report backend failed: {message}"),
            Self::InvalidPath(message) => write!(f, "invalid report path: {message}"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub type RenderResult<T> = Result<T, RenderError>;

/// One output format backend.
pub trait ReportRenderer {
    fn format(&self) -> ReportFormat;

    /// Writes the full report for `data` to `path`.
    fn render(&self, data: &ReportData, path: &Path) -> RenderResult<()>;
}

/// Returns the backend for `format`.
pub fn renderer_for(format: ReportFormat) -> Box<dyn ReportRenderer> {
    match format {
        ReportFormat::Pdf => Box::new(PdfReportRenderer::default()),
        ReportFormat::Docx => Box::new(DocxReportRenderer),
    }
}

/// Rejects paths without a file name or whose parent directory is missing.
pub(crate) fn check_target(path: &Path) -> RenderResult<()> {
    if path.file_name().is_none() {
        return Err(RenderError::InvalidPath(format!(
            "`{}` has no file name",
            path.display()
        )));
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(RenderError::InvalidPath(format!(
                "directory `{}` does not exist",
                parent.display()
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{check_target, RenderError, ReportFormat};
    use std::path::Path;

    #[test]
    fn format_parse_accepts_aliases() {
        assert_eq!(ReportFormat::parse("PDF"), Some(ReportFormat::Pdf));
        assert_eq!(ReportFormat::parse(" word "), Some(ReportFormat::Docx));
        assert_eq!(ReportFormat::parse("xlsx"), None);
    }

    #[test]
    fn check_target_rejects_missing_parent() {
        let err = check_target(Path::new("/definitely/not/here/report.pdf"))
            .expect_err("missing parent must fail");
        assert!(matches!(err, RenderError::InvalidPath(_)));
        check_target(Path::new("report.pdf")).expect("bare file name is accepted");
    }
}
