//! Archive of previously generated audit reports.
//!
//! # Responsibility
//! - List the PDF reports of one directory with display titles and fiscal
//!   years.
//! - Extract report text page by page and search it.
//! - Fill the archive with one report per fiscal year.
//!
//! # Invariants
//! - A missing directory is an `ArchiveError`, never a panic.
//! - Report names are plain file names; path separators are rejected.
//! - Listing order is file name ascending.

use super::{renderer_for, RenderError, ReportFormat};
use crate::config::{AnalysisConfig, ConfigError};
use crate::service::session::DatasetSelection;
use chrono::NaiveDate;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

static FISCAL_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\d{4})$").expect("valid fiscal year regex"));

const YEARLY_DEBT_BASE: usize = 30;
const YEARLY_DEBT_STEP: usize = 2;
const YEARLY_PROVISION_BASE: usize = 30;
const YEARLY_PROVISION_STEP: usize = 3;

#[derive(Debug)]
pub enum ArchiveError {
    /// Archive directory does not exist.
    MissingDirectory(PathBuf),
    Io(std::io::Error),
    /// Text could not be read from a report file.
    Extract { file: String, message: String },
    /// Name does not denote a report inside the archive.
    UnknownReport(String),
    InvalidRange { from: i32, to: i32 },
    Config(ConfigError),
    /// A yearly report could not be written.
    Render { year: i32, source: RenderError },
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDirectory(path) => {
                write!(f, "report directory not found: {}", path.display())
            }
            Self::Io(err) => write!(f, "report archive io failed: {err}"),
            Self::Extract { file, message } => {
                write!(f, "could not read text from `{file}`: {message}")
            }
            Self::UnknownReport(name) => write!(f, "unknown report: `{name}`"),
            Self::InvalidRange { from, to } => {
                write!(f, "invalid fiscal year range {from}..={to}")
            }
            Self::Config(err) => write!(f, "{err}"),
            Self::Render { year, source } => {
                write!(f, "report for fiscal year {year} failed: {source}")
            }
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Render { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ArchiveError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// One listed report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedReport {
    pub file_name: String,
    pub path: PathBuf,
    /// File stem with underscores as spaces, in title case.
    pub title: String,
    /// Parsed from a trailing `_YYYY` in the file stem.
    pub fiscal_year: Option<i32>,
}

/// Word, character and page counts of extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub pages: usize,
}

/// Text of one report, one entry per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub pages: Vec<String>,
}

impl ExtractedText {
    pub fn full_text(&self) -> String {
        self.pages.join("\n")
    }

    pub fn stats(&self) -> TextStats {
        let text = self.full_text();
        TextStats {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
            pages: self.pages.len(),
        }
    }
}

/// Occurrences of a term and the text with every occurrence highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub term: String,
    pub matches: usize,
    /// Input text with each match wrapped as `**match**`.
    pub highlighted: String,
}

/// Counts and highlights literal occurrences of `term` in `text`.
pub fn search_text(text: &str, term: &str, case_insensitive: bool) -> SearchResult {
    let unchanged = || SearchResult {
        term: term.to_string(),
        matches: 0,
        highlighted: text.to_string(),
    };
    if term.is_empty() {
        return unchanged();
    }
    let Ok(pattern) = RegexBuilder::new(&regex::escape(term))
        .case_insensitive(case_insensitive)
        .build()
    else {
        return unchanged();
    };

    SearchResult {
        term: term.to_string(),
        matches: pattern.find_iter(text).count(),
        highlighted: pattern.replace_all(text, "**$0**").into_owned(),
    }
}

/// Display title for a report file name.
pub fn display_title(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".pdf").unwrap_or(file_name);
    stem.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fiscal year from a trailing `_YYYY` of the file stem.
pub fn fiscal_year(file_name: &str) -> Option<i32> {
    let stem = file_name.strip_suffix(".pdf").unwrap_or(file_name);
    FISCAL_YEAR_RE
        .captures(stem)
        .and_then(|captures| captures.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

/// File name of the archived report for `year`.
pub fn yearly_file_name(year: i32) -> String {
    format!("audit_report_{year}.pdf")
}

/// Dataset sizes and seeds for the report of `year` in a range starting at
/// `from`.
pub fn yearly_selection(base: &DatasetSelection, from: i32, year: i32) -> DatasetSelection {
    let offset = usize::try_from(year - from).unwrap_or(0);
    let year_seed = u64::try_from(year).unwrap_or(0);
    DatasetSelection {
        debt_seed: base.debt_seed.wrapping_add(year_seed),
        debt_count: YEARLY_DEBT_BASE + YEARLY_DEBT_STEP * offset,
        provision_seed: base.provision_seed.wrapping_add(year_seed),
        provision_count: YEARLY_PROVISION_BASE + YEARLY_PROVISION_STEP * offset,
    }
}

/// Directory of archived PDF reports.
#[derive(Debug, Clone)]
pub struct ReportArchive {
    dir: PathBuf,
}

impl ReportArchive {
    /// Opens an existing archive directory.
    pub fn open(dir: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ArchiveError::MissingDirectory(dir));
        }
        Ok(Self { dir })
    }

    /// Opens the archive, creating the directory when needed.
    pub fn create(dir: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists `.pdf` files sorted by name.
    pub fn list(&self) -> ArchiveResult<Vec<ArchivedReport>> {
        let mut reports = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if !file_name.ends_with(".pdf") || !entry.file_type()?.is_file() {
                continue;
            }
            reports.push(ArchivedReport {
                title: display_title(&file_name),
                fiscal_year: fiscal_year(&file_name),
                path: entry.path(),
                file_name,
            });
        }
        reports.sort_by(|left, right| left.file_name.cmp(&right.file_name));
        Ok(reports)
    }

    /// Extracts per-page text of one archived report.
    pub fn extract(&self, file_name: &str) -> ArchiveResult<ExtractedText> {
        let path = self.resolve(file_name)?;
        let started_at = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_by_pages(&path)
        }));
        let pages = match outcome {
            Ok(Ok(pages)) => pages,
            Ok(Err(err)) => {
                return Err(self.extract_failed(file_name, err.to_string()));
            }
            Err(_) => {
                return Err(self.extract_failed(file_name, "text extractor aborted".to_string()));
            }
        };

        info!(
            "event=extract module=archive status=ok file={} pages={} duration_ms={}",
            file_name,
            pages.len(),
            started_at.elapsed().as_millis()
        );
        Ok(ExtractedText { pages })
    }

    /// Extracts one report and searches its text.
    pub fn search(
        &self,
        file_name: &str,
        term: &str,
        case_insensitive: bool,
    ) -> ArchiveResult<SearchResult> {
        let text = self.extract(file_name)?.full_text();
        Ok(search_text(&text, term, case_insensitive))
    }

    /// Writes one report per fiscal year in `from..=to`.
    ///
    /// Each year runs a fresh analysis with reference date December 31 of
    /// that year and datasets that grow with the distance from `from`.
    pub fn generate_yearly(
        &self,
        from: i32,
        to: i32,
        config: &AnalysisConfig,
    ) -> ArchiveResult<Vec<PathBuf>> {
        if from > to {
            return Err(ArchiveError::InvalidRange { from, to });
        }
        let started_at = Instant::now();
        let renderer = renderer_for(ReportFormat::Pdf);
        let mut written = Vec::new();

        for year in from..=to {
            let as_of = NaiveDate::from_ymd_opt(year, 12, 31)
                .ok_or(ArchiveError::InvalidRange { from, to })?;
            let mut year_config = config.clone();
            year_config.as_of = as_of;
            let mut session = year_config.session()?;

            let selection = yearly_selection(&config.datasets, from, year);
            let data = session.report_data(&selection, format!("Fiscal Year {year}"), as_of);
            let path = self.dir.join(yearly_file_name(year));
            renderer
                .render(&data, &path)
                .map_err(|source| ArchiveError::Render { year, source })?;
            written.push(path);
        }

        info!(
            "event=archive_generate module=archive status=ok from={} to={} reports={} duration_ms={}",
            from,
            to,
            written.len(),
            started_at.elapsed().as_millis()
        );
        Ok(written)
    }

    fn resolve(&self, file_name: &str) -> ArchiveResult<PathBuf> {
        let plain = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == file_name);
        if !plain {
            return Err(ArchiveError::UnknownReport(file_name.to_string()));
        }
        let path = self.dir.join(file_name);
        if !path.is_file() {
            return Err(ArchiveError::UnknownReport(file_name.to_string()));
        }
        Ok(path)
    }

    fn extract_failed(&self, file_name: &str, message: String) -> ArchiveError {
        warn!(
            "event=extract module=archive status=error file={} error={}",
            file_name, message
        );
        ArchiveError::Extract {
            file: file_name.to_string(),
            message,
        }
    }
}
