//! Core of the non-current liability audit toolkit.
//! Synthesis, anomaly scoring, grouped metrics and report rendering live here;
//! the CLI and FFI crates only adapt these APIs.

pub mod analysis;
pub mod config;
pub mod logging;
pub mod model;
pub mod report;
pub mod service;
pub mod synth;

pub use analysis::{
    count_by, sum_by, AggregatedMetric, AmountMetric, AnomalyDetector, AnomalyLabel, Breakdown,
    CountMetric, Detection, DetectionError, DetectorConfig, FeatureExtractor, FeatureMatrix,
};
pub use config::{AnalysisConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::debt::{DebtRecord, DebtStatus, DebtType};
pub use model::provision::{
    OccurrenceProbability, ProvisionRecord, ProvisionStatus, ProvisionType,
};
pub use model::schema::{FieldDef, FieldKind, MissingColumn, TabularRecord};
pub use model::RecordKind;
pub use report::{
    ArchiveError, ArchivedReport, RenderError, ReportArchive, ReportData, ReportFormat,
    ReportRenderer, ReportSection,
};
pub use service::export_service::{ExportOutcome, ExportService};
pub use service::session::{
    AnalysisSession, ConsolidatedSummary, DatasetKey, DatasetSelection, DebtAnalysis,
    ProvisionAnalysis, Scoring,
};
pub use synth::RecordSynthesizer;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
