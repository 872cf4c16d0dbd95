//! Feature extraction, outlier detection and grouped metrics.

pub mod aggregate;
pub mod detector;
pub mod features;
pub mod forest;

pub use aggregate::{count_by, sum_by, AggregatedMetric, AmountMetric, Breakdown, CountMetric};
pub use detector::{
    AnomalyDetector, AnomalyLabel, Detection, DetectionError, DetectorConfig, ScoredRecord,
};
pub use features::{FeatureExtractor, FeatureMatrix, FeatureRow};
