//! Isolation-forest outlier labelling.
//!
//! # Responsibility
//! - Fit an isolation forest on the current feature matrix and score every
//!   row.
//! - Turn scores into inlier/outlier labels with a contamination threshold.
//!
//! # Invariants
//! - The model is refit on every call and never cached.
//! - Fitting is seeded from `DetectorConfig::seed`: the same matrix and
//!   config always yield the same scores and labels.
//! - Empty input is rejected with `DetectionError::EmptyInput`; callers skip
//!   scoring and report zero anomalies.
//! - A row is an outlier only when its score is strictly above the
//!   `(1 - contamination)` score percentile.

use super::features::{FeatureMatrix, FeatureRow};
use super::forest::{ForestOptions, IsolationForest};
use crate::model::RecordKind;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const DEFAULT_CONTAMINATION: f64 = 0.10;
pub const DEFAULT_TREE_COUNT: usize = 100;
pub const DEFAULT_MAX_SAMPLES: usize = 256;
pub const DEFAULT_DETECTOR_SEED: u64 = 42;

/// Per-record verdict; `sign()` keeps the conventional `+1 / -1` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyLabel {
    Inlier,
    Outlier,
}

impl AnomalyLabel {
    pub fn sign(self) -> i8 {
        match self {
            Self::Inlier => 1,
            Self::Outlier => -1,
        }
    }

    pub fn is_outlier(self) -> bool {
        self == Self::Outlier
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Nothing to score after filtering.
    EmptyInput { kind: RecordKind },
    InvalidContamination(f64),
    /// The forest could not be fitted with the given settings.
    Model(String),
}

impl Display for DetectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput { kind } => write!(f, "no {kind} records to score"),
            Self::InvalidContamination(value) => {
                write!(f, "contamination must be in (0, 0.5], got {value}")
            }
            Self::Model(message) => write!(f, "outlier model failed: {message}"),
        }
    }
}

impl Error for DetectionError {}

/// Hyperparameters of the outlier model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Expected share of outliers, in `(0, 0.5]`.
    pub contamination: f64,
    pub n_trees: usize,
    /// Upper bound of rows sampled per tree.
    pub max_samples: usize,
    /// Seed of the forest's sampling and split RNG.
    pub seed: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            n_trees: DEFAULT_TREE_COUNT,
            max_samples: DEFAULT_MAX_SAMPLES,
            seed: DEFAULT_DETECTOR_SEED,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(DetectionError::InvalidContamination(self.contamination));
        }
        if self.n_trees == 0 || self.max_samples == 0 {
            return Err(DetectionError::Model(
                "tree count and sample size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One scored row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub id: String,
    pub features: FeatureRow,
    /// Isolation score in `(0, 1)`; higher is more anomalous.
    pub score: f64,
    pub label: AnomalyLabel,
}

/// Result of one fit-and-label pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub kind: RecordKind,
    pub threshold: f64,
    pub scored: Vec<ScoredRecord>,
}

impl Detection {
    pub fn outlier_count(&self) -> usize {
        self.scored
            .iter()
            .filter(|record| record.label.is_outlier())
            .count()
    }

    pub fn outliers(&self) -> impl Iterator<Item = &ScoredRecord> {
        self.scored.iter().filter(|record| record.label.is_outlier())
    }

    pub fn label_of(&self, id: &str) -> Option<AnomalyLabel> {
        self.scored
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.label)
    }
}

/// Unsupervised outlier detector, refit per dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetector {
    config: DetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Fits the forest on `matrix` and labels each of its rows.
    pub fn fit_predict(&self, matrix: &FeatureMatrix) -> Result<Detection, DetectionError> {
        if matrix.is_empty() {
            warn!(
                "event=detect module=analysis status=skipped kind={} reason=empty_input",
                matrix.kind
            );
            return Err(DetectionError::EmptyInput { kind: matrix.kind });
        }

        let started_at = Instant::now();
        let options = ForestOptions {
            n_trees: self.config.n_trees,
            sample_size: self.config.max_samples.min(matrix.len()),
            seed: self.config.seed,
        };

        let scores = match score_rows(&matrix.rows, &options) {
            Ok(scores) => scores,
            Err(err) => {
                warn!(
                    "event=detect module=analysis status=error kind={} rows={} error={}",
                    matrix.kind,
                    matrix.len(),
                    err
                );
                return Err(err);
            }
        };

        let threshold = percentile(&scores, 100.0 * (1.0 - self.config.contamination));
        let scored = matrix
            .ids
            .iter()
            .zip(matrix.rows.iter())
            .zip(scores)
            .map(|((id, features), score)| ScoredRecord {
                id: id.clone(),
                features: *features,
                score,
                label: if score > threshold {
                    AnomalyLabel::Outlier
                } else {
                    AnomalyLabel::Inlier
                },
            })
            .collect::<Vec<_>>();

        let detection = Detection {
            kind: matrix.kind,
            threshold,
            scored,
        };
        info!(
            "event=detect module=analysis status=ok kind={} seed={} rows={} outliers={} duration_ms={}",
            matrix.kind,
            self.config.seed,
            matrix.len(),
            detection.outlier_count(),
            started_at.elapsed().as_millis()
        );
        Ok(detection)
    }
}

fn score_rows(rows: &[FeatureRow], options: &ForestOptions) -> Result<Vec<f64>, DetectionError> {
    let forest = IsolationForest::fit(rows, options).ok_or_else(|| {
        DetectionError::Model(format!(
            "cannot fit {} trees on {} rows",
            options.n_trees,
            rows.len()
        ))
    })?;
    Ok(rows.iter().map(|row| forest.score(row)).collect())
}

/// Linear-interpolated percentile, `q` in `[0, 100]`.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::{percentile, AnomalyDetector, AnomalyLabel, DetectionError, DetectorConfig};
    use crate::analysis::features::FeatureMatrix;
    use crate::model::RecordKind;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 5.0);
        assert_eq!(percentile(&values, 50.0), 3.0);
        assert!((percentile(&values, 90.0) - 4.6).abs() < 1e-12);
    }

    #[test]
    fn label_signs_follow_convention() {
        assert_eq!(AnomalyLabel::Inlier.sign(), 1);
        assert_eq!(AnomalyLabel::Outlier.sign(), -1);
    }

    #[test]
    fn config_rejects_out_of_range_contamination() {
        let config = DetectorConfig {
            contamination: 0.75,
            ..DetectorConfig::default()
        };
        assert_eq!(
            AnomalyDetector::new(config).unwrap_err(),
            DetectionError::InvalidContamination(0.75)
        );
        let zero = DetectorConfig {
            contamination: 0.0,
            ..DetectorConfig::default()
        };
        assert!(AnomalyDetector::new(zero).is_err());
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let detector = AnomalyDetector::default();
        let matrix = FeatureMatrix {
            kind: RecordKind::Debt,
            ids: Vec::new(),
            rows: Vec::new(),
        };
        assert_eq!(
            detector.fit_predict(&matrix).unwrap_err(),
            DetectionError::EmptyInput {
                kind: RecordKind::Debt
            }
        );
    }
}
