//! Analysis configuration.
//!
//! # Responsibility
//! - Hold the seeds, counts, reference date and detector settings of a run.
//! - Layer overrides: built-in defaults, then `NCL_*` environment
//!   variables, then whatever the caller sets (CLI flags).
//!
//! # Invariants
//! - A config that passed `validate()` always yields a working session.
//! - Parsing never falls back silently: a malformed variable is an error.

use crate::analysis::detector::{AnomalyDetector, DetectorConfig};
use crate::service::session::{AnalysisSession, DatasetSelection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DEBT_SEED: u64 = 1011;
pub const DEFAULT_PROVISION_SEED: u64 = 42;
pub const DEFAULT_DEBT_COUNT: usize = 30;
pub const DEFAULT_PROVISION_COUNT: usize = 30;
pub const DEFAULT_REPORTS_DIR: &str = "data/audit_reports";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const ENV_DEBT_SEED: &str = "NCL_DEBT_SEED";
pub const ENV_PROVISION_SEED: &str = "NCL_PROVISION_SEED";
pub const ENV_DETECTOR_SEED: &str = "NCL_DETECTOR_SEED";
pub const ENV_DEBT_COUNT: &str = "NCL_DEBT_COUNT";
pub const ENV_PROVISION_COUNT: &str = "NCL_PROVISION_COUNT";
pub const ENV_CONTAMINATION: &str = "NCL_CONTAMINATION";
pub const ENV_AS_OF: &str = "NCL_AS_OF";
pub const ENV_REPORTS_DIR: &str = "NCL_REPORTS_DIR";

/// Invalid configuration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Reference date for synthesis and record ages.
    pub as_of: NaiveDate,
    pub datasets: DatasetSelection,
    pub detector: DetectorConfig,
    pub reports_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::with_reference_date(chrono::Local::now().date_naive())
    }
}

impl AnalysisConfig {
    /// Defaults anchored at `as_of`.
    pub fn with_reference_date(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            datasets: DatasetSelection::default(),
            detector: DetectorConfig::default(),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
        }
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(Self::default(), |key| std::env::var(key).ok())
    }

    /// Applies `NCL_*` overrides read through `lookup` on top of `base`.
    pub fn from_lookup<F>(base: Self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base;
        if let Some(value) = parsed(&lookup, ENV_DEBT_SEED)? {
            config.datasets.debt_seed = value;
        }
        if let Some(value) = parsed(&lookup, ENV_PROVISION_SEED)? {
            config.datasets.provision_seed = value;
        }
        if let Some(value) = parsed(&lookup, ENV_DETECTOR_SEED)? {
            config.detector.seed = value;
        }
        if let Some(value) = parsed(&lookup, ENV_DEBT_COUNT)? {
            config.datasets.debt_count = value;
        }
        if let Some(value) = parsed(&lookup, ENV_PROVISION_COUNT)? {
            config.datasets.provision_count = value;
        }
        if let Some(value) = parsed(&lookup, ENV_CONTAMINATION)? {
            config.detector.contamination = value;
        }
        if let Some(raw) = non_empty(&lookup, ENV_AS_OF) {
            config.as_of = parse_date(ENV_AS_OF, &raw)?;
        }
        if let Some(raw) = non_empty(&lookup, ENV_REPORTS_DIR) {
            config.reports_dir = PathBuf::from(raw);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let contamination = self.detector.contamination;
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(ConfigError::invalid(
                "contamination",
                contamination.to_string(),
                "must be in (0, 0.5]",
            ));
        }
        if self.detector.n_trees == 0 {
            return Err(ConfigError::invalid("n_trees", "0", "must be positive"));
        }
        if self.detector.max_samples == 0 {
            return Err(ConfigError::invalid("max_samples", "0", "must be positive"));
        }
        Ok(())
    }

    pub fn detector(&self) -> Result<AnomalyDetector, ConfigError> {
        self.validate()?;
        AnomalyDetector::new(self.detector).map_err(|err| {
            ConfigError::invalid("detector", format!("{:?}", self.detector), err.to_string())
        })
    }

    /// Fresh session for this configuration.
    pub fn session(&self) -> Result<AnalysisSession, ConfigError> {
        Ok(AnalysisSession::new(self.as_of, self.detector()?))
    }
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|err| ConfigError::invalid(key, raw, err.to_string()))
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| ConfigError::invalid(key, raw.as_str(), err.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisConfig, ConfigError, ENV_AS_OF, ENV_CONTAMINATION, ENV_DEBT_SEED};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn base() -> AnalysisConfig {
        AnalysisConfig::with_reference_date(
            NaiveDate::from_ymd_opt(2025, 7, 10).expect("valid date"),
        )
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = base();
        assert_eq!(config.datasets.debt_seed, 1011);
        assert_eq!(config.datasets.provision_seed, 42);
        assert_eq!(config.detector.seed, 42);
        assert_eq!(config.datasets.debt_count, 30);
        assert_eq!(config.datasets.provision_count, 30);
        assert_eq!(config.detector.contamination, 0.10);
        assert_eq!(config.reports_dir.to_str(), Some("data/audit_reports"));
    }

    #[test]
    fn environment_overrides_apply() {
        let config = AnalysisConfig::from_lookup(
            base(),
            lookup(&[
                (ENV_DEBT_SEED, "7"),
                (ENV_AS_OF, "2024-12-31"),
                (ENV_CONTAMINATION, " 0.2 "),
            ]),
        )
        .expect("valid overrides");
        assert_eq!(config.datasets.debt_seed, 7);
        assert_eq!(config.detector.contamination, 0.2);
        assert_eq!(
            config.as_of,
            NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date")
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = AnalysisConfig::from_lookup(base(), lookup(&[(ENV_DEBT_SEED, "abc")]))
            .expect_err("non-numeric seed must fail");
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_DEBT_SEED));

        let err = AnalysisConfig::from_lookup(base(), lookup(&[(ENV_CONTAMINATION, "0.9")]))
            .expect_err("contamination above 0.5 must fail");
        assert!(err.to_string().contains("(0, 0.5]"));
    }
}
