//! Grouped metrics over tabular records.
//!
//! # Responsibility
//! - Sum a decimal field or count records per value of a categorical field.
//! - Attach each group's share of the grand total.
//!
//! # Invariants
//! - Output is ordered by value descending, ties by group label ascending.
//! - Percentages are unrounded; when the grand total is zero every group
//!   gets `0.0`.
//! - Fields are checked against the record schema before any record is
//!   read; a bad field yields `Breakdown::Unavailable`.

use crate::model::schema::{require_groupable, require_summable, MissingColumn, TabularRecord};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// One group of a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedMetric<V> {
    pub group: String,
    pub value: V,
    /// Share of the grand total in `[0, 100]`.
    pub percentage: f64,
}

pub type AmountMetric = AggregatedMetric<Decimal>;
pub type CountMetric = AggregatedMetric<u64>;

/// Breakdown result, or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Breakdown<V> {
    Available(Vec<AggregatedMetric<V>>),
    Unavailable(MissingColumn),
}

impl<V> Breakdown<V> {
    pub fn metrics(&self) -> &[AggregatedMetric<V>] {
        match self {
            Self::Available(metrics) => metrics,
            Self::Unavailable(_) => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn missing(&self) -> Option<&MissingColumn> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(missing) => Some(missing),
        }
    }
}

impl<V> From<Result<Vec<AggregatedMetric<V>>, MissingColumn>> for Breakdown<V> {
    fn from(value: Result<Vec<AggregatedMetric<V>>, MissingColumn>) -> Self {
        match value {
            Ok(metrics) => Self::Available(metrics),
            Err(missing) => Self::Unavailable(missing),
        }
    }
}

/// Sums `amount_field` per distinct `group_field` value.
pub fn sum_by<R: TabularRecord>(
    records: &[R],
    group_field: &str,
    amount_field: &str,
) -> Breakdown<Decimal> {
    try_sum_by(records, group_field, amount_field).into()
}

/// Counts records per distinct `group_field` value.
pub fn count_by<R: TabularRecord>(records: &[R], group_field: &str) -> Breakdown<u64> {
    try_count_by(records, group_field).into()
}

pub fn try_sum_by<R: TabularRecord>(
    records: &[R],
    group_field: &str,
    amount_field: &str,
) -> Result<Vec<AmountMetric>, MissingColumn> {
    require_groupable::<R>(group_field)?;
    require_summable::<R>(amount_field)?;

    let mut groups: BTreeMap<&str, Decimal> = BTreeMap::new();
    for record in records {
        let (Some(group), Some(amount)) =
            (record.category(group_field), record.decimal(amount_field))
        else {
            continue;
        };
        *groups.entry(group).or_insert(Decimal::ZERO) += amount;
    }

    let total: Decimal = groups.values().copied().sum();
    let total = total.to_f64().unwrap_or(0.0);
    let metrics = groups
        .into_iter()
        .map(|(group, value)| AggregatedMetric {
            group: group.to_string(),
            percentage: share(value.to_f64().unwrap_or(0.0), total),
            value,
        })
        .collect();
    Ok(ordered(metrics))
}

pub fn try_count_by<R: TabularRecord>(
    records: &[R],
    group_field: &str,
) -> Result<Vec<CountMetric>, MissingColumn> {
    require_groupable::<R>(group_field)?;

    let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        if let Some(group) = record.category(group_field) {
            *groups.entry(group).or_insert(0) += 1;
        }
    }

    let total = groups.values().sum::<u64>() as f64;
    let metrics = groups
        .into_iter()
        .map(|(group, value)| AggregatedMetric {
            group: group.to_string(),
            value,
            percentage: share(value as f64, total),
        })
        .collect();
    Ok(ordered(metrics))
}

fn share(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

fn ordered<V: Ord>(mut metrics: Vec<AggregatedMetric<V>>) -> Vec<AggregatedMetric<V>> {
    metrics.sort_by(|left, right| {
        right
            .value
            .cmp(&left.value)
            .then_with(|| left.group.cmp(&right.group))
    });
    metrics
}
