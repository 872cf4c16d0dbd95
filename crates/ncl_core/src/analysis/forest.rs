//! Seeded isolation forest with axis-parallel cuts.
//!
//! # Invariants
//! - All randomness comes from one `ChaCha8Rng` seeded by the caller, so a
//!   fit on the same rows with the same seed yields the same trees.
//! - Scores follow `2^(-E[h(x)] / c(ψ))` and lie in `(0, 1]`; higher is
//!   more anomalous.

use super::features::FEATURE_COUNT;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestOptions {
    pub n_trees: usize,
    /// Rows drawn without replacement per tree; capped at the row count.
    pub sample_size: usize,
    pub seed: u64,
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Fitted ensemble of isolation trees.
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fits `options.n_trees` trees on `rows`. Returns `None` when there is
    /// nothing to fit (no rows or no trees).
    pub fn fit(rows: &[[f64; FEATURE_COUNT]], options: &ForestOptions) -> Option<Self> {
        if rows.is_empty() || options.n_trees == 0 || options.sample_size == 0 {
            return None;
        }
        let sample_size = options.sample_size.min(rows.len());
        let depth_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;
        let mut rng = ChaCha8Rng::seed_from_u64(options.seed);

        let trees = (0..options.n_trees)
            .map(|_| {
                let sample = index::sample(&mut rng, rows.len(), sample_size)
                    .into_iter()
                    .map(|position| rows[position])
                    .collect::<Vec<_>>();
                grow(&mut rng, sample, 0, depth_limit)
            })
            .collect();

        Some(Self { trees, sample_size })
    }

    /// Anomaly score of one row.
    pub fn score(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let normalizer = average_path_length(self.sample_size);
        if normalizer <= 0.0 || self.trees.is_empty() {
            return 0.5;
        }
        let mean_path = self
            .trees
            .iter()
            .map(|tree| path_length(tree, row, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_path / normalizer)
    }
}

fn grow(
    rng: &mut ChaCha8Rng,
    rows: Vec<[f64; FEATURE_COUNT]>,
    depth: usize,
    depth_limit: usize,
) -> Node {
    if depth >= depth_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only columns that still vary can separate the rows.
    let splittable = (0..FEATURE_COUNT)
        .filter_map(|feature| {
            let (low, high) = column_range(&rows, feature);
            (high > low).then_some((feature, low, high))
        })
        .collect::<Vec<_>>();
    if splittable.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, low, high) = splittable[rng.gen_range(0..splittable.len())];
    let value = rng.gen_range(low..high);
    let (left, right): (Vec<_>, Vec<_>) = rows.into_iter().partition(|row| row[feature] < value);

    Node::Split {
        feature,
        value,
        left: Box::new(grow(rng, left, depth + 1, depth_limit)),
        right: Box::new(grow(rng, right, depth + 1, depth_limit)),
    }
}

fn column_range(rows: &[[f64; FEATURE_COUNT]], feature: usize) -> (f64, f64) {
    rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), row| {
        (low.min(row[feature]), high.max(row[feature]))
    })
}

fn path_length(node: &Node, row: &[f64; FEATURE_COUNT], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            value,
            left,
            right,
        } => {
            let next = if row[*feature] < *value { left } else { right };
            path_length(next, row, depth + 1)
        }
    }
}

/// Expected path length `c(n)` of an unsuccessful BST search over `n` rows.
fn average_path_length(size: usize) -> f64 {
    match size {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{average_path_length, ForestOptions, IsolationForest};

    fn rows() -> Vec<[f64; 3]> {
        let mut rows = (0..40)
            .map(|step| {
                let step = f64::from(step);
                [100.0 + step % 7.0, 0.05 + (step % 5.0) / 100.0, 5.0 + step % 3.0]
            })
            .collect::<Vec<_>>();
        rows.push([10_000.0, 0.90, 40.0]);
        rows
    }

    fn options(seed: u64) -> ForestOptions {
        ForestOptions {
            n_trees: 100,
            sample_size: 256,
            seed,
        }
    }

    #[test]
    fn average_path_length_matches_known_values() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.244_770_920_247_3).abs() < 1e-6);
    }

    #[test]
    fn same_seed_yields_same_scores() {
        let rows = rows();
        let first = IsolationForest::fit(&rows, &options(42)).expect("fitted forest");
        let second = IsolationForest::fit(&rows, &options(42)).expect("fitted forest");
        for row in &rows {
            assert_eq!(first.score(row), second.score(row));
        }
    }

    #[test]
    fn isolated_point_scores_highest() {
        let rows = rows();
        let forest = IsolationForest::fit(&rows, &options(7)).expect("fitted forest");
        let outlier = forest.score(&rows[rows.len() - 1]);
        assert!(rows[..rows.len() - 1]
            .iter()
            .all(|row| forest.score(row) < outlier));
        assert!(outlier > 0.5 && outlier <= 1.0);
    }

    #[test]
    fn nothing_to_fit_yields_none() {
        assert!(IsolationForest::fit(&[], &options(1)).is_none());
        let no_trees = ForestOptions {
            n_trees: 0,
            ..options(1)
        };
        assert!(IsolationForest::fit(&rows(), &no_trees).is_none());
    }
}
