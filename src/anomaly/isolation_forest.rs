//! Isolation forest over a dense row-major feature matrix.
//!
//! Each tree recursively splits a subsample on a random feature at a random
//! threshold between that feature's min and max, down to a depth limit of
//! ceil(log2(sample_size)). Points that isolate in few splits are anomalous.
//!
//! Scores follow the usual convention: `score_samples` lies in [-1, 0) with
//! lower meaning more anomalous, and `decision_function` shifts it by the
//! contamination percentile so negative values are outliers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::stats;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn fit(rows: &[Vec<f64>], indices: &mut [usize], max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(rows, indices, 0, max_depth, rng);
        tree
    }

    /// Build the subtree for `indices` and return its node id.
    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        indices: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: indices.len() });

        if depth >= max_depth || indices.len() <= 1 {
            return id;
        }

        // Only features that still vary inside this node can split it
        let width = rows[indices[0]].len();
        let candidates: Vec<(usize, f64, f64)> = (0..width)
            .filter_map(|f| {
                let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(rows[i][f]), hi.max(rows[i][f]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return id;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);

        // Partition in place: left holds values <= threshold
        let mut split = 0;
        for k in 0..indices.len() {
            if rows[indices[k]][feature] <= threshold {
                indices.swap(k, split);
                split += 1;
            }
        }
        let (left_idx, right_idx) = indices.split_at_mut(split);

        let left = self.grow(rows, left_idx, depth + 1, max_depth, rng);
        let right = self.grow(rows, right_idx, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth at which `row` lands, plus the expected residual depth of its leaf.
    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0usize;
        loop {
            match self.nodes[node] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[feature] <= threshold { left } else { right };
                    depth += 1;
                }
                Node::Leaf { size } => return depth as f64 + average_path_length(size),
            }
        }
    }
}

/// Fitted forest. Lives only for the duration of one scoring call.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit on `rows` (all rows must have the same width and finite values).
    ///
    /// `max_samples` of `None` uses min(256, rows). Trees draw their
    /// subsample without replacement.
    pub fn fit(
        rows: &[Vec<f64>],
        n_estimators: usize,
        max_samples: Option<usize>,
        contamination: f64,
        seed: u64,
    ) -> Self {
        let n = rows.len();
        if n == 0 {
            return Self {
                trees: Vec::new(),
                sample_size: 0,
                offset: 0.0,
            };
        }
        let sample_size = max_samples
            .unwrap_or(crate::config::defaults::AUTO_MAX_SAMPLES)
            .min(n)
            .max(1);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(seed);
        let trees = (0..n_estimators)
            .map(|_| {
                let mut subsample = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::fit(rows, &mut subsample, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };
        let scores = forest.score_samples(rows);
        forest.offset = stats::percentile(&scores, 100.0 * contamination);
        forest
    }

    /// Opposite of the anomaly score: in [-1, 0), lower is more anomalous.
    pub fn score_samples(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        let norm = average_path_length(self.sample_size) * self.trees.len() as f64;
        rows.iter()
            .map(|row| {
                let total: f64 = self.trees.iter().map(|t| t.path_length(row)).sum();
                let ratio = if norm == 0.0 { 1.0 } else { total / norm };
                -(2f64.powf(-ratio))
            })
            .collect()
    }

    /// Score shifted by the contamination threshold; negative means outlier.
    pub fn decision_function(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        self.score_samples(rows)
            .into_iter()
            .map(|s| s - self.offset)
            .collect()
    }

    pub fn threshold(&self) -> f64 {
        self.offset
    }
}
