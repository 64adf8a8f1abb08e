//! Seeded isolation forest over fixed-width feature rows.
//! Points that need fewer random axis-aligned splits to isolate score higher.

use crate::features::FEATURE_DIM;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type Sample = [f64; FEATURE_DIM];

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points.
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
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

impl Node {
    fn build(data: &[Sample], idx: Vec<usize>, depth: usize, limit: usize, rng: &mut StdRng) -> Node {
        if depth >= limit || idx.len() <= 1 {
            return Node::Leaf { size: idx.len() };
        }

        // Only features that still vary inside this node can split it.
        let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(FEATURE_DIM);
        for f in 0..FEATURE_DIM {
            let (min, max) = idx.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                (lo.min(data[i][f]), hi.max(data[i][f]))
            });
            if max > min {
                candidates.push((f, min, max));
            }
        }
        if candidates.is_empty() {
            return Node::Leaf { size: idx.len() };
        }

        let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
        let value = rng.gen_range(min..max);
        let (left, right): (Vec<usize>, Vec<usize>) =
            idx.into_iter().partition(|&i| data[i][feature] <= value);

        Node::Split {
            feature,
            value,
            left: Box::new(Node::build(data, left, depth + 1, limit, rng)),
            right: Box::new(Node::build(data, right, depth + 1, limit, rng)),
        }
    }

    fn path_length(&self, x: &Sample) -> f64 {
        let mut node = self;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *value { left.as_ref() } else { right.as_ref() };
                    depth += 1;
                }
            }
        }
    }
}

pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `n_trees` trees, each on a subsample of `min(max_samples, len)` rows drawn
    /// without replacement. Returns `None` for empty input.
    pub fn fit(data: &[Sample], n_trees: usize, max_samples: usize, seed: u64) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = max_samples.clamp(1, data.len());
        let limit = (sample_size as f64).log2().ceil().max(0.0) as usize;

        let trees = (0..n_trees.max(1))
            .map(|_| {
                let idx = rand::seq::index::sample(&mut rng, data.len(), sample_size).into_vec();
                Node::build(data, idx, 0, limit, &mut rng)
            })
            .collect();

        Some(Self { trees, sample_size })
    }

    /// Isolation score in (0, 1]; higher is more anomalous. 0.5 when the
    /// subsample is too small to normalise against.
    pub fn score(&self, x: &Sample) -> f64 {
        let mean_path =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let c = average_path_length(self.sample_size);
        let normalised = if c > 0.0 { mean_path / c } else { 1.0 };
        2f64.powf(-normalised)
    }

    pub fn score_samples(&self, data: &[Sample]) -> Vec<f64> {
        data.iter().map(|x| self.score(x)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}
