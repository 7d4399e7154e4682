//! Isolation forest for one-dimensional data.
//!
//! Each tree recursively splits a random sample at uniform thresholds
//! between the node's minimum and maximum. Outliers sit in sparse regions
//! and are isolated after few splits, so a short average path length means
//! a high anomaly score:
//!
//! ```text
//! s(x) = 2^(-E[h(x)] / c(psi))
//! ```
//!
//! where `c(n)` is the average path length of an unsuccessful binary search
//! tree lookup over `n` points and `psi` the per-tree sample size. The
//! decision threshold is the `1 - contamination` quantile of the training
//! scores.

use cascade_api::IsolationForestConfig;
use cascade_spi::{CascadeError, OutlierModel, OutlierPrediction, Result};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful search in a BST of `n` points.
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

/// Point at fraction `u` of `[min, max)`.
///
/// Interpolates over halved bounds so the span cannot overflow for extreme
/// finite values. Falls back to `min` when rounding lands on `max`, which
/// keeps both sides non-empty with `<=` going left.
fn split_point(min: f64, max: f64, u: f64) -> f64 {
    let half = min / 2.0 + (max / 2.0 - min / 2.0) * u;
    let threshold = half * 2.0;
    if threshold >= min && threshold < max {
        threshold
    } else {
        min
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { size: usize },
    Split { threshold: f64, left: Box<Node>, right: Box<Node> },
}

impl Node {
    fn build<R: Rng>(rng: &mut R, values: Vec<f64>, depth: usize, max_depth: usize) -> Self {
        if depth >= max_depth || values.len() <= 1 {
            return Node::Leaf { size: values.len() };
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
        if min >= max {
            return Node::Leaf { size: values.len() };
        }

        let threshold = split_point(min, max, rng.gen::<f64>());
        let (left, right): (Vec<f64>, Vec<f64>) = values.into_iter().partition(|&x| x <= threshold);

        Node::Split {
            threshold,
            left: Box::new(Node::build(rng, left, depth + 1, max_depth)),
            right: Box::new(Node::build(rng, right, depth + 1, max_depth)),
        }
    }

    fn path_length(&self, x: f64) -> f64 {
        let mut node = self;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { threshold, left, right } => {
                    node = if x <= *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Isolation forest anomaly model.
///
/// @algorithm IsolationForest
/// @category EnsembleDetector
/// @complexity O(t * psi * log psi) fit, O(t * log psi) per scored value
/// @thread_safe true
///
/// # Example
///
/// ```rust
/// use cascade_core::IsolationForest;
/// use cascade_spi::OutlierModel;
///
/// let mut data: Vec<f64> = (0..200).map(|i| ((i * 37) % 200) as f64 / 200.0).collect();
/// data.push(25.0);
///
/// let mut forest = IsolationForest::default();
/// forest.fit(&data).unwrap();
/// let prediction = forest.predict(&[25.0, 0.5]).unwrap();
/// assert!(prediction.is_outlier[0]);
/// assert!(!prediction.is_outlier[1]);
/// ```
#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: IsolationForestConfig,
    trees: Vec<Node>,
    sample_size: usize,
    threshold: f64,
    fitted: bool,
}

impl IsolationForest {
    /// Create an unfitted forest.
    pub fn new(config: IsolationForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            trees: Vec::new(),
            sample_size: 0,
            threshold: f64::INFINITY,
            fitted: false,
        })
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    /// Score above which a value is labelled an outlier.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn score_one(&self, x: f64) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>()
            / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        2f64.powf(-mean_path / norm)
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            config: IsolationForestConfig::default(),
            trees: Vec::new(),
            sample_size: 0,
            threshold: f64::INFINITY,
            fitted: false,
        }
    }
}

impl OutlierModel for IsolationForest {
    fn fit(&mut self, data: &[f64]) -> Result<()> {
        if data.len() < 2 {
            return Err(CascadeError::ModelFit(format!(
                "need at least 2 points, got {}",
                data.len()
            )));
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(CascadeError::ModelFit("non-finite training value".to_string()));
        }
        if data.iter().all(|&x| x == data[0]) {
            return Err(CascadeError::ModelFit(
                "constant training data cannot be partitioned".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        let sample_size = self.config.max_samples.min(data.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        self.trees = (0..self.config.n_trees)
            .map(|_| {
                let values = sample(&mut rng, data.len(), sample_size)
                    .into_iter()
                    .map(|i| data[i])
                    .collect();
                Node::build(&mut rng, values, 0, max_depth)
            })
            .collect();
        self.sample_size = sample_size;

        let mut scores: Vec<f64> = data.iter().map(|&x| self.score_one(x)).collect();
        scores.sort_by(|a, b| a.total_cmp(b));
        self.threshold = quantile(&scores, 1.0 - self.config.contamination);
        self.fitted = true;
        Ok(())
    }

    fn score(&self, data: &[f64]) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(CascadeError::NotFitted);
        }
        Ok(data.iter().map(|&x| self.score_one(x)).collect())
    }

    fn predict(&self, data: &[f64]) -> Result<OutlierPrediction> {
        let scores = self.score(data)?;
        let is_outlier = scores.iter().map(|&s| s > self.threshold).collect();
        Ok(OutlierPrediction::new(is_outlier, scores, self.threshold))
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

/// Linearly interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
