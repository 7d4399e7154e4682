//! Outlier model output.

use serde::{Deserialize, Serialize};

/// Labels and scores produced by an [`OutlierModel`](crate::OutlierModel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierPrediction {
    /// Outlier mask, one entry per scored value.
    pub is_outlier: Vec<bool>,
    /// Anomaly scores for each value.
    pub scores: Vec<f64>,
    /// Score above which a value is an outlier.
    pub threshold: f64,
}

impl OutlierPrediction {
    /// Create a new prediction.
    pub fn new(is_outlier: Vec<bool>, scores: Vec<f64>, threshold: f64) -> Self {
        Self {
            is_outlier,
            scores,
            threshold,
        }
    }

    /// Count of values labelled as outliers.
    pub fn outlier_count(&self) -> usize {
        self.is_outlier.iter().filter(|&&x| x).count()
    }
}
