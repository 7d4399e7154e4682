//! Outlier model trait definition.

use crate::error::Result;
use crate::model::OutlierPrediction;

/// Unsupervised outlier model used by the second validation layer.
///
/// Implementations are fitted on a one-dimensional sample (the residual
/// series) and then label new values as outliers or inliers. A validator
/// keeps an unfitted template and clones it for every pass, so each pass
/// starts from a fresh fit.
pub trait OutlierModel: Clone + Send + Sync {
    /// Fit the model to training data.
    fn fit(&mut self, data: &[f64]) -> Result<()>;

    /// Anomaly score for each value (higher = more anomalous).
    fn score(&self, data: &[f64]) -> Result<Vec<f64>>;

    /// Label each value as outlier or inlier.
    fn predict(&self, data: &[f64]) -> Result<OutlierPrediction>;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;
}
