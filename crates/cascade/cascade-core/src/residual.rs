//! De-trended residual series and the model fitted on it.

use cascade_spi::{CascadeError, OutlierModel, OutlierPrediction, Result};
use serde::{Deserialize, Serialize};

use crate::statistics::rolling_mean;

/// `value - rolling_mean(value)` at one series position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualPoint {
    pub index: usize,
    pub residual: f64,
}

/// Residuals of a series with the undefined leading entries dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualSeries {
    points: Vec<ResidualPoint>,
}

impl ResidualSeries {
    /// Compute residuals against a rolling mean of `window` values.
    ///
    /// The first `window - 1` positions have no rolling mean and are
    /// excluded rather than defaulted.
    pub fn compute(values: &[f64], window: usize) -> Self {
        let points = rolling_mean(values, window)
            .into_iter()
            .zip(values)
            .enumerate()
            .filter_map(|(index, (mean, &value))| {
                mean.map(|m| ResidualPoint {
                    index,
                    residual: value - m,
                })
            })
            .collect();
        Self { points }
    }

    /// Residual at a series position, if defined.
    pub fn at(&self, index: usize) -> Option<f64> {
        let first = self.points.first()?.index;
        let offset = index.checked_sub(first)?;
        self.points.get(offset).map(|p| p.residual)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.residual).collect()
    }

    pub fn points(&self) -> &[ResidualPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Fits an outlier model on the residuals of a series.
///
/// Holds an unfitted template; every [`fit`](Self::fit) clones it, so
/// successive fits never share state.
#[derive(Debug, Clone)]
pub struct ResidualModel<M> {
    window: usize,
    template: M,
}

impl<M: OutlierModel> ResidualModel<M> {
    pub fn new(window: usize, template: M) -> Result<Self> {
        if window == 0 {
            return Err(CascadeError::invalid("model_window", "must be positive"));
        }
        Ok(Self { window, template })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Compute the residuals of `values` and fit a fresh model on them.
    pub fn fit(&self, values: &[f64]) -> Result<FittedResidualModel<M>> {
        let residuals = ResidualSeries::compute(values, self.window);
        if residuals.is_empty() {
            return Err(CascadeError::EmptyValidationInput(format!(
                "no residual points: series has {} values, model window is {}",
                values.len(),
                self.window
            )));
        }

        let mut model = self.template.clone();
        model.fit(&residuals.values())?;
        Ok(FittedResidualModel { residuals, model })
    }
}

/// A model fitted on a residual series, together with that series.
#[derive(Debug, Clone)]
pub struct FittedResidualModel<M> {
    residuals: ResidualSeries,
    model: M,
}

impl<M: OutlierModel> FittedResidualModel<M> {
    pub fn residuals(&self) -> &ResidualSeries {
        &self.residuals
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn predict(&self, values: &[f64]) -> Result<OutlierPrediction> {
        self.model.predict(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::IsolationForest;

    #[test]
    fn test_residuals_drop_undefined_prefix() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let residuals = ResidualSeries::compute(&values, 3);
        assert_eq!(residuals.len(), 3);
        assert_eq!(residuals.points()[0].index, 2);
        assert!((residuals.points()[0].residual - 1.0).abs() < 1e-12);
        assert!(residuals.values().iter().all(|r| (r - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_residual_lookup_by_index() {
        let values = [1.0, 2.0, 3.0, 10.0];
        let residuals = ResidualSeries::compute(&values, 2);
        assert_eq!(residuals.at(0), None);
        assert_eq!(residuals.at(1), Some(0.5));
        assert_eq!(residuals.at(3), Some(3.5));
        assert_eq!(residuals.at(4), None);
    }

    #[test]
    fn test_residuals_short_series_is_empty() {
        let residuals = ResidualSeries::compute(&[1.0, 2.0], 20);
        assert!(residuals.is_empty());
        assert_eq!(residuals.at(1), None);
    }

    #[test]
    fn test_fit_rejects_short_series() {
        let model = ResidualModel::new(20, IsolationForest::default()).unwrap();
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(matches!(
            model.fit(&values),
            Err(CascadeError::EmptyValidationInput(_))
        ));
    }

    #[test]
    fn test_fit_constant_series_fails() {
        let model = ResidualModel::new(5, IsolationForest::default()).unwrap();
        assert!(matches!(
            model.fit(&[3.0; 40]),
            Err(CascadeError::ModelFit(_))
        ));
    }

    #[test]
    fn test_fit_leaves_template_unfitted() {
        let model = ResidualModel::new(5, IsolationForest::default()).unwrap();
        let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.7).sin()).collect();
        let fitted = model.fit(&values).unwrap();
        assert!(fitted.model().is_fitted());
        assert_eq!(fitted.residuals().len(), 56);
        assert!(!model.template.is_fitted());
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(ResidualModel::new(0, IsolationForest::default()).is_err());
    }
}
