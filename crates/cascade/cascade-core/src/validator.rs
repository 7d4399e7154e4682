//! Second-layer validation.
//!
//! At a batch boundary the validator fits a fresh model on the residuals of
//! the whole series and labels every buffered candidate. Candidates labelled
//! as outliers become confirmed anomalies.

use cascade_api::{IsolationForestConfig, PipelineConfig, ScoringBasis};
use cascade_spi::{Candidate, CascadeError, ConfirmedAnomaly, OutlierModel, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::forest::IsolationForest;
use crate::residual::{FittedResidualModel, ResidualModel};

/// Summary of one validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    /// 1-based pass number.
    pub pass: usize,
    pub series_len: usize,
    /// Candidates in the buffer when the pass ran.
    pub candidates: usize,
    /// Candidates the model labelled as outliers.
    pub outliers: usize,
    /// Confirmations actually appended after deduplication.
    pub confirmed: usize,
    pub outcome: PassOutcome,
}

/// How a validation pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassOutcome {
    Completed,
    /// Nothing to validate, or the model could not be fitted.
    Skipped(String),
}

impl PassReport {
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, PassOutcome::Skipped(_))
    }
}

/// Confirms or discards first-layer candidates with an outlier model fitted
/// on residuals.
#[derive(Debug, Clone)]
pub struct SecondLayerValidator<M = IsolationForest> {
    residual_model: ResidualModel<M>,
    scoring_basis: ScoringBasis,
}

impl SecondLayerValidator<IsolationForest> {
    /// Isolation-forest validator.
    pub fn new(
        model_window: usize,
        forest: IsolationForestConfig,
        scoring_basis: ScoringBasis,
    ) -> Result<Self> {
        Self::with_model(model_window, IsolationForest::new(forest)?, scoring_basis)
    }

    /// Create from configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.model_window, config.forest.clone(), config.scoring_basis)
    }
}

impl<M: OutlierModel> SecondLayerValidator<M> {
    /// Validator around any unfitted outlier model.
    pub fn with_model(model_window: usize, template: M, scoring_basis: ScoringBasis) -> Result<Self> {
        Ok(Self {
            residual_model: ResidualModel::new(model_window, template)?,
            scoring_basis,
        })
    }

    /// Score every candidate against a model fitted on `values`.
    ///
    /// Returns the outlier-labelled candidates in buffer order, each tagged
    /// with `pass`. Deduplication across passes is left to the caller.
    ///
    /// # Errors
    ///
    /// `EmptyValidationInput` when there are no candidates or no residuals,
    /// `ModelFit` when the model rejects the residuals. The model is not
    /// fitted at all when the buffer is empty.
    pub fn validate(
        &self,
        values: &[f64],
        candidates: &[Candidate],
        pass: usize,
    ) -> Result<Vec<ConfirmedAnomaly>> {
        if candidates.is_empty() {
            return Err(CascadeError::EmptyValidationInput(
                "candidate buffer is empty".to_string(),
            ));
        }

        let fitted = self.residual_model.fit(values)?;
        let (scored, inputs) = self.scoring_inputs(&fitted, candidates);
        if scored.is_empty() {
            debug!(pass, "no candidate has a defined residual");
            return Ok(Vec::new());
        }

        let prediction = fitted.predict(&inputs)?;
        Ok(scored
            .into_iter()
            .zip(prediction.is_outlier.iter().zip(&prediction.scores))
            .filter(|(_, (&is_outlier, _))| is_outlier)
            .map(|(candidate, (_, &score))| ConfirmedAnomaly {
                index: candidate.index,
                observation: candidate.observation,
                score,
                pass,
            })
            .collect())
    }

    fn scoring_inputs<'a>(
        &self,
        fitted: &FittedResidualModel<M>,
        candidates: &'a [Candidate],
    ) -> (Vec<&'a Candidate>, Vec<f64>) {
        match self.scoring_basis {
            ScoringBasis::RawValue => (
                candidates.iter().collect(),
                candidates.iter().map(Candidate::value).collect(),
            ),
            ScoringBasis::Residual => candidates
                .iter()
                .filter_map(|c| fitted.residuals().at(c.index).map(|r| (c, r)))
                .unzip(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_spi::{Observation, OutlierPrediction, Trigger};

    /// Labels everything above a fixed cut-off; records nothing.
    #[derive(Debug, Clone, Default)]
    struct CutoffModel {
        fitted: bool,
    }

    impl OutlierModel for CutoffModel {
        fn fit(&mut self, _data: &[f64]) -> Result<()> {
            self.fitted = true;
            Ok(())
        }

        fn score(&self, data: &[f64]) -> Result<Vec<f64>> {
            Ok(data.to_vec())
        }

        fn predict(&self, data: &[f64]) -> Result<OutlierPrediction> {
            let is_outlier = data.iter().map(|&x| x > 3.0).collect();
            Ok(OutlierPrediction::new(is_outlier, data.to_vec(), 3.0))
        }

        fn is_fitted(&self) -> bool {
            self.fitted
        }
    }

    fn candidate(values: &[f64], index: usize) -> Candidate {
        Candidate {
            index,
            observation: Observation::new(1_000 + index as u64, values[index]),
            trigger: Trigger::ZScore,
            z_score: 3.0,
        }
    }

    fn noisy_with_spikes() -> Vec<f64> {
        let mut values: Vec<f64> = (0..80).map(|i| 10.0 + ((i * 37) % 11) as f64 * 0.05).collect();
        values[30] += 6.0;
        values[55] -= 7.0;
        values
    }

    #[test]
    fn test_empty_buffer_skips_fit() {
        let validator = SecondLayerValidator::from_config(&PipelineConfig::default()).unwrap();
        let result = validator.validate(&noisy_with_spikes(), &[], 1);
        assert!(matches!(result, Err(CascadeError::EmptyValidationInput(_))));
    }

    #[test]
    fn test_short_series_has_no_residuals() {
        let validator = SecondLayerValidator::from_config(&PipelineConfig::default()).unwrap();
        let values = [1.0, 5.0, 2.0];
        let result = validator.validate(&values, &[candidate(&values, 1)], 1);
        assert!(matches!(result, Err(CascadeError::EmptyValidationInput(_))));
    }

    #[test]
    fn test_constant_series_fit_failure() {
        let validator = SecondLayerValidator::from_config(&PipelineConfig::default()).unwrap();
        let values = [4.0; 60];
        let result = validator.validate(&values, &[candidate(&values, 40)], 1);
        assert!(matches!(result, Err(CascadeError::ModelFit(_))));
    }

    #[test]
    fn test_confirms_spikes_not_noise() {
        let validator = SecondLayerValidator::from_config(&PipelineConfig::default()).unwrap();
        let values = noisy_with_spikes();
        let candidates = [candidate(&values, 26), candidate(&values, 30), candidate(&values, 55)];

        let confirmed = validator.validate(&values, &candidates, 2).unwrap();
        let indices: Vec<usize> = confirmed.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![30, 55]);
        assert!(confirmed.iter().all(|c| c.pass == 2));
        assert_eq!(confirmed[0].observation, candidates[1].observation);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let validator = SecondLayerValidator::from_config(&PipelineConfig::default()).unwrap();
        let values = noisy_with_spikes();
        let candidates: Vec<Candidate> = [12, 30, 42, 55, 70]
            .iter()
            .map(|&i| candidate(&values, i))
            .collect();

        let first = validator.validate(&values, &candidates, 1).unwrap();
        let second = validator.validate(&values, &candidates, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_residual_basis_skips_undefined_prefix() {
        let validator =
            SecondLayerValidator::with_model(20, CutoffModel::default(), ScoringBasis::Residual)
                .unwrap();
        let values = noisy_with_spikes();
        // Index 5 precedes the first defined residual (index 19)
        let confirmed = validator
            .validate(&values, &[candidate(&values, 5)], 1)
            .unwrap();
        assert!(confirmed.is_empty());

        let confirmed = validator
            .validate(&values, &[candidate(&values, 5), candidate(&values, 30)], 1)
            .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].index, 30);
    }

    #[test]
    fn test_raw_value_basis_scores_raw_values() {
        let values = noisy_with_spikes();
        let candidates = [candidate(&values, 5), candidate(&values, 30)];

        // Raw values (~10) are all above the cut-off
        let raw = SecondLayerValidator::with_model(20, CutoffModel::default(), ScoringBasis::RawValue)
            .unwrap();
        assert_eq!(raw.validate(&values, &candidates, 1).unwrap().len(), 2);

        // Residual of the spike (~+6) is above, index 5 has none
        let residual =
            SecondLayerValidator::with_model(20, CutoffModel::default(), ScoringBasis::Residual)
                .unwrap();
        assert_eq!(residual.validate(&values, &candidates, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_pass_report_skipped() {
        let report = PassReport {
            pass: 1,
            series_len: 50,
            candidates: 0,
            outliers: 0,
            confirmed: 0,
            outcome: PassOutcome::Skipped("candidate buffer is empty".to_string()),
        };
        assert!(report.is_skipped());
    }
}
