//! Streaming pipeline driver.

use std::sync::atomic::{AtomicBool, Ordering};

use cascade_api::PipelineConfig;
use cascade_spi::{
    Candidate, CascadeError, ConfirmedAnomaly, Observation, OutlierModel, PipelineSink, Result,
    Snapshot,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buffer::{CandidateBuffer, ConfirmedLedger};
use crate::first_layer::{FirstLayerDetector, FirstLayerVerdict};
use crate::forest::IsolationForest;
use crate::validator::{PassOutcome, PassReport, SecondLayerValidator};

/// Where the pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    /// Fewer points than the z-score window: append only.
    WarmUp,
    /// First-layer tests run on every point.
    Detecting,
}

/// What happened while processing one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Arrival index of the observation.
    pub index: usize,
    pub phase: PipelinePhase,
    pub verdict: FirstLayerVerdict,
    pub candidates_added: usize,
    /// Present when the point closed a batch.
    pub pass: Option<PassReport>,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub points: usize,
    pub candidates: usize,
    pub confirmed: usize,
    pub passes_run: usize,
    pub passes_skipped: usize,
}

/// Two-stage streaming anomaly detector.
///
/// Owns the series, the candidate buffer and the confirmed anomalies. Each
/// [`push`](Self::push) appends one observation, runs the first layer once
/// the series is long enough and, on batch boundaries, revalidates the whole
/// candidate buffer.
pub struct Pipeline<M: OutlierModel = IsolationForest> {
    config: PipelineConfig,
    detector: FirstLayerDetector,
    validator: SecondLayerValidator<M>,
    series: Vec<Observation>,
    values: Vec<f64>,
    candidates: CandidateBuffer,
    confirmed: ConfirmedLedger,
    stats: PipelineStats,
}

impl Pipeline<IsolationForest> {
    /// Create an isolation-forest pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let validator = SecondLayerValidator::from_config(&config)?;
        Self::assemble(config, validator)
    }
}

impl<M: OutlierModel> Pipeline<M> {
    /// Create a pipeline that validates with a custom outlier model.
    pub fn with_model(config: PipelineConfig, model: M) -> Result<Self> {
        config.validate()?;
        let validator =
            SecondLayerValidator::with_model(config.model_window, model, config.scoring_basis)?;
        Self::assemble(config, validator)
    }

    fn assemble(config: PipelineConfig, validator: SecondLayerValidator<M>) -> Result<Self> {
        Ok(Self {
            detector: FirstLayerDetector::from_config(&config)?,
            validator,
            series: Vec::new(),
            values: Vec::new(),
            candidates: CandidateBuffer::new(config.candidate_policy),
            confirmed: ConfirmedLedger::new(config.confirmation_policy),
            stats: PipelineStats::default(),
            config,
        })
    }

    /// Process one observation.
    pub fn push(&mut self, observation: Observation) -> StepReport {
        let index = self.series.len();
        self.series.push(observation);
        self.values.push(observation.value);
        self.stats.points += 1;

        let phase = self.phase();
        let verdict = match phase {
            PipelinePhase::WarmUp => FirstLayerVerdict::NotEvaluated,
            PipelinePhase::Detecting => self.detector.evaluate(&self.values),
        };

        let candidates_added = self.candidates.record(index, observation, &verdict);
        if candidates_added > 0 {
            self.stats.candidates = self.candidates.len();
            debug!(
                index,
                timestamp = observation.timestamp,
                value = observation.value,
                z = verdict.z().unwrap_or_default(),
                trigger = ?verdict.trigger(),
                "first-layer candidate"
            );
        }

        let pass = self
            .config
            .is_validation_boundary(self.series.len())
            .then(|| self.validate_now());

        StepReport {
            index,
            phase,
            verdict,
            candidates_added,
            pass,
        }
    }

    /// Run a validation pass over the current state, regardless of the
    /// batch schedule.
    pub fn validate_now(&mut self) -> PassReport {
        let pass = self.stats.passes_run + self.stats.passes_skipped + 1;
        let candidates = self.candidates.as_slice();

        let (outliers, confirmed, outcome) =
            match self.validator.validate(&self.values, candidates, pass) {
                Ok(batch) => {
                    let outliers = batch.len();
                    let confirmed = self.confirmed.merge(batch);
                    (outliers, confirmed, PassOutcome::Completed)
                }
                Err(e) => {
                    match &e {
                        CascadeError::ModelFit(_) => {
                            warn!(pass, error = %e, "validation pass skipped: model fit failed")
                        }
                        _ if e.is_skippable() => debug!(pass, error = %e, "validation pass skipped"),
                        _ => warn!(pass, error = %e, "validation pass failed"),
                    }
                    (0, 0, PassOutcome::Skipped(e.to_string()))
                }
            };

        let report = PassReport {
            pass,
            series_len: self.series.len(),
            candidates: candidates.len(),
            outliers,
            confirmed,
            outcome,
        };

        if report.is_skipped() {
            self.stats.passes_skipped += 1;
        } else {
            self.stats.passes_run += 1;
            self.stats.confirmed = self.confirmed.len();
            info!(
                pass,
                series_len = report.series_len,
                candidates = report.candidates,
                outliers = report.outliers,
                confirmed = report.confirmed,
                "validation pass complete"
            );
        }
        report
    }

    /// Consume a source to exhaustion, notifying `sink` after every point.
    pub fn run<I, S>(&mut self, source: I, sink: S) -> &[ConfirmedAnomaly]
    where
        I: IntoIterator<Item = Observation>,
        S: PipelineSink,
    {
        self.run_until(source, sink, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but stops before the next observation once
    /// `cancel` is set. Whatever has been confirmed so far is returned.
    pub fn run_until<I, S>(&mut self, source: I, mut sink: S, cancel: &AtomicBool) -> &[ConfirmedAnomaly]
    where
        I: IntoIterator<Item = Observation>,
        S: PipelineSink,
    {
        for observation in source {
            if cancel.load(Ordering::Relaxed) {
                info!(points = self.series.len(), "pipeline cancelled");
                break;
            }
            self.push(observation);
            sink.on_point(&self.snapshot());
        }

        sink.on_finish(self.confirmed.as_slice());
        self.confirmed.as_slice()
    }

    pub fn phase(&self) -> PipelinePhase {
        if self.series.len() < self.detector.required_history() {
            PipelinePhase::WarmUp
        } else {
            PipelinePhase::Detecting
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            series: &self.series,
            candidates: self.candidates.as_slice(),
            confirmed: self.confirmed.as_slice(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn series(&self) -> &[Observation] {
        &self.series
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.candidates.as_slice()
    }

    pub fn confirmed(&self) -> &[ConfirmedAnomaly] {
        self.confirmed.as_slice()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_api::CandidatePolicy;
    use cascade_spi::Trigger;

    use crate::sinks::RecordingSink;

    fn observations(values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation::new(i as u64, v))
            .collect()
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig::builder()
            .sliding_window_size(10)
            .neighbor_window_size(5)
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PipelineConfig {
            batch_size: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(CascadeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_warm_up_then_detecting() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        for i in 0..9 {
            let report = pipeline.push(Observation::new(i, 1000.0 * i as f64));
            assert_eq!(report.phase, PipelinePhase::WarmUp);
            assert_eq!(report.verdict, FirstLayerVerdict::NotEvaluated);
            assert_eq!(report.candidates_added, 0);
        }
        let report = pipeline.push(Observation::new(9, 1.0));
        assert_eq!(report.phase, PipelinePhase::Detecting);
        assert!(report.verdict.is_evaluated());
        assert_eq!(pipeline.phase(), PipelinePhase::Detecting);
    }

    #[test]
    fn test_spike_becomes_candidate() {
        let mut values: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 10.0 } else { 10.1 }).collect();
        values.push(100.0);

        let mut pipeline = Pipeline::new(small_config()).unwrap();
        let reports: Vec<StepReport> = observations(&values)
            .into_iter()
            .map(|o| pipeline.push(o))
            .collect();

        assert_eq!(reports[30].candidates_added, 1);
        assert_eq!(pipeline.candidates().len(), 1);
        assert_eq!(pipeline.candidates()[0].index, 30);
        assert_eq!(pipeline.candidates()[0].trigger, Trigger::Both);
        assert_eq!(pipeline.stats().candidates, 1);
    }

    #[test]
    fn test_double_counting_policy() {
        let mut values: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 10.0 } else { 10.1 }).collect();
        values.push(100.0);

        let config = PipelineConfig {
            candidate_policy: CandidatePolicy::OncePerFiringTest,
            ..small_config()
        };
        let mut pipeline = Pipeline::new(config).unwrap();
        for o in observations(&values) {
            pipeline.push(o);
        }
        assert_eq!(pipeline.candidates().len(), 2);
        assert!(pipeline.candidates().iter().all(|c| c.index == 30));
    }

    #[test]
    fn test_pass_scheduled_on_batch_boundary() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        let values = vec![5.0; 100];
        let passes: Vec<usize> = observations(&values)
            .into_iter()
            .filter_map(|o| pipeline.push(o).pass.map(|p| p.series_len))
            .collect();

        assert_eq!(passes, vec![50, 100]);
        assert_eq!(pipeline.stats().passes_skipped, 2);
        assert_eq!(pipeline.stats().passes_run, 0);
        assert!(pipeline.confirmed().is_empty());
    }

    #[test]
    fn test_validate_now_numbers_passes() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        assert_eq!(pipeline.validate_now().pass, 1);
        assert_eq!(pipeline.validate_now().pass, 2);
        assert_eq!(pipeline.stats().passes_skipped, 2);
    }

    #[test]
    fn test_run_notifies_sink_every_point() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        let mut sink = RecordingSink::default();
        let values: Vec<f64> = (0..75).map(|i| (i as f64 * 0.3).sin()).collect();

        pipeline.run(observations(&values), &mut sink);

        assert_eq!(sink.points, 75);
        assert_eq!(sink.candidate_lengths.len(), 75);
        assert!(sink.finished);
        assert_eq!(sink.final_confirmed, pipeline.confirmed());
    }

    #[test]
    fn test_run_until_cancelled() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        let cancel = AtomicBool::new(true);
        let mut sink = RecordingSink::default();

        let confirmed = pipeline.run_until(observations(&[1.0, 2.0, 3.0]), &mut sink, &cancel);
        assert!(confirmed.is_empty());
        assert!(pipeline.series().is_empty());
        assert!(sink.finished);
    }

    #[test]
    fn test_extreme_finite_values_do_not_end_the_run() {
        let config = PipelineConfig::builder()
            .sliding_window_size(5)
            .neighbor_window_size(5)
            .build()
            .unwrap();
        let mut values: Vec<f64> = (0..50).map(|i| (i % 3) as f64).collect();
        values[22] = 1.5e308;
        values[45] = -1.5e308;

        let mut pipeline = Pipeline::new(config).unwrap();
        let pass = observations(&values)
            .into_iter()
            .filter_map(|o| pipeline.push(o).pass)
            .last()
            .unwrap();

        assert!(pipeline.candidates().iter().any(|c| c.index == 22));
        assert_eq!(pass.series_len, 50);
        assert_eq!(pass.outcome, PassOutcome::Completed);
        assert_eq!(pipeline.stats().passes_run, 1);
    }

    #[test]
    fn test_equal_timestamps_are_accepted() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        for _ in 0..60 {
            pipeline.push(Observation::new(7, 1.0));
        }
        assert_eq!(pipeline.series().len(), 60);
        assert_eq!(pipeline.stats().points, 60);
    }
}
