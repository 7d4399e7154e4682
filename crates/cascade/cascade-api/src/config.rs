//! Pipeline configuration types.

use std::io::Read;

use cascade_spi::{CascadeError, Result};
use serde::{Deserialize, Serialize};

use crate::{CandidatePolicy, ConfirmationPolicy, ScoringBasis};

// ============================================================================
// Isolation forest configuration
// ============================================================================

/// Isolation forest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationForestConfig {
    /// Number of isolation trees (default: 100).
    pub n_trees: usize,
    /// Upper bound on the per-tree sample size (default: 256).
    pub max_samples: usize,
    /// Expected fraction of outliers in the training data (default: 0.05).
    pub contamination: f64,
    /// Seed for tree construction, fixed for reproducible passes (default: 42).
    pub random_seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.05,
            random_seed: 42,
        }
    }
}

impl IsolationForestConfig {
    pub fn new(contamination: f64, random_seed: u64) -> Self {
        Self {
            contamination,
            random_seed,
            ..Self::default()
        }
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(CascadeError::invalid("n_trees", "must be positive"));
        }
        if self.max_samples < 2 {
            return Err(CascadeError::invalid("max_samples", "must be at least 2"));
        }
        if !(self.contamination > 0.0 && self.contamination < 1.0) {
            return Err(CascadeError::invalid("contamination", "must be in (0, 1)"));
        }
        Ok(())
    }
}

// ============================================================================
// Pipeline configuration
// ============================================================================

/// Configuration of the whole two-stage pipeline.
///
/// Defaults: a 40-point z-score window, a 10-point neighbor window,
/// thresholds of 2 and validation every 50 points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Trailing window of the global z-score test, current point included.
    pub sliding_window_size: usize,
    /// Absolute z-score above which a point is flagged.
    pub z_threshold: f64,
    /// Window of the neighbor test, current point excluded.
    pub neighbor_window_size: usize,
    /// Neighbor deviation above which a point is flagged.
    pub neighbor_threshold: f64,
    /// Rolling-mean window used to de-trend the series for the model.
    pub model_window: usize,
    /// Validation runs when the series length is a multiple of this.
    pub batch_size: usize,
    /// Minimum series length before any validation pass.
    pub min_validation_len: usize,
    pub forest: IsolationForestConfig,
    pub candidate_policy: CandidatePolicy,
    pub scoring_basis: ScoringBasis,
    pub confirmation_policy: ConfirmationPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: 40,
            z_threshold: 2.0,
            neighbor_window_size: 10,
            neighbor_threshold: 2.0,
            model_window: 20,
            batch_size: 50,
            min_validation_len: 50,
            forest: IsolationForestConfig::default(),
            candidate_policy: CandidatePolicy::default(),
            scoring_basis: ScoringBasis::default(),
            confirmation_policy: ConfirmationPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Start a builder from the defaults.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        positive_size("sliding_window_size", self.sliding_window_size)?;
        positive_size("neighbor_window_size", self.neighbor_window_size)?;
        positive_size("model_window", self.model_window)?;
        positive_size("batch_size", self.batch_size)?;
        positive_real("z_threshold", self.z_threshold)?;
        positive_real("neighbor_threshold", self.neighbor_threshold)?;
        self.forest.validate()
    }

    /// True when a validation pass is due at this series length.
    pub fn is_validation_boundary(&self, series_len: usize) -> bool {
        series_len >= self.min_validation_len && series_len % self.batch_size == 0
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CascadeError::invalid("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| CascadeError::invalid("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn positive_size(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(CascadeError::invalid(name, "must be positive"));
    }
    Ok(())
}

fn positive_real(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CascadeError::invalid(name, "must be a positive number"));
    }
    Ok(())
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for PipelineConfig.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder seeded with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the z-score window.
    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.config.sliding_window_size = size;
        self
    }

    /// Set the z-score threshold.
    pub fn z_threshold(mut self, threshold: f64) -> Self {
        self.config.z_threshold = threshold;
        self
    }

    /// Set the neighbor window.
    pub fn neighbor_window_size(mut self, size: usize) -> Self {
        self.config.neighbor_window_size = size;
        self
    }

    /// Set the neighbor deviation threshold.
    pub fn neighbor_threshold(mut self, threshold: f64) -> Self {
        self.config.neighbor_threshold = threshold;
        self
    }

    /// Set the residual rolling-mean window.
    pub fn model_window(mut self, size: usize) -> Self {
        self.config.model_window = size;
        self
    }

    /// Set the validation batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the minimum series length for validation.
    pub fn min_validation_len(mut self, len: usize) -> Self {
        self.config.min_validation_len = len;
        self
    }

    /// Set the expected outlier fraction.
    pub fn contamination(mut self, contamination: f64) -> Self {
        self.config.forest.contamination = contamination;
        self
    }

    /// Set the isolation forest seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.forest.random_seed = seed;
        self
    }

    /// Replace the whole forest configuration.
    pub fn forest(mut self, forest: IsolationForestConfig) -> Self {
        self.config.forest = forest;
        self
    }

    pub fn candidate_policy(mut self, policy: CandidatePolicy) -> Self {
        self.config.candidate_policy = policy;
        self
    }

    pub fn scoring_basis(mut self, basis: ScoringBasis) -> Self {
        self.config.scoring_basis = basis;
        self
    }

    pub fn confirmation_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.config.confirmation_policy = policy;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
