//! Cascade API
//!
//! Configuration types, policy knobs and builders for the two-stage
//! streaming anomaly detector.

use serde::{Deserialize, Serialize};

mod config;

// Re-export SPI types
pub use cascade_spi::{
    Candidate, CascadeError, ConfirmedAnomaly, Observation, OutlierModel,
    OutlierPrediction, PipelineSink, Result, Snapshot, Trigger,
};

pub use config::{IsolationForestConfig, PipelineConfig, PipelineConfigBuilder};

// ============================================================================
// Policy knobs
// ============================================================================

/// How a point that fails both first-layer tests enters the candidate buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePolicy {
    /// One candidate per flagged point, with the trigger recording both tests.
    #[default]
    OncePerPoint,
    /// One candidate per firing test, so a point can be buffered twice.
    OncePerFiringTest,
}

/// Which value of a candidate is scored against the residual-fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringBasis {
    /// The candidate's own residual at its series position.
    #[default]
    Residual,
    /// The candidate's raw value, even though the model was fitted on
    /// residuals.
    RawValue,
}

/// Whether a candidate rescanned by a later pass may be confirmed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    /// Confirm each series position at most once.
    #[default]
    DedupeByArrival,
    /// Append every outlier-labelled candidate of every pass.
    KeepDuplicates,
}
