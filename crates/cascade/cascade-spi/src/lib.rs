//! Cascade Service Provider Interface
//!
//! Defines the contracts, data model and error types shared by the
//! two-stage streaming anomaly detector.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{OutlierModel, PipelineSink};
pub use error::{CascadeError, Result};
pub use model::{
    Candidate, ConfirmedAnomaly, Observation, OutlierPrediction, Snapshot, Trigger,
};
