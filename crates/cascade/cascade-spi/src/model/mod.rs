//! Data models for the cascade pipeline.
//!
//! This module contains the observation, candidate and confirmation types
//! that flow from the source through both detection layers to the sink.

mod candidate;
mod observation;
mod outlier_prediction;
mod snapshot;

pub use candidate::{Candidate, ConfirmedAnomaly, Trigger};
pub use observation::Observation;
pub use outlier_prediction::OutlierPrediction;
pub use snapshot::Snapshot;
