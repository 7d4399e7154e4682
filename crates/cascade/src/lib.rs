//! # cascade
//!
//! Two-stage streaming anomaly detection.
//!
//! A cheap first layer (global z-score and neighbor deviation) flags
//! candidates on every point; every batch the whole candidate buffer is
//! revalidated by an isolation forest fitted on the residuals of the series.
//! Candidates the forest labels as outliers become permanent confirmations.

pub use cascade_facade::*;
