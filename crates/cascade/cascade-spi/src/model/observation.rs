//! Observation type.

use serde::{Deserialize, Serialize};

/// A single timestamped value of the scalar series.
///
/// Timestamps are an opaque orderable key. They are expected to increase,
/// but arrival order is what the pipeline relies on, so equal timestamps are
/// tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: u64,
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(u64, f64)> for Observation {
    fn from((timestamp, value): (u64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}
