//! Candidate and confirmed anomaly types.

use serde::{Deserialize, Serialize};

use super::observation::Observation;

/// Which first-layer test flagged a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Global-window z-score test.
    ZScore,
    /// Local neighbor-deviation test.
    Neighbor,
    /// Both tests fired on the same point.
    Both,
}

impl Trigger {
    /// Combine the two test outcomes; `None` when neither fired.
    pub fn from_flags(zscore: bool, neighbor: bool) -> Option<Self> {
        match (zscore, neighbor) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::ZScore),
            (false, true) => Some(Self::Neighbor),
            (false, false) => None,
        }
    }
}

/// A point flagged by the first layer, pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Arrival position in the series.
    pub index: usize,
    pub observation: Observation,
    pub trigger: Trigger,
    /// Global z-score at the time the point arrived.
    pub z_score: f64,
}

impl Candidate {
    pub fn timestamp(&self) -> u64 {
        self.observation.timestamp
    }

    pub fn value(&self) -> f64 {
        self.observation.value
    }
}

/// A candidate promoted by the second validation layer.
///
/// Confirmed anomalies are never revoked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedAnomaly {
    /// Arrival position in the series.
    pub index: usize,
    pub observation: Observation,
    /// Isolation score in [0, 1] of the scored value.
    pub score: f64,
    /// 1-based number of the validation pass that confirmed it.
    pub pass: usize,
}

impl ConfirmedAnomaly {
    pub fn timestamp(&self) -> u64 {
        self.observation.timestamp
    }

    pub fn value(&self) -> f64 {
        self.observation.value
    }
}
