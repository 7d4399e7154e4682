//! Append-only candidate and confirmation stores.

use std::collections::HashSet;

use cascade_api::{CandidatePolicy, ConfirmationPolicy};
use cascade_spi::{Candidate, ConfirmedAnomaly, Observation, Trigger};

use crate::first_layer::FirstLayerVerdict;

/// Points flagged by the first layer, in arrival order.
///
/// Nothing is ever removed: every validation pass rescans the whole buffer.
#[derive(Debug, Clone, Default)]
pub struct CandidateBuffer {
    policy: CandidatePolicy,
    candidates: Vec<Candidate>,
}

impl CandidateBuffer {
    pub fn new(policy: CandidatePolicy) -> Self {
        Self {
            policy,
            candidates: Vec::new(),
        }
    }

    pub fn policy(&self) -> CandidatePolicy {
        self.policy
    }

    /// Record the first-layer verdict for the point at `index`.
    ///
    /// Returns the number of candidates appended: 0 when no test fired, and
    /// 2 for a point flagged by both tests under
    /// [`CandidatePolicy::OncePerFiringTest`].
    pub fn record(
        &mut self,
        index: usize,
        observation: Observation,
        verdict: &FirstLayerVerdict,
    ) -> usize {
        let (Some(trigger), Some(z_score)) = (verdict.trigger(), verdict.z()) else {
            return 0;
        };

        let candidate = |trigger| Candidate {
            index,
            observation,
            trigger,
            z_score,
        };

        match (self.policy, trigger) {
            (CandidatePolicy::OncePerFiringTest, Trigger::Both) => {
                self.candidates.push(candidate(Trigger::ZScore));
                self.candidates.push(candidate(Trigger::Neighbor));
                2
            }
            _ => {
                self.candidates.push(candidate(trigger));
                1
            }
        }
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Confirmed anomalies, in confirmation order.
///
/// Entries are permanent. Under [`ConfirmationPolicy::DedupeByArrival`] a
/// series position is confirmed at most once across all passes.
#[derive(Debug, Clone, Default)]
pub struct ConfirmedLedger {
    policy: ConfirmationPolicy,
    entries: Vec<ConfirmedAnomaly>,
    seen: HashSet<usize>,
}

impl ConfirmedLedger {
    pub fn new(policy: ConfirmationPolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    /// Append a pass's confirmations; returns how many were kept.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = ConfirmedAnomaly>) -> usize {
        let before = self.entries.len();
        for anomaly in batch {
            let fresh = self.seen.insert(anomaly.index);
            if fresh || self.policy == ConfirmationPolicy::KeepDuplicates {
                self.entries.push(anomaly);
            }
        }
        self.entries.len() - before
    }

    /// Whether the series position has been confirmed.
    pub fn contains(&self, index: usize) -> bool {
        self.seen.contains(&index)
    }

    pub fn as_slice(&self) -> &[ConfirmedAnomaly] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
