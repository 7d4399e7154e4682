//! Read-only view handed to sinks.

use super::candidate::{Candidate, ConfirmedAnomaly};
use super::observation::Observation;

/// Pipeline state after one processed point.
///
/// The slices borrow the pipeline's buffers for the duration of a sink
/// callback; a sink that needs to keep them must copy.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub series: &'a [Observation],
    pub candidates: &'a [Candidate],
    pub confirmed: &'a [ConfirmedAnomaly],
}
