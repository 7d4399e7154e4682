//! Pipeline sink trait definition.

use crate::model::{ConfirmedAnomaly, Snapshot};

/// Consumer of pipeline output.
///
/// `on_point` is called once per processed observation with read-only views
/// of the series, the candidate buffer and the confirmed list. `on_finish`
/// is called when the source is exhausted or the run is cancelled.
pub trait PipelineSink {
    /// Observe the pipeline state after one point.
    fn on_point(&mut self, snapshot: &Snapshot<'_>);

    /// Receive the final confirmed anomalies.
    fn on_finish(&mut self, _confirmed: &[ConfirmedAnomaly]) {}
}

impl<S: PipelineSink + ?Sized> PipelineSink for &mut S {
    fn on_point(&mut self, snapshot: &Snapshot<'_>) {
        (**self).on_point(snapshot)
    }

    fn on_finish(&mut self, confirmed: &[ConfirmedAnomaly]) {
        (**self).on_finish(confirmed)
    }
}
