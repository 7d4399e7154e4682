//! Ready-made pipeline sinks.

use cascade_spi::{ConfirmedAnomaly, PipelineSink, Snapshot};
use tracing::info;

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PipelineSink for NullSink {
    fn on_point(&mut self, _snapshot: &Snapshot<'_>) {}
}

/// Logs newly flagged candidates and newly confirmed anomalies.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    seen_candidates: usize,
    seen_confirmed: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineSink for TracingSink {
    fn on_point(&mut self, snapshot: &Snapshot<'_>) {
        for candidate in snapshot.candidates.iter().skip(self.seen_candidates) {
            info!(
                index = candidate.index,
                timestamp = candidate.timestamp(),
                value = candidate.value(),
                z = candidate.z_score,
                trigger = ?candidate.trigger,
                "candidate"
            );
        }
        for anomaly in snapshot.confirmed.iter().skip(self.seen_confirmed) {
            info!(
                index = anomaly.index,
                timestamp = anomaly.timestamp(),
                value = anomaly.value(),
                score = anomaly.score,
                pass = anomaly.pass,
                "anomaly confirmed"
            );
        }
        self.seen_candidates = snapshot.candidates.len();
        self.seen_confirmed = snapshot.confirmed.len();
    }

    fn on_finish(&mut self, confirmed: &[ConfirmedAnomaly]) {
        info!(
            candidates = self.seen_candidates,
            confirmed = confirmed.len(),
            "stream finished"
        );
    }
}

/// Keeps the buffer sizes seen after every point and the final result.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub points: usize,
    pub candidate_lengths: Vec<usize>,
    pub confirmed_lengths: Vec<usize>,
    pub final_confirmed: Vec<ConfirmedAnomaly>,
    pub finished: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineSink for RecordingSink {
    fn on_point(&mut self, snapshot: &Snapshot<'_>) {
        self.points += 1;
        self.candidate_lengths.push(snapshot.candidates.len());
        self.confirmed_lengths.push(snapshot.confirmed.len());
    }

    fn on_finish(&mut self, confirmed: &[ConfirmedAnomaly]) {
        self.final_confirmed = confirmed.to_vec();
        self.finished = true;
    }
}
