//! First-layer detection tests.
//!
//! Two cheap, stateless tests run on every incoming point once enough
//! history exists: a global z-score over a trailing window that includes the
//! point, and a deviation test against the neighbors immediately before it.

use cascade_api::PipelineConfig;
use cascade_spi::{CascadeError, Result, Trigger};
use serde::{Deserialize, Serialize};

use crate::statistics::{preceding, trailing};

// ============================================================================
// Individual tests
// ============================================================================

/// Outcome of the global z-score test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZScoreOutcome {
    pub is_anomaly: bool,
    pub z: f64,
}

/// Global z-score test.
///
/// `values` is the series so far, current point last. The window is the
/// trailing `window` values including the current point.
pub fn zscore_test(values: &[f64], window: usize, threshold: f64) -> Result<ZScoreOutcome> {
    let Some(&current) = values.last() else {
        return Err(CascadeError::InsufficientHistory {
            required: window.max(1),
            actual: 0,
        });
    };
    if values.len() < window {
        return Err(CascadeError::InsufficientHistory {
            required: window,
            actual: values.len(),
        });
    }

    let z = trailing(values, window).ratio(current);
    Ok(ZScoreOutcome {
        is_anomaly: z.abs() > threshold,
        z,
    })
}

/// Neighbor-deviation test.
///
/// Compares the current (last) value with the `window` values right before
/// it. Needs `window + 1` values.
pub fn neighbor_test(values: &[f64], window: usize, threshold: f64) -> Result<bool> {
    if values.len() < window + 1 {
        return Err(CascadeError::InsufficientHistory {
            required: window + 1,
            actual: values.len(),
        });
    }

    let current = values[values.len() - 1];
    let deviation = preceding(values, window).ratio(current).abs();
    Ok(deviation > threshold)
}

// ============================================================================
// Combined detector
// ============================================================================

/// Result of running the first layer on one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirstLayerVerdict {
    /// The series is shorter than the z-score window.
    NotEvaluated,
    Evaluated {
        zscore: ZScoreOutcome,
        /// `None` while the series is too short for the neighbor window.
        neighbor: Option<bool>,
    },
}

impl FirstLayerVerdict {
    pub fn is_evaluated(&self) -> bool {
        matches!(self, Self::Evaluated { .. })
    }

    /// Which tests fired, if any.
    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Self::NotEvaluated => None,
            Self::Evaluated { zscore, neighbor } => {
                Trigger::from_flags(zscore.is_anomaly, neighbor.unwrap_or(false))
            }
        }
    }

    /// The z-score, when the z-score test ran.
    pub fn z(&self) -> Option<f64> {
        match self {
            Self::NotEvaluated => None,
            Self::Evaluated { zscore, .. } => Some(zscore.z),
        }
    }
}

/// The pair of first-layer tests with their windows and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstLayerDetector {
    sliding_window_size: usize,
    z_threshold: f64,
    neighbor_window_size: usize,
    neighbor_threshold: f64,
}

impl FirstLayerDetector {
    /// Create a detector.
    ///
    /// # Arguments
    ///
    /// * `sliding_window_size` - Trailing window of the z-score test
    /// * `z_threshold` - Absolute z-score above which a point is flagged
    /// * `neighbor_window_size` - Number of preceding neighbors
    /// * `neighbor_threshold` - Neighbor deviation above which a point is flagged
    pub fn new(
        sliding_window_size: usize,
        z_threshold: f64,
        neighbor_window_size: usize,
        neighbor_threshold: f64,
    ) -> Result<Self> {
        if sliding_window_size == 0 {
            return Err(CascadeError::invalid("sliding_window_size", "must be positive"));
        }
        if neighbor_window_size == 0 {
            return Err(CascadeError::invalid("neighbor_window_size", "must be positive"));
        }
        if !(z_threshold > 0.0) {
            return Err(CascadeError::invalid("z_threshold", "must be positive"));
        }
        if !(neighbor_threshold > 0.0) {
            return Err(CascadeError::invalid("neighbor_threshold", "must be positive"));
        }

        Ok(Self {
            sliding_window_size,
            z_threshold,
            neighbor_window_size,
            neighbor_threshold,
        })
    }

    /// Create from configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(
            config.sliding_window_size,
            config.z_threshold,
            config.neighbor_window_size,
            config.neighbor_threshold,
        )
    }

    /// Minimum series length before the detector runs.
    pub fn required_history(&self) -> usize {
        self.sliding_window_size
    }

    /// Run both tests on the last value of `values`.
    pub fn evaluate(&self, values: &[f64]) -> FirstLayerVerdict {
        let Ok(zscore) = zscore_test(values, self.sliding_window_size, self.z_threshold) else {
            return FirstLayerVerdict::NotEvaluated;
        };
        let neighbor = neighbor_test(values, self.neighbor_window_size, self.neighbor_threshold).ok();

        FirstLayerVerdict::Evaluated { zscore, neighbor }
    }
}
