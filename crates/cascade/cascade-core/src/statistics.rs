//! Sliding window statistics.
//!
//! Everything here is a pure function of a slice; the series itself is the
//! only state.

use serde::{Deserialize, Serialize};

/// Mean and sample standard deviation of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub mean: f64,
    /// Sample (n - 1) standard deviation; exactly 0 for fewer than two
    /// values or a constant window.
    pub std_dev: f64,
    pub len: usize,
}

impl WindowStats {
    /// Statistics of a whole slice.
    pub fn of(window: &[f64]) -> Self {
        let len = window.len();
        if len == 0 {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                len,
            };
        }

        let mean = window.iter().sum::<f64>() / len as f64;
        let constant = window.iter().all(|&x| x == window[0]);
        let std_dev = if len < 2 || constant {
            0.0
        } else {
            let ss = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
            (ss / (len - 1) as f64).sqrt()
        };

        Self { mean, std_dev, len }
    }

    /// A window with no spread carries no anomaly signal.
    pub fn is_degenerate(&self) -> bool {
        self.std_dev == 0.0
    }

    /// Signed number of standard deviations `value` lies from the mean, or
    /// 0 when the window is degenerate.
    pub fn ratio(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

/// Statistics of the last `window` values, the current (last) one included.
///
/// A shorter slice yields the statistics of the whole slice.
pub fn trailing(values: &[f64], window: usize) -> WindowStats {
    let start = values.len().saturating_sub(window);
    WindowStats::of(&values[start..])
}

/// Statistics of the `window` values immediately before the last one.
pub fn preceding(values: &[f64], window: usize) -> WindowStats {
    let Some(end) = values.len().checked_sub(1) else {
        return WindowStats::of(&[]);
    };
    let start = end.saturating_sub(window);
    WindowStats::of(&values[start..end])
}

/// Rolling mean aligned with the input; `None` until `window` values exist.
///
/// Each mean is summed from its own window, so a large value leaves no
/// rounding residue once it drops out.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            (i + 1 >= window).then(|| {
                values[i + 1 - window..=i].iter().sum::<f64>() / window as f64
            })
        })
        .collect()
}
