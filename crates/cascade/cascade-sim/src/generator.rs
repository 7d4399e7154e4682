//! Generator configuration and per-step state.

use std::f64::consts::PI;

use cascade_spi::{CascadeError, Result};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Shape of the synthetic signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Scale of the random trend increment, multiplied by the step number.
    pub trend_factor: f64,
    pub seasonal_amplitude1: f64,
    pub seasonal_amplitude2: f64,
    /// Period, in steps, of the first seasonal term.
    pub frequency1: f64,
    /// Period, in steps, of the second seasonal term.
    pub frequency2: f64,
    /// Base standard deviation of the noise.
    pub noise_level: f64,
    /// Probability that a step carries a spike.
    pub spike_probability: f64,
    /// Largest absolute spike magnitude.
    pub spike_magnitude: f64,
    /// Timestamp of step 0, Unix seconds.
    pub start_timestamp: u64,
    pub step_secs: u64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            trend_factor: 0.0002,
            seasonal_amplitude1: 3.0,
            seasonal_amplitude2: 2.0,
            frequency1: 100.0,
            frequency2: 150.0,
            noise_level: 0.3,
            spike_probability: 0.05,
            spike_magnitude: 5.0,
            // 2024-01-01T00:00:00Z, one point per day
            start_timestamp: 1_704_067_200,
            step_secs: 86_400,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    /// Default signal with another seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.frequency1 > 0.0) || !(self.frequency2 > 0.0) {
            return Err(CascadeError::invalid("frequency", "must be positive"));
        }
        if !(self.noise_level >= 0.0) {
            return Err(CascadeError::invalid("noise_level", "must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.spike_probability) {
            return Err(CascadeError::invalid("spike_probability", "must be in [0, 1]"));
        }
        if !(self.spike_magnitude >= 0.0) {
            return Err(CascadeError::invalid("spike_magnitude", "must be non-negative"));
        }
        if !self.trend_factor.is_finite() {
            return Err(CascadeError::invalid("trend_factor", "must be finite"));
        }
        Ok(())
    }

    /// Timestamp of step `t`.
    pub fn timestamp(&self, t: u64) -> u64 {
        self.start_timestamp.saturating_add(t.saturating_mul(self.step_secs))
    }
}

/// State carried from one step to the next.
///
/// Only the trend accumulates; every other term is drawn fresh per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub trend: f64,
}

impl GeneratorState {
    /// Produce the value at step `t` and the state for step `t + 1`.
    pub fn step<R: Rng>(self, config: &GeneratorConfig, t: u64, rng: &mut R) -> (Self, f64) {
        let t = t as f64;
        let trend = self.trend + config.trend_factor * rng.gen_range(-1.0..1.0) * t;

        let seasonal1 = (config.seasonal_amplitude1 + rng.gen_range(-1.0..1.0))
            * (2.0 * PI * t / config.frequency1).sin();
        let seasonal2 = (config.seasonal_amplitude2 + rng.gen_range(-0.5..0.5))
            * (2.0 * PI * t / config.frequency2).sin();

        let sigma = config.noise_level * rng.gen_range(0.5..1.5);
        let noise = sigma * rng.sample::<f64, _>(StandardNormal);

        let spike = if rng.gen_bool(config.spike_probability) && config.spike_magnitude > 0.0 {
            rng.gen_range(-config.spike_magnitude..config.spike_magnitude)
        } else {
            0.0
        };

        (Self { trend }, trend + seasonal1 + seasonal2 + noise + spike)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
        assert_eq!(GeneratorConfig::with_seed(9).seed, 9);
    }

    #[test]
    fn test_invalid_config() {
        let bad = GeneratorConfig {
            spike_probability: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = GeneratorConfig {
            frequency2: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_timestamps_advance_by_step() {
        let config = GeneratorConfig::default();
        assert_eq!(config.timestamp(0), 1_704_067_200);
        assert_eq!(config.timestamp(2), 1_704_067_200 + 2 * 86_400);
    }

    #[test]
    fn test_step_zero_has_no_trend_or_season() {
        // At t = 0 both sines vanish and the trend increment is zero
        let config = GeneratorConfig {
            noise_level: 0.0,
            spike_probability: 0.0,
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let (state, value) = GeneratorState::default().step(&config, 0, &mut rng);
        assert_eq!(state.trend, 0.0);
        assert!(value.abs() < 1e-12);
    }

    #[test]
    fn test_trend_is_threaded_through_state() {
        let config = GeneratorConfig {
            trend_factor: 1.0,
            seasonal_amplitude1: 0.0,
            seasonal_amplitude2: 0.0,
            noise_level: 0.0,
            spike_probability: 0.0,
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let start = GeneratorState { trend: 100.0 };
        let (next, _) = start.step(&config, 1, &mut rng);
        // Increment is U(-1, 1) * t with t = 1
        assert!((next.trend - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_always_spiking_stays_bounded() {
        let config = GeneratorConfig {
            trend_factor: 0.0,
            seasonal_amplitude1: 0.0,
            seasonal_amplitude2: 0.0,
            noise_level: 0.0,
            spike_probability: 1.0,
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = GeneratorState::default();
        for t in 0..200 {
            let (next, value) = state.step(&config, t, &mut rng);
            // Seasonal amplitudes are 0 but still jittered by up to 1 + 0.5
            assert!(value.abs() <= 5.0 + 1.5);
            state = next;
        }
    }
}
