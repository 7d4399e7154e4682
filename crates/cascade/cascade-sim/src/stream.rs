//! Iterator over generated observations.

use cascade_spi::{Observation, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::generator::{GeneratorConfig, GeneratorState};

/// Seeded stream of synthetic observations.
///
/// Unbounded unless [`take_points`](Self::take_points) is used. Two streams
/// built from the same configuration yield the same values.
#[derive(Debug, Clone)]
pub struct SyntheticStream {
    config: GeneratorConfig,
    state: GeneratorState,
    rng: StdRng,
    t: u64,
    remaining: Option<u64>,
}

impl SyntheticStream {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            state: GeneratorState::default(),
            t: 0,
            remaining: None,
        })
    }

    /// Stop after `n` observations.
    pub fn take_points(mut self, n: u64) -> Self {
        self.remaining = Some(n);
        self
    }
}

impl Iterator for SyntheticStream {
    type Item = Observation;

    fn next(&mut self) -> Option<Observation> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let (state, value) = self.state.step(&self.config, self.t, &mut self.rng);
        let observation = Observation::new(self.config.timestamp(self.t), value);
        self.state = state;
        self.t += 1;
        Some(observation)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(n) => {
                let n = usize::try_from(n).unwrap_or(usize::MAX);
                (n, Some(n))
            }
            None => (usize::MAX, None),
        }
    }
}
