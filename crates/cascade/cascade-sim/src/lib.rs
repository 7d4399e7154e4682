//! Cascade Sim
//!
//! Synthetic scalar stream for exercising the detector: a random-walk trend,
//! two seasonal terms with jittered amplitude, heteroscedastic Gaussian noise
//! and occasional spikes.

mod generator;
mod stream;

pub use generator::{GeneratorConfig, GeneratorState};
pub use stream::SyntheticStream;
