//! Cascade Core
//!
//! Implementations of the two-stage streaming detector: window statistics,
//! the first-layer tests, the candidate buffer, residual modelling, the
//! isolation forest, the second-layer validator and the pipeline driver.

mod buffer;
mod first_layer;
mod forest;
mod pipeline;
mod residual;
mod sinks;
mod statistics;
mod validator;

pub use buffer::*;
pub use first_layer::*;
pub use forest::*;
pub use pipeline::*;
pub use residual::*;
pub use sinks::*;
pub use statistics::*;
pub use validator::*;
