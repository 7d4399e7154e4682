//! Cascade Facade
//!
//! Unified re-exports for the cascade anomaly detector.
//!
//! This facade provides a single entry point:
//! - `OutlierModel` and `PipelineSink` contracts and the data model from SPI
//! - Configuration types and policies from API
//! - The first layer, isolation forest, validator and `Pipeline` from Core

// Re-export everything from SPI
pub use cascade_spi::*;

// Re-export everything from API
pub use cascade_api::*;

// Re-export everything from Core
pub use cascade_core::*;

/// The types most programs need.
pub mod prelude {
    pub use cascade_api::{PipelineConfig, PipelineConfigBuilder};
    pub use cascade_core::{IsolationForest, NullSink, Pipeline, RecordingSink, TracingSink};
    pub use cascade_spi::{
        CascadeError, ConfirmedAnomaly, Observation, OutlierModel, PipelineSink, Result,
    };
}
