//! Contract definitions for the cascade pipeline.
//!
//! This module contains the trait seams: the second-layer outlier model and
//! the sink that consumes pipeline output.

mod outlier_model;
mod pipeline_sink;

pub use outlier_model::OutlierModel;
pub use pipeline_sink::PipelineSink;
