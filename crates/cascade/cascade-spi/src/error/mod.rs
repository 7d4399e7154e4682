//! Error types for the cascade pipeline.
//!
//! This module contains error types and the Result alias.

mod cascade_error;

pub use cascade_error::{CascadeError, Result};
