//! Cascade pipeline error types.

use thiserror::Error;

/// Errors raised by detection and validation routines.
///
/// None of these terminate a pipeline run: the driver resolves
/// `InsufficientHistory`, `EmptyValidationInput` and `ModelFit` locally by
/// skipping the routine. Only `InvalidParameter` escapes, and only from
/// pipeline construction.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("Insufficient history: required {required}, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Empty validation input: {0}")]
    EmptyValidationInput(String),

    #[error("Model fit failed: {0}")]
    ModelFit(String),

    #[error("Model not fitted: call fit() before scoring")]
    NotFitted,

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl CascadeError {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for the errors a validation pass treats as "nothing to confirm".
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientHistory { .. } | Self::EmptyValidationInput(_) | Self::ModelFit(_)
        )
    }
}

/// Result type for cascade operations.
pub type Result<T> = std::result::Result<T, CascadeError>;
