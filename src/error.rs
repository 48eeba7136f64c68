//! Error types for Gaze RQA
//!
//! The metric engine itself never fails: degenerate inputs produce zeros.
//! These errors only arise at the boundaries (parsing, validation, config).

use thiserror::Error;

/// Errors that can occur while preparing input or encoding output
#[derive(Debug, Error)]
pub enum RqaError {
    #[error("Failed to parse fixation input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid fixation at index {index}: {source}")]
    InvalidFixation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Invalid recurrence matrix: {0}")]
    InvalidMatrix(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Validation errors for individual fixation records
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("timestamp must be a finite number, got {0}")]
    NonFiniteTimestamp(f64),

    #[error("coordinate {axis} must be a finite number, got {value}")]
    NonFiniteCoordinate { axis: &'static str, value: f64 },

    #[error("coordinates must be given as a pair, only {present} is present")]
    UnpairedCoordinate { present: &'static str },
}
