//! Configuration for recurrence analysis.

use serde::{Deserialize, Serialize};

use crate::error::RqaError;
use crate::types::RecurrenceMethod;

/// Default minimum length for a run to count as a line
pub const DEFAULT_MIN_LINE_LENGTH: usize = 2;

/// Default distance threshold (screen units, usually pixels) for the proximity predicate
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 100.0;

/// Analysis parameters shared by matrix construction and metric computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RqaConfig {
    /// Recurrence predicate
    pub method: RecurrenceMethod,

    /// Minimum run length L for diagonal, horizontal and vertical lines
    pub min_line_length: usize,

    /// Distance below which two fixations may recur (proximity method only)
    pub proximity_threshold: f64,
}

impl Default for RqaConfig {
    fn default() -> Self {
        Self {
            method: RecurrenceMethod::default(),
            min_line_length: DEFAULT_MIN_LINE_LENGTH,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
        }
    }
}

impl RqaConfig {
    pub fn with_method(mut self, method: RecurrenceMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_min_line_length(mut self, min_line_length: usize) -> Self {
        self.min_line_length = min_line_length;
        self
    }

    pub fn with_proximity_threshold(mut self, threshold: f64) -> Self {
        self.proximity_threshold = threshold;
        self
    }

    /// Parse configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RqaError> {
        let config: RqaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter values that have no meaningful interpretation.
    pub fn validate(&self) -> Result<(), RqaError> {
        if self.min_line_length == 0 {
            return Err(RqaError::InvalidConfig(
                "min_line_length must be at least 1".to_string(),
            ));
        }

        if !self.proximity_threshold.is_finite() || self.proximity_threshold <= 0.0 {
            return Err(RqaError::InvalidConfig(format!(
                "proximity_threshold must be a positive number, got {}",
                self.proximity_threshold
            )));
        }

        Ok(())
    }
}
