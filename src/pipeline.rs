//! Pipeline orchestration
//!
//! This module provides the public API for Gaze RQA.
//! It orchestrates the full pipeline from fixation JSON to snapshot output.

use crate::adapter::FixationAdapter;
use crate::config::RqaConfig;
use crate::encoder::{AnalyzedSequence, SnapshotEncoder};
use crate::error::RqaError;
use crate::matrix::{MatrixBuilder, RecurrenceMatrix};
use crate::metrics::MetricEngine;
use crate::types::{Fixation, LabeledSequence, MetricReport, RqaSnapshot};

/// Convert a JSON array of fixations into a snapshot JSON string.
///
/// # Arguments
/// * `fixations_json` - JSON array of fixation records
/// * `config` - Recurrence method, minimum line length and proximity threshold
///
/// # Example
/// ```ignore
/// let snapshot = fixations_to_rqa(fixations_json, &RqaConfig::default())?;
/// ```
pub fn fixations_to_rqa(fixations_json: String, config: &RqaConfig) -> Result<String, RqaError> {
    let processor = RqaProcessor::with_config(config.clone())?;
    processor.process_json(&fixations_json, None)
}

/// Compute a metric report straight from fixations, without snapshot metadata.
///
/// Pipeline stages:
/// 1. MatrixBuilder - Build the recurrence matrix
/// 2. MetricEngine - Scan lines and compute metrics
pub fn analyze(fixations: &[Fixation], config: &RqaConfig) -> (RecurrenceMatrix, MetricReport) {
    let matrix = MatrixBuilder::build(fixations, config);
    let metrics = MetricEngine::report(&matrix, config.min_line_length);
    (matrix, metrics)
}

/// Reusable processor holding a validated configuration and one encoder.
///
/// Snapshots produced by the same processor share a producer instance ID,
/// which keeps batch output traceable to a single run.
#[derive(Debug, Clone)]
pub struct RqaProcessor {
    config: RqaConfig,
    encoder: SnapshotEncoder,
}

impl Default for RqaProcessor {
    fn default() -> Self {
        Self {
            config: RqaConfig::default(),
            encoder: SnapshotEncoder::new(),
        }
    }
}

impl RqaProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with a specific configuration
    pub fn with_config(config: RqaConfig) -> Result<Self, RqaError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: SnapshotEncoder::new(),
        })
    }

    pub fn config(&self) -> &RqaConfig {
        &self.config
    }

    /// Build only the recurrence matrix, e.g. for heatmap rendering
    pub fn build_matrix(&self, fixations: &[Fixation]) -> RecurrenceMatrix {
        MatrixBuilder::build(fixations, &self.config)
    }

    /// Analyze one sequence into a snapshot
    pub fn process(&self, fixations: &[Fixation], label: Option<&str>) -> RqaSnapshot {
        let (matrix, metrics) = analyze(fixations, &self.config);

        tracing::debug!(
            label = label.unwrap_or("-"),
            fixations = fixations.len(),
            "sequence analyzed"
        );

        self.encoder.encode(
            AnalyzedSequence {
                label,
                fixations,
                matrix: &matrix,
                metrics: &metrics,
            },
            &self.config,
        )
    }

    /// Analyze labeled sequences for comparison, ordered by label
    pub fn process_batch(&self, sequences: &[LabeledSequence]) -> Vec<RqaSnapshot> {
        let mut ordered: Vec<&LabeledSequence> = sequences.iter().collect();
        ordered.sort_by(|a, b| a.label.cmp(&b.label));

        ordered
            .into_iter()
            .map(|sequence| self.process(&sequence.fixations, Some(sequence.label.as_str())))
            .collect()
    }

    /// Parse, validate and analyze a JSON array of fixations
    pub fn process_json(&self, fixations_json: &str, label: Option<&str>) -> Result<String, RqaError> {
        let fixations = FixationAdapter::parse_array(fixations_json)?;
        FixationAdapter::ensure_valid(&fixations)?;

        let snapshot = self.process(&fixations, label);
        serde_json::to_string_pretty(&snapshot).map_err(|e| RqaError::EncodingError(e.to_string()))
    }
}
