//! Snapshot encoding
//!
//! This module wraps a metric report in an `RqaSnapshot` carrying producer,
//! provenance and quality metadata, and serializes it to JSON.

use chrono::Utc;
use uuid::Uuid;

use crate::config::RqaConfig;
use crate::error::RqaError;
use crate::matrix::RecurrenceMatrix;
use crate::scanner::count_upper_triangle_ones;
use crate::types::{
    Fixation, MetricReport, QualityFlag, RqaProducer, RqaProvenance, RqaQuality, RqaSnapshot,
};
use crate::{PRODUCER_NAME, RQA_VERSION};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Everything the encoder needs about one analyzed sequence
#[derive(Debug, Clone, Copy)]
pub struct AnalyzedSequence<'a> {
    pub label: Option<&'a str>,
    pub fixations: &'a [Fixation],
    pub matrix: &'a RecurrenceMatrix,
    pub metrics: &'a MetricReport,
}

/// Snapshot encoder with a stable producer instance ID
#[derive(Debug, Clone)]
pub struct SnapshotEncoder {
    instance_id: String,
}

impl Default for SnapshotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode an analyzed sequence into a snapshot
    pub fn encode(&self, analyzed: AnalyzedSequence<'_>, config: &RqaConfig) -> RqaSnapshot {
        let producer = RqaProducer {
            name: PRODUCER_NAME.to_string(),
            version: RQA_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = RqaProvenance {
            sequence_label: analyzed.label.map(str::to_string),
            method: config.method,
            fixation_count: analyzed.fixations.len(),
            duration_ms: duration_ms(analyzed.fixations),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        let quality = build_quality(analyzed, config);

        RqaSnapshot {
            rqa_version: SNAPSHOT_VERSION.to_string(),
            producer,
            provenance,
            config: config.clone(),
            quality,
            metrics: analyzed.metrics.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        analyzed: AnalyzedSequence<'_>,
        config: &RqaConfig,
    ) -> Result<String, RqaError> {
        let snapshot = self.encode(analyzed, config);
        serde_json::to_string_pretty(&snapshot).map_err(|e| RqaError::EncodingError(e.to_string()))
    }
}

fn duration_ms(fixations: &[Fixation]) -> f64 {
    match (fixations.first(), fixations.last()) {
        (Some(first), Some(last)) => (last.timestamp - first.timestamp).max(0.0),
        _ => 0.0,
    }
}

fn build_quality(analyzed: AnalyzedSequence<'_>, config: &RqaConfig) -> RqaQuality {
    let fixation_count = analyzed.fixations.len();
    let recurrence_points = count_upper_triangle_ones(analyzed.matrix);
    let mut flags = Vec::new();

    if fixation_count == 0 {
        flags.push(QualityFlag::EmptySequence);
    } else if fixation_count <= config.min_line_length.max(1) {
        flags.push(QualityFlag::ShortSequence);
    }

    if fixation_count >= 2 && recurrence_points == 0 {
        flags.push(QualityFlag::NoRecurrence);
    }

    if config.method.uses_labels() {
        if analyzed.fixations.iter().any(|f| !f.has_label()) {
            flags.push(QualityFlag::UnlabeledFixations);
        }
    } else if analyzed.fixations.iter().any(|f| f.position().is_none()) {
        flags.push(QualityFlag::MissingCoordinates);
    }

    RqaQuality {
        fixation_count,
        recurrence_points,
        flags,
    }
}
