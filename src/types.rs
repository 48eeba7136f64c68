//! Core types for the Gaze RQA pipeline
//!
//! This module defines the data structures that flow through each stage:
//! fixations and sequences in, metric reports and snapshots out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

use crate::config::RqaConfig;

/// A single gaze fixation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    /// Fixation index as assigned by the producer
    pub id: u64,
    /// Onset time in milliseconds
    pub timestamp: f64,
    /// Horizontal screen coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Vertical screen coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// AOI labels; an empty string means "no AOI", several labels model overlapping regions
    #[serde(default)]
    pub aoi: Vec<String>,
}

impl Fixation {
    /// Create a fixation without coordinates
    pub fn new(id: u64, timestamp: f64, aoi: Vec<String>) -> Self {
        Self {
            id,
            timestamp,
            x: None,
            y: None,
            aoi,
        }
    }

    /// Attach screen coordinates
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Both coordinates, if present and finite
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    /// Iterate over labels that actually name an AOI
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.aoi.iter().map(String::as_str).filter(|l| !l.is_empty())
    }

    /// Whether the fixation falls inside at least one AOI
    pub fn has_label(&self) -> bool {
        self.labels().next().is_some()
    }

    /// Whether two fixations share at least one non-empty AOI label
    pub fn shares_label_with(&self, other: &Fixation) -> bool {
        self.labels().any(|label| other.aoi.iter().any(|o| o == label))
    }

    /// Euclidean distance to another fixation; `None` when either lacks coordinates
    pub fn distance_to(&self, other: &Fixation) -> Option<f64> {
        let (x1, y1) = self.position()?;
        let (x2, y2) = other.position()?;
        Some((x1 - x2).hypot(y1 - y2))
    }
}

/// Ordered fixations; index order is temporal order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixationSequence(Vec<Fixation>);

impl FixationSequence {
    pub fn new(fixations: Vec<Fixation>) -> Self {
        Self(fixations)
    }

    /// Build a coordinate-free sequence from one label per fixation
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                Fixation::new(i as u64 + 1, i as f64 * 100.0, vec![label.as_ref().to_string()])
            })
            .collect()
    }

    pub fn into_inner(self) -> Vec<Fixation> {
        self.0
    }
}

impl Deref for FixationSequence {
    type Target = [Fixation];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Fixation>> for FixationSequence {
    fn from(fixations: Vec<Fixation>) -> Self {
        Self(fixations)
    }
}

impl FromIterator<Fixation> for FixationSequence {
    fn from_iter<I: IntoIterator<Item = Fixation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A sequence tagged with the participant or trial it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSequence {
    pub label: String,
    pub fixations: FixationSequence,
}

impl LabeledSequence {
    pub fn new(label: impl Into<String>, fixations: FixationSequence) -> Self {
        Self {
            label: label.into(),
            fixations,
        }
    }
}

/// Recurrence predicate used to build the matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceMethod {
    /// Fixations recur when they share a non-empty AOI label
    #[default]
    LabelOverlap,
    /// Fixations recur when close in space but in different contiguous groups
    Proximity,
    /// Label overlap, excluding pairs inside the same contiguous AOI block
    SelfTransitionCorrected,
}

impl RecurrenceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceMethod::LabelOverlap => "label_overlap",
            RecurrenceMethod::Proximity => "proximity",
            RecurrenceMethod::SelfTransitionCorrected => "self_transition_corrected",
        }
    }

    /// Whether the predicate looks at AOI labels rather than coordinates
    pub fn uses_labels(&self) -> bool {
        !matches!(self, RecurrenceMethod::Proximity)
    }
}

/// Names of the metrics in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    RecurrenceRate,
    Determinism,
    Laminarity,
    HorizontalLaminarity,
    VerticalLaminarity,
    DetLamDifference,
    ConsecutiveFixationRatio,
    Corm,
    AvgDiagonalLength,
    MaxDiagonalLength,
    DiagonalLineCount,
    RecurrencePoints,
}

impl MetricName {
    pub const ALL: [MetricName; 12] = [
        MetricName::RecurrenceRate,
        MetricName::Determinism,
        MetricName::Laminarity,
        MetricName::HorizontalLaminarity,
        MetricName::VerticalLaminarity,
        MetricName::DetLamDifference,
        MetricName::ConsecutiveFixationRatio,
        MetricName::Corm,
        MetricName::AvgDiagonalLength,
        MetricName::MaxDiagonalLength,
        MetricName::DiagonalLineCount,
        MetricName::RecurrencePoints,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RecurrenceRate => "recurrenceRate",
            MetricName::Determinism => "determinism",
            MetricName::Laminarity => "laminarity",
            MetricName::HorizontalLaminarity => "horizontalLaminarity",
            MetricName::VerticalLaminarity => "verticalLaminarity",
            MetricName::DetLamDifference => "detLamDifference",
            MetricName::ConsecutiveFixationRatio => "consecutiveFixationRatio",
            MetricName::Corm => "corm",
            MetricName::AvgDiagonalLength => "avgDiagonalLength",
            MetricName::MaxDiagonalLength => "maxDiagonalLength",
            MetricName::DiagonalLineCount => "diagonalLineCount",
            MetricName::RecurrencePoints => "recurrencePoints",
        }
    }

    /// Whether the value is a percentage in [0, 100]
    pub fn is_percentage(&self) -> bool {
        !matches!(
            self,
            MetricName::AvgDiagonalLength
                | MetricName::MaxDiagonalLength
                | MetricName::DiagonalLineCount
                | MetricName::RecurrencePoints
        )
    }
}

/// Metric name to value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricReport(BTreeMap<MetricName, f64>);

impl MetricReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: MetricName, value: f64) {
        self.0.insert(name, value);
    }

    /// Value of a metric; absent metrics read as 0
    pub fn get(&self, name: MetricName) -> f64 {
        self.0.get(&name).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, f64)> + '_ {
        self.0.iter().map(|(name, value)| (*name, *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Quality flag indicating conditions that make metrics less informative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    EmptySequence,
    ShortSequence,
    NoRecurrence,
    MissingCoordinates,
    UnlabeledFixations,
}

/// Snapshot producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RqaProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Snapshot provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RqaProvenance {
    pub sequence_label: Option<String>,
    pub method: RecurrenceMethod,
    pub fixation_count: usize,
    pub duration_ms: f64,
    pub computed_at_utc: String,
}

/// Snapshot quality summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RqaQuality {
    pub fixation_count: usize,
    pub recurrence_points: usize,
    pub flags: Vec<QualityFlag>,
}

/// Complete RQA output for one sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RqaSnapshot {
    pub rqa_version: String,
    pub producer: RqaProducer,
    pub provenance: RqaProvenance,
    pub config: RqaConfig,
    pub quality: RqaQuality,
    pub metrics: MetricReport,
}
