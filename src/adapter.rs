//! Adapter for fixation input
//!
//! Accepts fixation sequences that have already been column-mapped by the
//! ingestion layer and serialized as JSON: a plain array, one fixation per
//! line (NDJSON), or an array of labeled groups.

use crate::error::{RqaError, ValidationError};
use crate::types::{Fixation, FixationSequence, LabeledSequence};

/// Adapter for parsing and validating fixation input
pub struct FixationAdapter;

impl FixationAdapter {
    /// Parse a JSON array of fixations
    pub fn parse_array(json: &str) -> Result<FixationSequence, RqaError> {
        let sequence: FixationSequence = serde_json::from_str(json)?;
        Ok(sequence)
    }

    /// Parse NDJSON (newline-delimited JSON), one fixation per line
    pub fn parse_ndjson(ndjson: &str) -> Result<FixationSequence, RqaError> {
        let mut fixations = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Fixation>(trimmed) {
                Ok(fixation) => fixations.push(fixation),
                Err(e) => {
                    return Err(RqaError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(FixationSequence::new(fixations))
    }

    /// Parse a JSON array of `{label, fixations}` groups, sorted by label
    pub fn parse_groups(json: &str) -> Result<Vec<LabeledSequence>, RqaError> {
        let mut groups: Vec<LabeledSequence> = serde_json::from_str(json)?;
        groups.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(groups)
    }

    /// Check a single fixation for values the engine cannot interpret
    pub fn validate(fixation: &Fixation) -> Result<(), ValidationError> {
        if !fixation.timestamp.is_finite() {
            return Err(ValidationError::NonFiniteTimestamp(fixation.timestamp));
        }

        match (fixation.x, fixation.y) {
            (Some(_), None) => return Err(ValidationError::UnpairedCoordinate { present: "x" }),
            (None, Some(_)) => return Err(ValidationError::UnpairedCoordinate { present: "y" }),
            _ => {}
        }

        for (axis, value) in [("x", fixation.x), ("y", fixation.y)] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(ValidationError::NonFiniteCoordinate { axis, value });
                }
            }
        }

        Ok(())
    }

    /// Validate a sequence, listing only the records that fail
    pub fn validate_sequence(fixations: &[Fixation]) -> Vec<ValidationResult> {
        fixations
            .iter()
            .enumerate()
            .filter_map(|(index, fixation)| {
                Self::validate(fixation).err().map(|error| ValidationResult {
                    index,
                    fixation_id: fixation.id,
                    error,
                })
            })
            .collect()
    }

    /// Fail on the first invalid record
    pub fn ensure_valid(fixations: &[Fixation]) -> Result<(), RqaError> {
        for (index, fixation) in fixations.iter().enumerate() {
            Self::validate(fixation)
                .map_err(|source| RqaError::InvalidFixation { index, source })?;
        }
        Ok(())
    }
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub fixation_id: u64,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {"id": 1, "timestamp": 0, "aoi": ["menu"]},
            {"id": 2, "timestamp": 250, "x": 400.5, "y": 300, "aoi": ["body", "ad"]}
        ]"#;

        let sequence = FixationAdapter::parse_array(json).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[1].position(), Some((400.5, 300.0)));
        assert_eq!(sequence[1].aoi, vec!["body".to_string(), "ad".to_string()]);
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let ndjson = "{\"id\": 1, \"timestamp\": 0, \"aoi\": [\"A\"]}\n\n{\"id\": 2, \"timestamp\": 90, \"aoi\": [\"B\"]}\n";

        let sequence = FixationAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[0].id, 1);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"id\": 1, \"timestamp\": 0}\nnot json\n";

        match FixationAdapter::parse_ndjson(ndjson) {
            Err(RqaError::ParseError(msg)) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_groups_sorted_by_label() {
        let json = r#"[
            {"label": "participant-b", "fixations": [{"id": 1, "timestamp": 0}]},
            {"label": "participant-a", "fixations": []}
        ]"#;

        let groups = FixationAdapter::parse_groups(json).unwrap();
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["participant-a", "participant-b"]);
        assert_eq!(groups[1].fixations.len(), 1);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            FixationAdapter::parse_array("{"),
            Err(RqaError::JsonError(_))
        ));
    }

    #[test]
    fn test_validation() {
        let ok = Fixation::new(1, 0.0, vec!["A".into()]).with_position(1.0, 2.0);
        assert!(FixationAdapter::validate(&ok).is_ok());

        let mut unpaired = ok.clone();
        unpaired.y = None;
        assert_eq!(
            FixationAdapter::validate(&unpaired),
            Err(ValidationError::UnpairedCoordinate { present: "x" })
        );

        let bad_time = Fixation::new(2, f64::NAN, vec![]);
        assert!(matches!(
            FixationAdapter::validate(&bad_time),
            Err(ValidationError::NonFiniteTimestamp(_))
        ));

        let bad_x = Fixation::new(3, 0.0, vec![]).with_position(f64::INFINITY, 0.0);
        assert!(matches!(
            FixationAdapter::validate(&bad_x),
            Err(ValidationError::NonFiniteCoordinate { axis: "x", .. })
        ));
    }

    #[test]
    fn test_validate_sequence_lists_failures() {
        let fixations = vec![
            Fixation::new(10, 0.0, vec![]),
            Fixation::new(11, f64::INFINITY, vec![]),
            Fixation::new(12, 20.0, vec![]),
        ];

        let failures = FixationAdapter::validate_sequence(&fixations);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].fixation_id, 11);

        assert!(matches!(
            FixationAdapter::ensure_valid(&fixations),
            Err(RqaError::InvalidFixation { index: 1, .. })
        ));
    }
}
