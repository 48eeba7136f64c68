//! Recurrence matrix construction
//!
//! A recurrence matrix is an N×N binary matrix over fixation indices. It is
//! always symmetric with a diagonal of ones, whichever predicate built it.
//! Predicates:
//! - Label overlap: fixations share a non-empty AOI label
//! - Proximity: fixations lie within a distance threshold and belong to
//!   different contiguous groups
//! - Self-transition corrected: label overlap across different contiguous
//!   AOI blocks only

use serde::ser::{Serialize, Serializer};

use crate::config::RqaConfig;
use crate::error::RqaError;
use crate::types::{Fixation, RecurrenceMethod};

/// Binary N×N recurrence matrix stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceMatrix {
    size: usize,
    cells: Vec<u8>,
}

impl RecurrenceMatrix {
    /// Matrix where every fixation recurs only with itself
    pub fn identity(size: usize) -> Self {
        let mut cells = vec![0; size * size];
        for i in 0..size {
            cells[i * size + i] = 1;
        }
        Self { size, cells }
    }

    /// Matrix where every pair of fixations recurs
    pub fn full(size: usize) -> Self {
        Self {
            size,
            cells: vec![1; size * size],
        }
    }

    /// Build from nested rows, checking shape, values, symmetry and diagonal
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, RqaError> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(RqaError::InvalidMatrix(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            if let Some(value) = row.iter().find(|v| **v > 1) {
                return Err(RqaError::InvalidMatrix(format!(
                    "row {i} contains non-binary value {value}"
                )));
            }
            cells.extend_from_slice(row);
        }

        let matrix = Self { size, cells };

        for i in 0..size {
            if matrix.get(i, i) != 1 {
                return Err(RqaError::InvalidMatrix(format!(
                    "diagonal cell ({i}, {i}) must be 1"
                )));
            }
        }
        if let Some((i, j)) = matrix
            .upper_triangle()
            .find(|&(i, j)| matrix.get(i, j) != matrix.get(j, i))
        {
            return Err(RqaError::InvalidMatrix(format!(
                "cells ({i}, {j}) and ({j}, {i}) differ"
            )));
        }

        Ok(matrix)
    }

    /// Number of fixations N
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Cell value (0 or 1); panics if out of bounds
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[i * self.size + j]
    }

    pub fn is_recurrent(&self, i: usize, j: usize) -> bool {
        self.get(i, j) == 1
    }

    /// Nested rows, as consumed by heatmap renderers
    pub fn rows(&self) -> Vec<Vec<u8>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.size).map(<[u8]>::to_vec).collect()
    }

    /// Every upper-triangle cell (i < j) in row-major order.
    ///
    /// This is the one traversal used by the builders, the line scanner and
    /// the metric engine.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.size;
        (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
    }

    /// Upper-triangle cells that hold a 1
    pub fn recurrent_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.upper_triangle()
            .filter(move |&(i, j)| self.is_recurrent(i, j))
    }

    fn mark_pair(&mut self, i: usize, j: usize) {
        self.cells[i * self.size + j] = 1;
        self.cells[j * self.size + i] = 1;
    }
}

impl Serialize for RecurrenceMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

/// Builder turning fixation sequences into recurrence matrices
pub struct MatrixBuilder;

impl MatrixBuilder {
    /// Build with the predicate selected in the configuration
    pub fn build(fixations: &[Fixation], config: &RqaConfig) -> RecurrenceMatrix {
        tracing::debug!(
            method = config.method.as_str(),
            fixations = fixations.len(),
            "building recurrence matrix"
        );

        match config.method {
            RecurrenceMethod::LabelOverlap => Self::by_label_overlap(fixations),
            RecurrenceMethod::Proximity => {
                Self::by_proximity(fixations, config.proximity_threshold)
            }
            RecurrenceMethod::SelfTransitionCorrected => {
                Self::self_transition_corrected(fixations)
            }
        }
    }

    /// Fixations recur when they share at least one non-empty AOI label
    pub fn by_label_overlap(fixations: &[Fixation]) -> RecurrenceMatrix {
        let mut matrix = RecurrenceMatrix::identity(fixations.len());

        for (i, j) in matrix.upper_triangle() {
            if fixations[i].shares_label_with(&fixations[j]) {
                matrix.mark_pair(i, j);
            }
        }

        matrix
    }

    /// Fixations recur when closer than `threshold` and in different contiguous groups.
    ///
    /// A fixation without usable coordinates is never within threshold of anything,
    /// so it always starts a new group and never recurs off the diagonal.
    pub fn by_proximity(fixations: &[Fixation], threshold: f64) -> RecurrenceMatrix {
        let within = |a: &Fixation, b: &Fixation| {
            a.distance_to(b).is_some_and(|distance| distance < threshold)
        };

        let groups = contiguous_groups(fixations, within);
        let mut matrix = RecurrenceMatrix::identity(fixations.len());

        for (i, j) in matrix.upper_triangle() {
            if groups[i] != groups[j] && within(&fixations[i], &fixations[j]) {
                matrix.mark_pair(i, j);
            }
        }

        matrix
    }

    /// Label overlap with consecutive same-AOI fixations collapsed into blocks.
    ///
    /// Dwelling inside one AOI does not count as recurrence; returning to it
    /// after leaving does.
    pub fn self_transition_corrected(fixations: &[Fixation]) -> RecurrenceMatrix {
        let groups = contiguous_groups(fixations, Fixation::shares_label_with);
        let mut matrix = RecurrenceMatrix::identity(fixations.len());

        for (i, j) in matrix.upper_triangle() {
            if groups[i] != groups[j] && fixations[i].shares_label_with(&fixations[j]) {
                matrix.mark_pair(i, j);
            }
        }

        matrix
    }
}

/// Assign group indices in one forward pass: fixation i joins the group of
/// fixation i-1 when `same_group` holds for the pair, otherwise starts a new one.
fn contiguous_groups<F>(fixations: &[Fixation], same_group: F) -> Vec<usize>
where
    F: Fn(&Fixation, &Fixation) -> bool,
{
    let mut groups = Vec::with_capacity(fixations.len());
    let mut current = 0;

    for (i, fixation) in fixations.iter().enumerate() {
        if i > 0 && !same_group(fixation, &fixations[i - 1]) {
            current += 1;
        }
        groups.push(current);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FixationSequence;
    use pretty_assertions::assert_eq;

    fn at(id: u64, x: f64, y: f64) -> Fixation {
        Fixation::new(id, id as f64 * 100.0, vec![]).with_position(x, y)
    }

    fn assert_invariants(matrix: &RecurrenceMatrix, n: usize) {
        assert_eq!(matrix.size(), n);
        for i in 0..n {
            assert_eq!(matrix.get(i, i), 1, "diagonal at {i}");
            for j in 0..n {
                assert_eq!(matrix.get(i, j), matrix.get(j, i), "symmetry at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_label_overlap_scenario() {
        let sequence = FixationSequence::from_labels(&["A", "A", "B", "A", "B"]);
        let matrix = MatrixBuilder::by_label_overlap(&sequence);

        assert_invariants(&matrix, 5);
        let pairs: Vec<_> = matrix.recurrent_pairs().collect();
        assert_eq!(pairs, vec![(0, 1), (0, 3), (1, 3), (2, 4)]);
    }

    #[test]
    fn test_label_overlap_degenerate_sizes() {
        let empty = MatrixBuilder::by_label_overlap(&[]);
        assert!(empty.is_empty());
        assert!(empty.rows().is_empty());

        let single = MatrixBuilder::by_label_overlap(&FixationSequence::from_labels(&["A"]));
        assert_eq!(single.rows(), vec![vec![1]]);
    }

    #[test]
    fn test_empty_labels_never_recur() {
        let sequence = FixationSequence::from_labels(&["", "", "A"]);
        let matrix = MatrixBuilder::by_label_overlap(&sequence);

        assert_eq!(matrix, RecurrenceMatrix::identity(3));
    }

    #[test]
    fn test_overlapping_labels() {
        let fixations = vec![
            Fixation::new(1, 0.0, vec!["menu".into(), "header".into()]),
            Fixation::new(2, 100.0, vec!["body".into()]),
            Fixation::new(3, 200.0, vec!["header".into()]),
        ];
        let matrix = MatrixBuilder::by_label_overlap(&fixations);

        assert!(matrix.is_recurrent(0, 2));
        assert!(!matrix.is_recurrent(0, 1));
        assert!(!matrix.is_recurrent(1, 2));
    }

    #[test]
    fn test_proximity_excludes_same_group() {
        // 0 and 1 are close (same group), 2 jumps away, 3 comes back near 0
        let fixations = vec![
            at(0, 100.0, 100.0),
            at(1, 120.0, 100.0),
            at(2, 600.0, 600.0),
            at(3, 110.0, 110.0),
        ];
        let matrix = MatrixBuilder::by_proximity(&fixations, 100.0);

        assert_invariants(&matrix, 4);
        assert!(!matrix.is_recurrent(0, 1));
        assert!(matrix.is_recurrent(0, 3));
        assert!(matrix.is_recurrent(1, 3));
        assert!(!matrix.is_recurrent(2, 3));
        assert!(!matrix.is_recurrent(0, 2));
    }

    #[test]
    fn test_proximity_threshold_is_strict() {
        let fixations = vec![at(0, 0.0, 0.0), at(1, 500.0, 0.0), at(2, 100.0, 0.0)];
        let matrix = MatrixBuilder::by_proximity(&fixations, 100.0);

        // distance exactly 100 is not within threshold
        assert!(!matrix.is_recurrent(0, 2));

        let matrix = MatrixBuilder::by_proximity(&fixations, 100.5);
        assert!(matrix.is_recurrent(0, 2));
    }

    #[test]
    fn test_proximity_missing_coordinates_are_far() {
        let fixations = vec![
            at(0, 0.0, 0.0),
            Fixation::new(1, 100.0, vec![]),
            at(2, 0.0, 0.0),
            Fixation::new(3, 300.0, vec![]),
        ];
        let matrix = MatrixBuilder::by_proximity(&fixations, 100.0);

        assert_invariants(&matrix, 4);
        assert!(matrix.is_recurrent(0, 2));
        assert!(!matrix.is_recurrent(1, 3));
        assert!(!matrix.is_recurrent(0, 1));
    }

    #[test]
    fn test_proximity_zero_coordinates_are_real() {
        let fixations = vec![at(0, 0.0, 0.0), at(1, 900.0, 900.0), at(2, 0.0, 1.0)];
        let matrix = MatrixBuilder::by_proximity(&fixations, 100.0);

        assert!(matrix.is_recurrent(0, 2));
    }

    #[test]
    fn test_self_transition_corrected() {
        let sequence = FixationSequence::from_labels(&["A", "A", "B", "A", "B"]);
        let matrix = MatrixBuilder::self_transition_corrected(&sequence);

        assert_invariants(&matrix, 5);
        let pairs: Vec<_> = matrix.recurrent_pairs().collect();
        assert_eq!(pairs, vec![(0, 3), (1, 3), (2, 4)]);
    }

    #[test]
    fn test_build_dispatches_on_method() {
        let sequence = FixationSequence::from_labels(&["A", "A"]);

        let config = RqaConfig::default();
        assert!(MatrixBuilder::build(&sequence, &config).is_recurrent(0, 1));

        let config = config.with_method(RecurrenceMethod::SelfTransitionCorrected);
        assert!(!MatrixBuilder::build(&sequence, &config).is_recurrent(0, 1));

        let config = config.with_method(RecurrenceMethod::Proximity);
        assert!(!MatrixBuilder::build(&sequence, &config).is_recurrent(0, 1));
    }

    #[test]
    fn test_upper_triangle_order() {
        let matrix = RecurrenceMatrix::identity(4);
        let cells: Vec<_> = matrix.upper_triangle().collect();

        assert_eq!(cells, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_from_rows_validation() {
        assert!(RecurrenceMatrix::from_rows(&[vec![1, 0], vec![0, 1]]).is_ok());
        assert!(RecurrenceMatrix::from_rows(&[vec![1, 0], vec![1, 1]]).is_err());
        assert!(RecurrenceMatrix::from_rows(&[vec![0, 0], vec![0, 1]]).is_err());
        assert!(RecurrenceMatrix::from_rows(&[vec![1, 2], vec![2, 1]]).is_err());
        assert!(RecurrenceMatrix::from_rows(&[vec![1, 0]]).is_err());
    }

    #[test]
    fn test_serializes_as_nested_rows() {
        let matrix = RecurrenceMatrix::full(2);
        let json = serde_json::to_string(&matrix).unwrap();
        assert_eq!(json, "[[1,1],[1,1]]");
    }
}
