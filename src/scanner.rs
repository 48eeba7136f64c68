//! Line detection over the upper triangle of a recurrence matrix
//!
//! A line is a maximal chain of recurrent cells along one direction, counted
//! only when its length reaches the configured minimum. Every scan owns its
//! own consumption grid, so a cell is counted at most once per scan and no
//! state leaks between scans.

use serde::{Deserialize, Serialize};

use crate::matrix::RecurrenceMatrix;

/// Direction in which a line extends from its first cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Step (+1, +1): repeated fixation sub-sequences
    Diagonal,
    /// Fixed column, increasing row while row < column
    Horizontal,
    /// Fixed row, increasing column
    Vertical,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Diagonal => "diagonal",
            Direction::Horizontal => "horizontal",
            Direction::Vertical => "vertical",
        }
    }

    /// Next cell after (i, j), if it is still inside the upper triangle
    fn step(self, (i, j): (usize, usize), size: usize) -> Option<(usize, usize)> {
        match self {
            Direction::Diagonal => (j + 1 < size).then_some((i + 1, j + 1)),
            Direction::Horizontal => (i + 1 < j).then_some((i + 1, j)),
            Direction::Vertical => (j + 1 < size).then_some((i, j + 1)),
        }
    }
}

/// Outcome of one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Recurrent points on qualifying lines
    pub points: usize,
    /// Number of qualifying lines
    pub lines: usize,
    /// Length of the longest qualifying line
    pub max_length: usize,
}

impl ScanSummary {
    /// Mean qualifying line length, 0 when there are none
    pub fn average_length(&self) -> f64 {
        if self.lines == 0 {
            return 0.0;
        }
        self.points as f64 / self.lines as f64
    }

    fn record(&mut self, length: usize) {
        self.points += length;
        self.lines += 1;
        self.max_length = self.max_length.max(length);
    }
}

/// Flat N×N record of cells already claimed by a line in the current scan
#[derive(Debug)]
struct ConsumedGrid {
    size: usize,
    cells: Vec<bool>,
}

impl ConsumedGrid {
    fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    fn contains(&self, (i, j): (usize, usize)) -> bool {
        self.cells[i * self.size + j]
    }

    fn insert(&mut self, (i, j): (usize, usize)) {
        self.cells[i * self.size + j] = true;
    }
}

/// Run-length detector for one direction and minimum line length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineScanner {
    direction: Direction,
    min_length: usize,
}

impl LineScanner {
    /// A minimum length below 1 is treated as 1
    pub fn new(direction: Direction, min_length: usize) -> Self {
        Self {
            direction,
            min_length: min_length.max(1),
        }
    }

    pub fn diagonal(min_length: usize) -> Self {
        Self::new(Direction::Diagonal, min_length)
    }

    pub fn horizontal(min_length: usize) -> Self {
        Self::new(Direction::Horizontal, min_length)
    }

    pub fn vertical(min_length: usize) -> Self {
        Self::new(Direction::Vertical, min_length)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Scan the upper triangle and summarize qualifying lines.
    ///
    /// Cells are visited in row-major order. An unclaimed recurrent cell starts
    /// a chain that is extended greedily along the direction through unclaimed
    /// recurrent cells; every cell on the chain is claimed.
    pub fn scan(&self, matrix: &RecurrenceMatrix) -> ScanSummary {
        let size = matrix.size();
        let mut consumed = ConsumedGrid::new(size);
        let mut summary = ScanSummary::default();

        for cell in matrix.upper_triangle() {
            if consumed.contains(cell) || !matrix.is_recurrent(cell.0, cell.1) {
                continue;
            }

            consumed.insert(cell);
            let mut length = 1;
            let mut current = cell;

            while let Some(next) = self.direction.step(current, size) {
                if consumed.contains(next) || !matrix.is_recurrent(next.0, next.1) {
                    break;
                }
                consumed.insert(next);
                length += 1;
                current = next;
            }

            if length >= self.min_length {
                summary.record(length);
            }
        }

        tracing::debug!(
            direction = self.direction.as_str(),
            size,
            min_length = self.min_length,
            points = summary.points,
            lines = summary.lines,
            max_length = summary.max_length,
            "line scan complete"
        );

        summary
    }
}

/// Number of recurrent cells strictly above the diagonal (R)
pub fn count_upper_triangle_ones(matrix: &RecurrenceMatrix) -> usize {
    matrix.recurrent_pairs().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixBuilder;
    use crate::types::FixationSequence;
    use pretty_assertions::assert_eq;

    fn matrix(rows: &[&[u8]]) -> RecurrenceMatrix {
        let rows: Vec<Vec<u8>> = rows.iter().map(|r| r.to_vec()).collect();
        RecurrenceMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_count_upper_triangle_ones() {
        let sequence = FixationSequence::from_labels(&["A", "A", "B", "A", "B"]);
        let m = MatrixBuilder::by_label_overlap(&sequence);

        assert_eq!(count_upper_triangle_ones(&m), 4);
        assert_eq!(count_upper_triangle_ones(&RecurrenceMatrix::identity(6)), 0);
        assert_eq!(count_upper_triangle_ones(&RecurrenceMatrix::full(5)), 10);
        assert_eq!(count_upper_triangle_ones(&RecurrenceMatrix::identity(0)), 0);
    }

    #[test]
    fn test_full_matrix_lines() {
        let m = RecurrenceMatrix::full(5);

        // diagonals of length 4, 3, 2 qualify; the corner cell does not
        let diagonal = LineScanner::diagonal(2).scan(&m);
        assert_eq!(
            diagonal,
            ScanSummary {
                points: 9,
                lines: 3,
                max_length: 4
            }
        );

        // columns of height 1..4 and rows of width 4..1
        assert_eq!(LineScanner::horizontal(2).scan(&m).points, 9);
        assert_eq!(LineScanner::vertical(2).scan(&m).points, 9);
    }

    #[test]
    fn test_diagonal_chain_is_counted_once() {
        let m = matrix(&[
            &[1, 1, 0, 0],
            &[1, 1, 1, 0],
            &[0, 1, 1, 1],
            &[0, 0, 1, 1],
        ]);

        let summary = LineScanner::diagonal(2).scan(&m);
        assert_eq!(summary.points, 3);
        assert_eq!(summary.lines, 1);
        assert_eq!(summary.max_length, 3);
        assert_eq!(summary.average_length(), 3.0);
    }

    #[test]
    fn test_vertical_and_horizontal_runs() {
        // row 0 recurs with 1, 2, 3; nothing else
        let m = matrix(&[
            &[1, 1, 1, 1],
            &[1, 1, 0, 0],
            &[1, 0, 1, 0],
            &[1, 0, 0, 1],
        ]);

        let vertical = LineScanner::vertical(2).scan(&m);
        assert_eq!(vertical.points, 3);
        assert_eq!(vertical.lines, 1);

        // each column holds a single point above the diagonal
        let horizontal = LineScanner::horizontal(2).scan(&m);
        assert_eq!(horizontal, ScanSummary::default());

        let horizontal = LineScanner::horizontal(1).scan(&m);
        assert_eq!(horizontal.points, 3);
        assert_eq!(horizontal.lines, 3);
    }

    #[test]
    fn test_min_length_filters_short_runs() {
        let m = RecurrenceMatrix::full(5);

        let summary = LineScanner::diagonal(4).scan(&m);
        assert_eq!(summary.points, 4);
        assert_eq!(summary.lines, 1);

        let summary = LineScanner::diagonal(5).scan(&m);
        assert_eq!(summary, ScanSummary::default());
    }

    #[test]
    fn test_zero_min_length_behaves_as_one() {
        let scanner = LineScanner::vertical(0);
        assert_eq!(scanner.min_length(), 1);

        let m = RecurrenceMatrix::full(4);
        assert_eq!(scanner.scan(&m).points, count_upper_triangle_ones(&m));
    }

    #[test]
    fn test_scan_never_exceeds_recurrence_points() {
        let sequences = [
            vec!["A", "B", "A", "B", "A", "B", "C"],
            vec!["A", "A", "A", "A"],
            vec!["A", "B", "C", "D"],
            vec!["X", "", "X", "", "X", "Y", "X"],
        ];

        for labels in sequences {
            let m = MatrixBuilder::by_label_overlap(&FixationSequence::from_labels(&labels));
            let r = count_upper_triangle_ones(&m);

            for direction in [Direction::Diagonal, Direction::Horizontal, Direction::Vertical] {
                for min_length in 1..4 {
                    let points = LineScanner::new(direction, min_length).scan(&m).points;
                    assert!(points <= r, "{direction:?} L={min_length}: {points} > {r}");
                }
            }
        }
    }

    #[test]
    fn test_scans_are_independent() {
        let m = RecurrenceMatrix::full(6);
        let scanner = LineScanner::diagonal(2);

        let first = scanner.scan(&m);
        let _ = LineScanner::vertical(2).scan(&m);
        let second = scanner.scan(&m);

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_and_single() {
        for n in [0, 1] {
            let m = RecurrenceMatrix::identity(n);
            for direction in [Direction::Diagonal, Direction::Horizontal, Direction::Vertical] {
                assert_eq!(LineScanner::new(direction, 2).scan(&m), ScanSummary::default());
            }
        }
    }
}
