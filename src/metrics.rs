//! RQA metric computation
//!
//! Every metric reads a recurrence matrix and returns a plain number. No metric
//! can fail: sequences shorter than two fixations and zero denominators all
//! produce 0.
//!
//! Determinism and laminarity are normalized by MaxDet(N, L), the number of
//! upper-triangle cells that could lie on a line of length at least L in an
//! N×N matrix. It is the only denominator that stays comparable when L changes.

use crate::matrix::RecurrenceMatrix;
use crate::scanner::{count_upper_triangle_ones, LineScanner, ScanSummary};
use crate::types::{MetricName, MetricReport};

/// Below this combined DET + LAM the balance is reported as neutral
const DET_LAM_EPSILON: f64 = 1e-6;

/// Stateless metric calculator
pub struct MetricEngine;

impl MetricEngine {
    /// Percentage of upper-triangle cells that recur
    pub fn recurrence_rate(matrix: &RecurrenceMatrix) -> f64 {
        let n = matrix.size();
        if n < 2 {
            return 0.0;
        }
        let r = count_upper_triangle_ones(matrix);
        percent(2 * r, n * (n - 1))
    }

    /// Share of the diagonal line capacity filled by diagonal lines of length ≥ L
    pub fn determinism(matrix: &RecurrenceMatrix, min_line_length: usize) -> f64 {
        let diagonal = LineScanner::diagonal(min_line_length).scan(matrix);
        determinism_from(matrix.size(), min_line_length, &diagonal)
    }

    /// Mean of horizontal and vertical laminarity
    pub fn laminarity(matrix: &RecurrenceMatrix, min_line_length: usize) -> f64 {
        let horizontal = LineScanner::horizontal(min_line_length).scan(matrix);
        let vertical = LineScanner::vertical(min_line_length).scan(matrix);
        laminarity_from(matrix.size(), min_line_length, &horizontal, &vertical)
    }

    pub fn horizontal_laminarity(matrix: &RecurrenceMatrix, min_line_length: usize) -> f64 {
        let horizontal = LineScanner::horizontal(min_line_length).scan(matrix);
        directional_from(matrix.size(), min_line_length, &horizontal)
    }

    pub fn vertical_laminarity(matrix: &RecurrenceMatrix, min_line_length: usize) -> f64 {
        let vertical = LineScanner::vertical(min_line_length).scan(matrix);
        directional_from(matrix.size(), min_line_length, &vertical)
    }

    /// Determinism versus laminarity mapped from [-1, 1] onto [0, 100].
    ///
    /// 50 means balanced (or neither present), above 50 leans to repeated
    /// sequences, below 50 to sustained dwelling.
    pub fn det_lam_difference(matrix: &RecurrenceMatrix, min_line_length: usize) -> f64 {
        if matrix.size() < 2 {
            return 0.0;
        }
        let det = Self::determinism(matrix, min_line_length);
        let lam = Self::laminarity(matrix, min_line_length);
        balance(det, lam)
    }

    /// Percentage of fixations immediately followed by a recurrent one
    pub fn consecutive_fixation_ratio(matrix: &RecurrenceMatrix) -> f64 {
        let n = matrix.size();
        if n < 2 {
            return 0.0;
        }
        let repeats = (0..n - 1).filter(|&i| matrix.is_recurrent(i, i + 1)).count();
        percent(repeats, n - 1)
    }

    /// Center of recurrence mass: how far apart in time recurrent fixations are.
    ///
    /// Low values mean recurrences happen soon after the first visit, high
    /// values mean they happen late in the sequence.
    pub fn center_of_recurrence_mass(matrix: &RecurrenceMatrix) -> f64 {
        let n = matrix.size();
        if n < 2 {
            return 0.0;
        }

        let (r, lag_sum) = matrix
            .recurrent_pairs()
            .fold((0usize, 0usize), |(count, sum), (i, j)| (count + 1, sum + (j - i)));

        percent(lag_sum, (n - 1) * r)
    }

    pub fn average_diagonal_length(matrix: &RecurrenceMatrix, min_line_length: usize) -> f64 {
        if matrix.size() < 2 {
            return 0.0;
        }
        LineScanner::diagonal(min_line_length)
            .scan(matrix)
            .average_length()
    }

    pub fn max_diagonal_length(matrix: &RecurrenceMatrix, min_line_length: usize) -> usize {
        if matrix.size() < 2 {
            return 0;
        }
        LineScanner::diagonal(min_line_length).scan(matrix).max_length
    }

    /// Compute every metric.
    ///
    /// Each directional scan runs once and is shared by the metrics that
    /// need it; values are identical to calling the metrics one by one.
    pub fn report(matrix: &RecurrenceMatrix, min_line_length: usize) -> MetricReport {
        let mut report = MetricReport::new();
        let n = matrix.size();

        if n < 2 {
            for name in MetricName::ALL {
                report.insert(name, 0.0);
            }
            return report;
        }

        let diagonal = LineScanner::diagonal(min_line_length).scan(matrix);
        let horizontal = LineScanner::horizontal(min_line_length).scan(matrix);
        let vertical = LineScanner::vertical(min_line_length).scan(matrix);

        let det = determinism_from(n, min_line_length, &diagonal);
        let lam = laminarity_from(n, min_line_length, &horizontal, &vertical);

        report.insert(MetricName::RecurrenceRate, Self::recurrence_rate(matrix));
        report.insert(MetricName::Determinism, det);
        report.insert(MetricName::Laminarity, lam);
        report.insert(
            MetricName::HorizontalLaminarity,
            directional_from(n, min_line_length, &horizontal),
        );
        report.insert(
            MetricName::VerticalLaminarity,
            directional_from(n, min_line_length, &vertical),
        );
        report.insert(MetricName::DetLamDifference, balance(det, lam));
        report.insert(
            MetricName::ConsecutiveFixationRatio,
            Self::consecutive_fixation_ratio(matrix),
        );
        report.insert(MetricName::Corm, Self::center_of_recurrence_mass(matrix));
        report.insert(MetricName::AvgDiagonalLength, diagonal.average_length());
        report.insert(MetricName::MaxDiagonalLength, diagonal.max_length as f64);
        report.insert(MetricName::DiagonalLineCount, diagonal.lines as f64);
        report.insert(
            MetricName::RecurrencePoints,
            count_upper_triangle_ones(matrix) as f64,
        );

        report
    }
}

/// MaxDet(N, L) = (N - 1 + L)(N - L) / 2, or 0 when no line of length L fits
pub fn max_det(size: usize, min_line_length: usize) -> usize {
    let l = min_line_length.max(1);
    if size <= l {
        return 0;
    }
    (size - 1 + l) * (size - l) / 2
}

fn determinism_from(size: usize, min_line_length: usize, diagonal: &ScanSummary) -> f64 {
    if size < 2 {
        return 0.0;
    }
    percent(diagonal.points, max_det(size, min_line_length))
}

fn laminarity_from(
    size: usize,
    min_line_length: usize,
    horizontal: &ScanSummary,
    vertical: &ScanSummary,
) -> f64 {
    if size < 2 {
        return 0.0;
    }
    percent(
        horizontal.points + vertical.points,
        2 * max_det(size, min_line_length),
    )
}

fn directional_from(size: usize, min_line_length: usize, summary: &ScanSummary) -> f64 {
    if size < 2 {
        return 0.0;
    }
    percent(summary.points, max_det(size, min_line_length))
}

fn balance(det: f64, lam: f64) -> f64 {
    let total = det + lam;
    if total < DET_LAM_EPSILON {
        return 50.0;
    }
    ((det - lam) / total + 1.0) * 50.0
}

/// 100 * numerator / denominator, 0 when the denominator is 0
fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    100.0 * numerator as f64 / denominator as f64
}
