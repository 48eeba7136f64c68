//! Gaze RQA - Recurrence quantification analysis for eye-tracking fixations
//!
//! Turns a fixation sequence into a binary recurrence matrix and derives RQA
//! metrics from the line structures inside it through a deterministic
//! pipeline: matrix construction → line scanning → metric computation →
//! snapshot encoding.
//!
//! ## Modules
//!
//! - **Matrix**: label-overlap, proximity and self-transition-corrected predicates
//! - **Scanner**: diagonal, horizontal and vertical line detection
//! - **Metrics**: recurrence rate, determinism, laminarity, CORM and friends

pub mod adapter;
pub mod config;
pub mod encoder;
pub mod error;
pub mod matrix;
pub mod metrics;
pub mod pipeline;
pub mod scanner;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::FixationAdapter;
pub use config::RqaConfig;
pub use error::{RqaError, ValidationError};
pub use matrix::{MatrixBuilder, RecurrenceMatrix};
pub use metrics::MetricEngine;
pub use pipeline::{analyze, fixations_to_rqa, RqaProcessor};
pub use scanner::{count_upper_triangle_ones, Direction, LineScanner, ScanSummary};
pub use types::{
    Fixation, FixationSequence, LabeledSequence, MetricName, MetricReport, RecurrenceMethod,
    RqaSnapshot,
};

/// Crate version embedded in all snapshots
pub const RQA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for snapshots
pub const PRODUCER_NAME: &str = "gaze-rqa";
