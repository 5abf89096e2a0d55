//! Analysis modules.
//!
//! `aggregator` holds the counting primitives; `segments` applies them per
//! cohort and per course area.

pub mod aggregator;
pub mod segments;

pub use aggregator::*;
pub use segments::*;

use crate::survey::Field;
use thiserror::Error;

/// Errors raised by an individual aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("the survey export has no column for '{field}'")]
    MissingColumn { field: Field },
}
