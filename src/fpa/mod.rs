//! Function Point Analysis engine
//!
//! Pure, synchronous calculation over in-memory data: classification of
//! components into complexity tiers, value adjustment from the general
//! system characteristics, and aggregation into a full project report.
//! Nothing in this module performs I/O or holds state between calls.

pub mod calculation;
pub mod complexity;
pub mod gsc;
pub mod risk;

pub use calculation::{
    calculate, Breakdown, CalculationResult, PhaseBreakdown, ProductivityMetrics, ProjectConfig,
};
pub use complexity::{
    checked_count, classify_data_function, classify_input, classify_output,
    classify_special_query, weight, Complexity, ComponentType, QuerySide,
};
pub use gsc::{Gsc, ValueAdjustment};
pub use risk::{assess_risk, ProductivityRating, RiskAnalysis, RiskFactor, RiskTier};

use miette::Diagnostic;
use thiserror::Error;

/// Validation failures on raw calculation inputs.
///
/// These are surfaced to the caller immediately and never coerced into a
/// guessed value.
#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("{field} must be a non-negative integer, got {value}")]
    #[diagnostic(code(metria::fpa::negative_count))]
    NegativeCount { field: String, value: i64 },

    #[error("general system characteristics must have exactly 14 scores, got {0}")]
    #[diagnostic(code(metria::fpa::gsc_length))]
    GscLength(usize),

    #[error("general system characteristic #{index} must be in 0..=5, got {value}")]
    #[diagnostic(code(metria::fpa::gsc_score))]
    GscScoreOutOfRange { index: usize, value: u8 },
}
