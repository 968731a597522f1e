//! Metric formula engine: parse -> resolve -> evaluate
//!
//! A formula is plan-scoped text such as `HH / PF`, re-parsed at every
//! evaluation. The grammar is fixed: acronym identifiers, numeric
//! literals, the four arithmetic operators and parentheses. There is no
//! dynamic code evaluation anywhere in this module; the expression is
//! tokenized and parsed by hand so errors carry precise source spans.

pub mod eval;
pub mod parser;
pub mod token;

pub use eval::{evaluate, validate, Evaluation, FormulaValidation};
pub use parser::{parse, BinaryOp, Expr};
pub use token::{tokenize, Token, TokenKind};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Unparsable formula text, with the offending span
#[derive(Debug, Error, Diagnostic)]
#[error("formula syntax error: {message}")]
#[diagnostic(code(metria::formula::syntax))]
pub struct FormulaSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("{message}")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    /// What went wrong
    pub message: String,
}

impl FormulaSyntaxError {
    /// Create a syntax error pointing at a byte range of the formula.
    /// The span is clamped to the source so rendering is always safe.
    pub fn new(
        message: impl Into<String>,
        source: &str,
        offset: usize,
        len: usize,
        help: Option<String>,
    ) -> Self {
        let start = offset.min(source.len());
        let len = len.max(1).min(source.len() - start);
        Self {
            src: NamedSource::new("formula", source.to_string()),
            span: SourceSpan::from(start..start + len),
            help,
            message: message.into(),
        }
    }

    /// Create a syntax error pointing at the end of the formula
    pub fn at_end(message: impl Into<String>, source: &str, help: Option<String>) -> Self {
        let offset = source.len().saturating_sub(1);
        Self::new(message, source, offset, 1, help)
    }
}

/// One or more referenced acronyms have no recorded value for the cycle.
///
/// Carries the full list so the caller can prompt for all missing
/// measurements at once.
#[derive(Debug, Error, Diagnostic)]
#[error("missing measurement value(s) for: {}", missing.join(", "))]
#[diagnostic(
    code(metria::formula::missing_measurement),
    help("record a value for each listed acronym in this cycle, then re-evaluate")
)]
pub struct MissingMeasurementError {
    /// Acronyms without a value, in order of first appearance
    pub missing: Vec<String>,
}

/// Hard failures of formula evaluation
#[derive(Debug, Error, Diagnostic)]
pub enum EvalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] FormulaSyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    MissingMeasurement(#[from] MissingMeasurementError),
}
