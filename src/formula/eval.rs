//! Formula resolution and evaluation
//!
//! The resolve step looks every referenced acronym up in the cycle's
//! measurement snapshot and fails with the complete missing list if any
//! are absent. Evaluation itself never throws: division by zero and any
//! other non-finite outcome are reported as an undefined value with the
//! resolved variables preserved, so the caller can still show what went
//! in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formula::parser::parse;
use crate::formula::{EvalError, MissingMeasurementError};

/// Result of evaluating a formula against a measurement snapshot.
///
/// `calculated_value` is `None` when the arithmetic was undefined
/// (division by zero or any non-finite outcome); `variables` always
/// holds the resolved inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_value: Option<f64>,

    pub variables: BTreeMap<String, f64>,
}

/// Result of the authoring-time, parse-only validation entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaValidation {
    pub is_valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse, resolve and evaluate a formula against a measurement snapshot.
///
/// Pure function: the same formula and the same snapshot always produce
/// the same result.
pub fn evaluate(
    formula: &str,
    measurements: &BTreeMap<String, f64>,
) -> Result<Evaluation, EvalError> {
    let expr = parse(formula)?;

    let referenced = expr.variables();
    let missing: Vec<String> = referenced
        .iter()
        .filter(|acronym| !measurements.contains_key(*acronym))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(MissingMeasurementError { missing }.into());
    }

    let variables: BTreeMap<String, f64> = referenced
        .into_iter()
        .map(|acronym| {
            let value = measurements[&acronym];
            (acronym, value)
        })
        .collect();

    let raw = expr.eval(&variables);
    let calculated_value = if raw.is_finite() { Some(raw) } else { None };

    Ok(Evaluation {
        calculated_value,
        variables,
    })
}

/// Authoring-time validation: runs only the parse phase.
pub fn validate(formula: &str) -> FormulaValidation {
    match parse(formula) {
        Ok(_) => FormulaValidation {
            is_valid: true,
            error: None,
        },
        Err(err) => FormulaValidation {
            is_valid: false,
            error: Some(err.message.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_evaluate_division() {
        let result = evaluate("HH / PF", &snapshot(&[("HH", 100.0), ("PF", 10.0)])).unwrap();
        assert_eq!(result.calculated_value, Some(10.0));
        assert_eq!(result.variables.len(), 2);
        assert_eq!(result.variables["HH"], 100.0);
        assert_eq!(result.variables["PF"], 10.0);
    }

    #[test]
    fn test_division_by_zero_is_undefined_not_error() {
        let result = evaluate("HH / PF", &snapshot(&[("HH", 50.0), ("PF", 0.0)])).unwrap();
        assert_eq!(result.calculated_value, None);
        // Inputs remain visible
        assert_eq!(result.variables["HH"], 50.0);
        assert_eq!(result.variables["PF"], 0.0);
    }

    #[test]
    fn test_zero_over_zero_is_undefined() {
        let result = evaluate("A / B", &snapshot(&[("A", 0.0), ("B", 0.0)])).unwrap();
        assert_eq!(result.calculated_value, None);
    }

    #[test]
    fn test_missing_measurement_lists_all_missing() {
        let err = evaluate("HH / PF", &snapshot(&[("HH", 50.0)])).unwrap_err();
        match err {
            EvalError::MissingMeasurement(e) => assert_eq!(e.missing, vec!["PF"]),
            other => panic!("expected missing measurement, got {:?}", other),
        }

        let err = evaluate("A + B + C", &snapshot(&[("B", 1.0)])).unwrap_err();
        match err {
            EvalError::MissingMeasurement(e) => assert_eq!(e.missing, vec!["A", "C"]),
            other => panic!("expected missing measurement, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_measurements_are_not_reported() {
        let result = evaluate(
            "HH / PF",
            &snapshot(&[("HH", 100.0), ("PF", 10.0), ("XX", 3.0)]),
        )
        .unwrap();
        // Only referenced acronyms appear in the output variables
        assert_eq!(result.variables.len(), 2);
        assert!(!result.variables.contains_key("XX"));
    }

    #[test]
    fn test_syntax_error_at_evaluation_time() {
        let err = evaluate("HH / (", &snapshot(&[("HH", 1.0)])).unwrap_err();
        assert!(matches!(err, EvalError::Syntax(_)));
    }

    #[test]
    fn test_validate_accepts_valid_formula() {
        let validation = validate("HH / PF");
        assert!(validation.is_valid);
        assert!(validation.error.is_none());
    }

    #[test]
    fn test_validate_rejects_malformed_formula() {
        let validation = validate("HH / (");
        assert!(!validation.is_valid);
        assert!(!validation.error.unwrap().is_empty());
    }

    #[test]
    fn test_validated_formula_never_fails_syntax_at_eval() {
        // Round-trip property: a formula that validates cleanly can be
        // evaluated without a syntax error when all acronyms resolve.
        let formulas = ["HH / PF", "(A + B) * 2 - C / 4", "-X + 1.5"];
        let values = snapshot(&[
            ("HH", 1.0),
            ("PF", 2.0),
            ("A", 3.0),
            ("B", 4.0),
            ("C", 5.0),
            ("X", 6.0),
        ]);
        for formula in formulas {
            assert!(validate(formula).is_valid);
            let result = evaluate(formula, &values);
            assert!(!matches!(result, Err(EvalError::Syntax(_))));
        }
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let values = snapshot(&[("HH", 100.0), ("PF", 3.0)]);
        let a = evaluate("HH / PF", &values).unwrap();
        let b = evaluate("HH / PF", &values).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_formula_needs_no_measurements() {
        let result = evaluate("2 + 2", &BTreeMap::new()).unwrap();
        assert_eq!(result.calculated_value, Some(4.0));
        assert!(result.variables.is_empty());
    }
}
