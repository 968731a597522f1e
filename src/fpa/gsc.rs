//! General System Characteristics and the Value Adjustment Factor
//!
//! Fourteen scored characteristics (0-5 each) reduce to a Total Degree of
//! Influence and a Value Adjustment Factor in [0.65, 1.35]. An absent GSC
//! set is a distinct state from an all-zero one: absence means VAF 1.0
//! with no TDI, all-zero means VAF 0.65 with TDI 0.

use serde::{Deserialize, Serialize};

use crate::fpa::ValidationError;

/// Number of general system characteristics
pub const GSC_COUNT: usize = 14;

/// A validated set of 14 general system characteristic scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Gsc {
    scores: [u8; GSC_COUNT],
}

impl Gsc {
    /// Validate a raw score list into a GSC set.
    ///
    /// Exactly 14 scores, each 0..=5. Anything else is a validation
    /// error, never a coercion.
    pub fn new(scores: Vec<u8>) -> Result<Self, ValidationError> {
        if scores.len() != GSC_COUNT {
            return Err(ValidationError::GscLength(scores.len()));
        }
        for (index, &value) in scores.iter().enumerate() {
            if value > 5 {
                return Err(ValidationError::GscScoreOutOfRange { index, value });
            }
        }
        let mut array = [0u8; GSC_COUNT];
        array.copy_from_slice(&scores);
        Ok(Self { scores: array })
    }

    /// The individual scores
    pub fn scores(&self) -> &[u8; GSC_COUNT] {
        &self.scores
    }

    /// Total Degree of Influence: sum of the 14 scores, in [0, 70]
    pub fn total_degree_of_influence(&self) -> u32 {
        self.scores.iter().map(|&s| s as u32).sum()
    }

    /// Value Adjustment Factor: 0.65 + 0.01 * TDI, in [0.65, 1.35]
    pub fn value_adjustment_factor(&self) -> f64 {
        0.65 + 0.01 * self.total_degree_of_influence() as f64
    }
}

impl TryFrom<Vec<u8>> for Gsc {
    type Error = ValidationError;

    fn try_from(scores: Vec<u8>) -> Result<Self, Self::Error> {
        Gsc::new(scores)
    }
}

impl From<Gsc> for Vec<u8> {
    fn from(gsc: Gsc) -> Self {
        gsc.scores.to_vec()
    }
}

/// The value adjustment derived from an optional GSC set.
///
/// Keeps the absent-vs-zero distinction explicit in output: `tdi` is
/// omitted entirely when no GSC data was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueAdjustment {
    /// Total Degree of Influence; absent when no GSC data was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdi: Option<u32>,

    /// Value Adjustment Factor (1.0 when no GSC data was supplied)
    pub factor: f64,
}

impl ValueAdjustment {
    /// Derive the adjustment from an optional GSC set
    pub fn from_gsc(gsc: Option<&Gsc>) -> Self {
        match gsc {
            Some(gsc) => Self {
                tdi: Some(gsc.total_degree_of_influence()),
                factor: gsc.value_adjustment_factor(),
            },
            None => Self {
                tdi: None,
                factor: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gsc_requires_exactly_14_scores() {
        let err = Gsc::new(vec![0; 13]).unwrap_err();
        assert!(matches!(err, ValidationError::GscLength(13)));

        let err = Gsc::new(vec![0; 15]).unwrap_err();
        assert!(matches!(err, ValidationError::GscLength(15)));

        assert!(Gsc::new(vec![0; 14]).is_ok());
    }

    #[test]
    fn test_gsc_rejects_out_of_range_score() {
        let mut scores = vec![0; 14];
        scores[7] = 6;
        let err = Gsc::new(scores).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::GscScoreOutOfRange { index: 7, value: 6 }
        ));
    }

    #[test]
    fn test_tdi_and_vaf_range() {
        let all_zero = Gsc::new(vec![0; 14]).unwrap();
        assert_eq!(all_zero.total_degree_of_influence(), 0);
        assert!((all_zero.value_adjustment_factor() - 0.65).abs() < 1e-12);

        let all_five = Gsc::new(vec![5; 14]).unwrap();
        assert_eq!(all_five.total_degree_of_influence(), 70);
        assert!((all_five.value_adjustment_factor() - 1.35).abs() < 1e-12);

        let mixed = Gsc::new(vec![3, 2, 5, 0, 1, 4, 3, 2, 5, 0, 1, 4, 3, 2]).unwrap();
        assert_eq!(mixed.total_degree_of_influence(), 35);
        assert!((mixed.value_adjustment_factor() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_absent_gsc_is_distinct_from_all_zero() {
        let absent = ValueAdjustment::from_gsc(None);
        assert_eq!(absent.tdi, None);
        assert_eq!(absent.factor, 1.0);

        let zero = Gsc::new(vec![0; 14]).unwrap();
        let adjusted = ValueAdjustment::from_gsc(Some(&zero));
        assert_eq!(adjusted.tdi, Some(0));
        assert!((adjusted.factor - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_gsc_yaml_roundtrip() {
        let gsc = Gsc::new(vec![3, 2, 5, 0, 1, 4, 3, 2, 5, 0, 1, 4, 3, 2]).unwrap();
        let yaml = serde_yml::to_string(&gsc).unwrap();
        let parsed: Gsc = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(gsc, parsed);
    }

    #[test]
    fn test_gsc_yaml_rejects_wrong_length() {
        let result: Result<Gsc, _> = serde_yml::from_str("[0, 1, 2]");
        assert!(result.is_err());
    }
}
