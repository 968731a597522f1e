//! IFPUG complexity classification
//!
//! Encodes the standard two-axis complexity matrices for data functions
//! (RET x DET) and transactional functions (FTR x DET), plus the weight
//! tables that turn a (type, complexity) pair into an unadjusted function
//! point contribution.

use serde::{Deserialize, Serialize};

use crate::fpa::ValidationError;

/// Functional component category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComponentType {
    /// Internal Logical File (ALI/ILF) - data maintained within the boundary
    Ali,
    /// External Interface File (AIE/EIF) - data maintained elsewhere
    Aie,
    /// External Input
    Ei,
    /// External Output
    Eo,
    /// External Query
    Eq,
}

impl ComponentType {
    /// True for ALI/AIE, which count RET rather than FTR
    pub fn is_data_function(&self) -> bool {
        matches!(self, ComponentType::Ali | ComponentType::Aie)
    }

    pub fn all() -> &'static [ComponentType] {
        &[
            ComponentType::Ali,
            ComponentType::Aie,
            ComponentType::Ei,
            ComponentType::Eo,
            ComponentType::Eq,
        ]
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentType::Ali => write!(f, "ALI"),
            ComponentType::Aie => write!(f, "AIE"),
            ComponentType::Ei => write!(f, "EI"),
            ComponentType::Eo => write!(f, "EO"),
            ComponentType::Eq => write!(f, "EQ"),
        }
    }
}

impl std::str::FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALI" | "ILF" => Ok(ComponentType::Ali),
            "AIE" | "EIF" => Ok(ComponentType::Aie),
            "EI" => Ok(ComponentType::Ei),
            "EO" => Ok(ComponentType::Eo),
            "EQ" => Ok(ComponentType::Eq),
            _ => Err(format!("Unknown component type: {}", s)),
        }
    }
}

/// Complexity tier derived from the structural counts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Average,
    High,
}

impl Complexity {
    pub fn all() -> &'static [Complexity] {
        &[Complexity::Low, Complexity::Average, Complexity::High]
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Low => write!(f, "low"),
            Complexity::Average => write!(f, "average"),
            Complexity::High => write!(f, "high"),
        }
    }
}

/// Which side of a special-calculation query won the classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySide {
    Input,
    Output,
}

impl std::fmt::Display for QuerySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuerySide::Input => write!(f, "input"),
            QuerySide::Output => write!(f, "output"),
        }
    }
}

use Complexity::{Average, High, Low};

/// Data function matrix: rows are RET bands (<=1, 2-5, >5),
/// columns are DET bands (<=19, 20-50, >50).
const DATA_FUNCTION_MATRIX: [[Complexity; 3]; 3] = [
    [Low, Average, High],
    [Low, Average, High],
    [Average, High, High],
];

/// External input matrix: rows are FTR bands (<=1, 2, >=3),
/// columns are DET bands (<=4, 5-15, >15).
const INPUT_MATRIX: [[Complexity; 3]; 3] = [
    [Low, Low, Average],
    [Low, Average, High],
    [Average, High, High],
];

/// External output/query matrix: rows are FTR bands (<=1, 2-3, >=4),
/// columns are DET bands (<=5, 6-19, >19).
const OUTPUT_MATRIX: [[Complexity; 3]; 3] = [
    [Low, Low, Average],
    [Low, Average, High],
    [Average, High, High],
];

/// Classify a data function (ALI/AIE) from record and data element counts.
///
/// Zero counts land in the lowest band.
pub fn classify_data_function(ret: u32, det: u32) -> Complexity {
    let row = if ret <= 1 {
        0
    } else if ret <= 5 {
        1
    } else {
        2
    };
    let col = if det <= 19 {
        0
    } else if det <= 50 {
        1
    } else {
        2
    };
    DATA_FUNCTION_MATRIX[row][col]
}

/// Classify an external input (EI) from file-types-referenced and data
/// element counts.
pub fn classify_input(ftr: u32, det: u32) -> Complexity {
    let row = if ftr <= 1 {
        0
    } else if ftr == 2 {
        1
    } else {
        2
    };
    let col = if det <= 4 {
        0
    } else if det <= 15 {
        1
    } else {
        2
    };
    INPUT_MATRIX[row][col]
}

/// Classify an external output or query (EO/EQ) from file-types-referenced
/// and data element counts.
pub fn classify_output(ftr: u32, det: u32) -> Complexity {
    let row = if ftr <= 1 {
        0
    } else if ftr <= 3 {
        1
    } else {
        2
    };
    let col = if det <= 5 {
        0
    } else if det <= 19 {
        1
    } else {
        2
    };
    OUTPUT_MATRIX[row][col]
}

/// Classify a query with separate input/output counts.
///
/// The input side goes through the EI matrix, the output side through the
/// EO/EQ matrix; the higher tier wins. On a tie the output side is
/// reported as the winner.
pub fn classify_special_query(
    input_ftr: u32,
    input_det: u32,
    output_ftr: u32,
    output_det: u32,
) -> (Complexity, QuerySide) {
    let input = classify_input(input_ftr, input_det);
    let output = classify_output(output_ftr, output_det);

    if input > output {
        (input, QuerySide::Input)
    } else {
        (output, QuerySide::Output)
    }
}

/// Unadjusted function point weight for a (type, complexity) pair
pub fn weight(component_type: ComponentType, complexity: Complexity) -> u32 {
    match (component_type, complexity) {
        (ComponentType::Ali, Low) => 7,
        (ComponentType::Ali, Average) => 10,
        (ComponentType::Ali, High) => 15,
        (ComponentType::Aie, Low) => 5,
        (ComponentType::Aie, Average) => 7,
        (ComponentType::Aie, High) => 10,
        (ComponentType::Ei, Low) => 3,
        (ComponentType::Ei, Average) => 4,
        (ComponentType::Ei, High) => 6,
        (ComponentType::Eo, Low) => 4,
        (ComponentType::Eo, Average) => 5,
        (ComponentType::Eo, High) => 7,
        (ComponentType::Eq, Low) => 3,
        (ComponentType::Eq, Average) => 4,
        (ComponentType::Eq, High) => 6,
    }
}

/// Check a raw count from an untrusted source (CLI flag, CSV cell).
///
/// Negative values are a validation error, not a clamp.
pub fn checked_count(field: &str, value: i64) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeCount {
            field: field.to_string(),
            value,
        });
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_function_boundary_matrix() {
        // Regression cases for the RET/DET boundaries
        assert_eq!(classify_data_function(1, 15), Complexity::Low);
        assert_eq!(classify_data_function(1, 19), Complexity::Low);
        assert_eq!(classify_data_function(1, 20), Complexity::Average);
        assert_eq!(classify_data_function(1, 25), Complexity::Average);
        assert_eq!(classify_data_function(1, 51), Complexity::High);
        assert_eq!(classify_data_function(5, 50), Complexity::Average);
        assert_eq!(classify_data_function(6, 19), Complexity::Average);
        assert_eq!(classify_data_function(6, 20), Complexity::High);
        assert_eq!(classify_data_function(6, 60), Complexity::High);
    }

    #[test]
    fn test_data_function_weights() {
        assert_eq!(
            weight(ComponentType::Ali, classify_data_function(1, 15)),
            7
        );
        assert_eq!(
            weight(ComponentType::Ali, classify_data_function(1, 25)),
            10
        );
        assert_eq!(
            weight(ComponentType::Ali, classify_data_function(6, 60)),
            15
        );
        assert_eq!(weight(ComponentType::Aie, Complexity::Low), 5);
        assert_eq!(weight(ComponentType::Aie, Complexity::High), 10);
    }

    #[test]
    fn test_input_matrix() {
        assert_eq!(classify_input(1, 4), Complexity::Low);
        assert_eq!(classify_input(1, 15), Complexity::Low);
        assert_eq!(classify_input(1, 16), Complexity::Average);
        assert_eq!(classify_input(2, 4), Complexity::Low);
        assert_eq!(classify_input(2, 5), Complexity::Average);
        assert_eq!(classify_input(2, 16), Complexity::High);
        assert_eq!(classify_input(3, 4), Complexity::Average);
        assert_eq!(classify_input(3, 15), Complexity::High);
    }

    #[test]
    fn test_output_matrix() {
        assert_eq!(classify_output(1, 5), Complexity::Low);
        assert_eq!(classify_output(1, 19), Complexity::Low);
        assert_eq!(classify_output(1, 20), Complexity::Average);
        assert_eq!(classify_output(2, 6), Complexity::Average);
        assert_eq!(classify_output(3, 20), Complexity::High);
        assert_eq!(classify_output(4, 5), Complexity::Average);
        assert_eq!(classify_output(4, 20), Complexity::High);
    }

    #[test]
    fn test_zero_counts_default_to_lowest_band() {
        assert_eq!(classify_data_function(0, 0), Complexity::Low);
        assert_eq!(classify_input(0, 0), Complexity::Low);
        assert_eq!(classify_output(0, 0), Complexity::Low);
    }

    #[test]
    fn test_special_query_takes_winning_side() {
        // Input side average (3 FTR), output side low
        let (complexity, side) = classify_special_query(3, 4, 1, 5);
        assert_eq!(complexity, Complexity::Average);
        assert_eq!(side, QuerySide::Input);

        // Output side high, input side low
        let (complexity, side) = classify_special_query(1, 4, 4, 20);
        assert_eq!(complexity, Complexity::High);
        assert_eq!(side, QuerySide::Output);

        // Tie goes to the output side
        let (complexity, side) = classify_special_query(1, 4, 1, 5);
        assert_eq!(complexity, Complexity::Low);
        assert_eq!(side, QuerySide::Output);
    }

    #[test]
    fn test_special_query_weight_uses_eq_table() {
        let (complexity, _) = classify_special_query(1, 4, 4, 20);
        assert_eq!(weight(ComponentType::Eq, complexity), 6);
    }

    #[test]
    fn test_checked_count_rejects_negative() {
        let err = checked_count("det", -3).unwrap_err();
        assert!(err.to_string().contains("det"));
        assert!(err.to_string().contains("-3"));

        assert_eq!(checked_count("ret", 0).unwrap(), 0);
        assert_eq!(checked_count("ret", 42).unwrap(), 42);
    }

    #[test]
    fn test_determinism() {
        for _ in 0..3 {
            assert_eq!(classify_data_function(2, 30), Complexity::Average);
            assert_eq!(weight(ComponentType::Eo, Complexity::Average), 5);
        }
    }

    #[test]
    fn test_component_type_parsing() {
        assert_eq!("ali".parse::<ComponentType>().unwrap(), ComponentType::Ali);
        assert_eq!("ILF".parse::<ComponentType>().unwrap(), ComponentType::Ali);
        assert_eq!("EIF".parse::<ComponentType>().unwrap(), ComponentType::Aie);
        assert_eq!("eq".parse::<ComponentType>().unwrap(), ComponentType::Eq);
        assert!("xyz".parse::<ComponentType>().is_err());
    }
}
