//! Project risk assessment derived from the calculation inputs
//!
//! Independent factors (team size, schedule compression, scope,
//! complexity concentration) are each tiered against the policy
//! thresholds; the overall risk is the worst tier seen.

use serde::{Deserialize, Serialize};

use crate::core::config::CalculationPolicy;

/// Risk tier for a single factor or the whole project
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum RiskTier {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

/// Productivity rating against industry bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductivityRating {
    Low,
    Average,
    High,
}

impl ProductivityRating {
    /// Rate an hours-per-function-point figure against the policy bands.
    ///
    /// Fewer hours per FP is better: at or under the high-band cutoff the
    /// rating is HIGH, above the low-band cutoff it is LOW.
    pub fn from_hours_per_fp(hours_per_fp: f64, policy: &CalculationPolicy) -> Self {
        if hours_per_fp <= policy.rating_high_max_hours_per_fp {
            ProductivityRating::High
        } else if hours_per_fp > policy.rating_low_min_hours_per_fp {
            ProductivityRating::Low
        } else {
            ProductivityRating::Average
        }
    }
}

impl std::fmt::Display for ProductivityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductivityRating::Low => write!(f, "low"),
            ProductivityRating::Average => write!(f, "average"),
            ProductivityRating::High => write!(f, "high"),
        }
    }
}

/// A single assessed risk factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Factor name (e.g. "team_size")
    pub name: String,

    /// Assessed tier
    pub tier: RiskTier,

    /// What was observed
    pub detail: String,
}

/// Full risk assessment result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// Individual factors, in assessment order
    pub factors: Vec<RiskFactor>,

    /// Worst tier among the factors
    pub overall: RiskTier,

    /// One recommendation per non-low factor
    pub recommendations: Vec<String>,
}

/// Assess project risk from the aggregate figures.
///
/// `fp_per_day` is absent when the duration is undefined (zero team or
/// zero hours); the schedule factor is then reported low with a note.
pub fn assess_risk(
    team_size: u32,
    adjusted_fp: f64,
    fp_per_day: Option<f64>,
    high_complexity_share: f64,
    policy: &CalculationPolicy,
) -> RiskAnalysis {
    let mut factors = Vec::new();
    let mut recommendations = Vec::new();

    // Team size extremes
    let (tier, detail, advice) = if team_size <= 1 {
        (
            RiskTier::High,
            format!("team of {} concentrates all knowledge", team_size),
            Some("Staff at least one more person to remove the single point of failure.".to_string()),
        )
    } else if team_size < policy.min_team_size {
        (
            RiskTier::Medium,
            format!(
                "team of {} is below the recommended minimum of {}",
                team_size, policy.min_team_size
            ),
            Some("Consider adding team members or reducing parallel scope.".to_string()),
        )
    } else if team_size > policy.max_team_size * 2 {
        (
            RiskTier::High,
            format!(
                "team of {} is far above the recommended maximum of {}",
                team_size, policy.max_team_size
            ),
            Some("Split the project into smaller teams with clear interfaces.".to_string()),
        )
    } else if team_size > policy.max_team_size {
        (
            RiskTier::Medium,
            format!(
                "team of {} exceeds the recommended maximum of {}",
                team_size, policy.max_team_size
            ),
            Some("Large teams increase coordination overhead; review the team structure.".to_string()),
        )
    } else {
        (
            RiskTier::Low,
            format!("team of {} is within the recommended range", team_size),
            None,
        )
    };
    factors.push(RiskFactor {
        name: "team_size".to_string(),
        tier,
        detail,
    });
    recommendations.extend(advice);

    // Schedule compression: function points delivered per day
    let (tier, detail, advice) = match fp_per_day {
        Some(rate) if rate >= policy.compression_high_fp_per_day => (
            RiskTier::High,
            format!("{:.1} FP/day is a heavily compressed schedule", rate),
            Some("Extend the schedule or cut scope; the planned delivery rate is unrealistic.".to_string()),
        ),
        Some(rate) if rate >= policy.compression_medium_fp_per_day => (
            RiskTier::Medium,
            format!("{:.1} FP/day is an aggressive delivery rate", rate),
            Some("Build schedule buffer for the aggressive delivery rate.".to_string()),
        ),
        Some(rate) => (
            RiskTier::Low,
            format!("{:.1} FP/day is a sustainable delivery rate", rate),
            None,
        ),
        None => (
            RiskTier::Low,
            "delivery rate undefined (no duration)".to_string(),
            None,
        ),
    };
    factors.push(RiskFactor {
        name: "schedule_compression".to_string(),
        tier,
        detail,
    });
    recommendations.extend(advice);

    // Scope size
    let (tier, detail, advice) = if adjusted_fp >= policy.scope_high_fp {
        (
            RiskTier::High,
            format!("{:.0} adjusted FP is a very large scope", adjusted_fp),
            Some("Phase the delivery; projects this size rarely succeed as a single release.".to_string()),
        )
    } else if adjusted_fp >= policy.scope_medium_fp {
        (
            RiskTier::Medium,
            format!("{:.0} adjusted FP is a substantial scope", adjusted_fp),
            Some("Track scope closely and plan intermediate milestones.".to_string()),
        )
    } else {
        (
            RiskTier::Low,
            format!("{:.0} adjusted FP is a manageable scope", adjusted_fp),
            None,
        )
    };
    factors.push(RiskFactor {
        name: "scope_size".to_string(),
        tier,
        detail,
    });
    recommendations.extend(advice);

    // Complexity concentration: share of FP in high-complexity components
    let share_pct = high_complexity_share * 100.0;
    let (tier, detail, advice) = if high_complexity_share >= policy.concentration_high_share {
        (
            RiskTier::High,
            format!("{:.0}% of function points sit in high-complexity components", share_pct),
            Some("Break the high-complexity components down before estimating further.".to_string()),
        )
    } else if high_complexity_share >= policy.concentration_medium_share {
        (
            RiskTier::Medium,
            format!("{:.0}% of function points sit in high-complexity components", share_pct),
            Some("Schedule design reviews for the high-complexity components.".to_string()),
        )
    } else {
        (
            RiskTier::Low,
            format!("{:.0}% of function points sit in high-complexity components", share_pct),
            None,
        )
    };
    factors.push(RiskFactor {
        name: "complexity_concentration".to_string(),
        tier,
        detail,
    });
    recommendations.extend(advice);

    let overall = factors
        .iter()
        .map(|f| f.tier)
        .max()
        .unwrap_or(RiskTier::Low);

    RiskAnalysis {
        factors,
        overall,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CalculationPolicy {
        CalculationPolicy::default()
    }

    #[test]
    fn test_all_factors_low() {
        let analysis = assess_risk(5, 100.0, Some(1.0), 0.1, &policy());
        assert_eq!(analysis.overall, RiskTier::Low);
        assert_eq!(analysis.factors.len(), 4);
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.factors.iter().all(|f| f.tier == RiskTier::Low));
    }

    #[test]
    fn test_overall_is_max_tier() {
        // Scope medium, everything else low
        let analysis = assess_risk(5, 500.0, Some(1.0), 0.1, &policy());
        assert_eq!(analysis.overall, RiskTier::Medium);

        // Solo team forces high
        let analysis = assess_risk(1, 500.0, Some(1.0), 0.1, &policy());
        assert_eq!(analysis.overall, RiskTier::High);
    }

    #[test]
    fn test_one_recommendation_per_non_low_factor() {
        let analysis = assess_risk(1, 1200.0, Some(12.0), 0.6, &policy());
        assert_eq!(analysis.overall, RiskTier::High);
        let non_low = analysis
            .factors
            .iter()
            .filter(|f| f.tier != RiskTier::Low)
            .count();
        assert_eq!(non_low, 4);
        assert_eq!(analysis.recommendations.len(), non_low);
    }

    #[test]
    fn test_team_size_extremes() {
        let analysis = assess_risk(1, 100.0, Some(1.0), 0.0, &policy());
        assert_eq!(analysis.factors[0].tier, RiskTier::High);

        let analysis = assess_risk(12, 100.0, Some(1.0), 0.0, &policy());
        assert_eq!(analysis.factors[0].tier, RiskTier::Medium);

        let analysis = assess_risk(25, 100.0, Some(1.0), 0.0, &policy());
        assert_eq!(analysis.factors[0].tier, RiskTier::High);
    }

    #[test]
    fn test_undefined_delivery_rate_is_low() {
        let analysis = assess_risk(5, 100.0, None, 0.0, &policy());
        assert_eq!(analysis.factors[1].tier, RiskTier::Low);
        assert!(analysis.factors[1].detail.contains("undefined"));
    }

    #[test]
    fn test_productivity_rating_bands() {
        let p = policy();
        assert_eq!(
            ProductivityRating::from_hours_per_fp(6.0, &p),
            ProductivityRating::High
        );
        assert_eq!(
            ProductivityRating::from_hours_per_fp(8.0, &p),
            ProductivityRating::High
        );
        assert_eq!(
            ProductivityRating::from_hours_per_fp(10.0, &p),
            ProductivityRating::Average
        );
        assert_eq!(
            ProductivityRating::from_hours_per_fp(15.0, &p),
            ProductivityRating::Average
        );
        assert_eq!(
            ProductivityRating::from_hours_per_fp(15.1, &p),
            ProductivityRating::Low
        );
    }

    #[test]
    fn test_tier_ordering() {
        assert!(RiskTier::Low < RiskTier::Medium);
        assert!(RiskTier::Medium < RiskTier::High);
    }
}
