//! FPA aggregation: classified components + project configuration into a
//! full calculation report
//!
//! Every quotient guards its zero denominator: an undefined metric is an
//! explicit `None`, never NaN or infinity. Results are derived on demand
//! and never persisted.

use serde::{Deserialize, Serialize};

use crate::core::config::CalculationPolicy;
use crate::fpa::complexity::{Complexity, ComponentType};
use crate::fpa::gsc::{Gsc, ValueAdjustment};
use crate::fpa::risk::{assess_risk, ProductivityRating, RiskAnalysis};

/// Delivery phases and their share of total effort. Shares sum to 1.0.
const PHASES: [(&str, f64); 4] = [
    ("analysis", 0.15),
    ("design", 0.20),
    ("build", 0.40),
    ("test", 0.25),
];

/// Per-estimate calculation configuration.
///
/// Supplied by the caller and used only as input; the engine never
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Average working hours per person per day
    pub average_daily_working_hours: f64,

    /// Number of people on the team
    pub team_size: u32,

    /// Hourly rate in BRL
    pub hourly_rate_brl: f64,

    /// Hours per function point; falls back to the policy default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub productivity_factor: Option<f64>,
}

/// A component already classified and weighted, ready for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedComponent {
    pub component_type: ComponentType,
    pub complexity: Complexity,
    pub function_points: u32,
}

/// One row of a by-type or by-complexity breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakdown {
    /// Group label (component type or complexity tier)
    pub label: String,

    /// Number of components in the group
    pub count: usize,

    /// Summed function points
    pub function_points: u32,

    /// Share of total function points (0.0 when the total is 0)
    pub percentage: f64,
}

/// Productivity figures derived from the aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductivityMetrics {
    /// Effort hours per adjusted function point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_fp: Option<f64>,

    /// Adjusted function points delivered per working day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp_per_day: Option<f64>,

    /// Bounded 0-1 ratio of the baseline rate to the actual rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_efficiency: Option<f64>,

    /// Industry comparison band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<ProductivityRating>,
}

/// Effort and cost apportioned to one delivery phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseBreakdown {
    pub phase: String,

    /// Share of total effort (fraction, shares sum to 1.0)
    pub share: f64,

    pub effort_hours: f64,

    pub cost: f64,
}

/// The full derived calculation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Unadjusted function points (sum of component weights)
    pub unadjusted_fp: u32,

    /// TDI and value adjustment factor
    pub adjustment: ValueAdjustment,

    /// Adjusted function points: unadjusted_fp * factor, exactly
    pub adjusted_fp: f64,

    /// Effective hours-per-FP used for effort derivation
    pub productivity_factor: f64,

    pub effort_hours: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<f64>,

    pub total_cost: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_fp: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_person: Option<f64>,

    pub by_type: Vec<Breakdown>,

    pub by_complexity: Vec<Breakdown>,

    pub productivity: ProductivityMetrics,

    pub risk: RiskAnalysis,

    pub phases: Vec<PhaseBreakdown>,
}

/// Divide, reporting an undefined result instead of a non-finite one
fn guarded_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Run the full aggregation over classified components.
///
/// Pure function of its inputs: identical inputs always produce an
/// identical report.
pub fn calculate(
    components: &[ClassifiedComponent],
    config: &ProjectConfig,
    gsc: Option<&Gsc>,
    policy: &CalculationPolicy,
) -> CalculationResult {
    let unadjusted_fp: u32 = components.iter().map(|c| c.function_points).sum();
    let adjustment = ValueAdjustment::from_gsc(gsc);
    let adjusted_fp = unadjusted_fp as f64 * adjustment.factor;

    let productivity_factor = config
        .productivity_factor
        .unwrap_or(policy.default_productivity_factor);

    let effort_hours = adjusted_fp * productivity_factor;
    let total_cost = effort_hours * config.hourly_rate_brl;

    let daily_capacity = config.team_size as f64 * config.average_daily_working_hours;
    let duration_days = guarded_div(effort_hours, daily_capacity);
    let duration_months =
        duration_days.and_then(|days| guarded_div(days, policy.working_days_per_month));

    let cost_per_fp = if adjusted_fp == 0.0 {
        None
    } else {
        Some(total_cost / adjusted_fp)
    };
    let cost_per_person = guarded_div(total_cost, config.team_size as f64);

    let by_type = breakdown_by(components, unadjusted_fp, |c| c.component_type.to_string());
    let by_complexity = breakdown_by(components, unadjusted_fp, |c| c.complexity.to_string());

    let hours_per_fp = if adjusted_fp == 0.0 {
        None
    } else {
        Some(effort_hours / adjusted_fp)
    };
    let fp_per_day = match duration_days {
        Some(days) if days > 0.0 => Some(adjusted_fp / days),
        _ => None,
    };
    let team_efficiency = hours_per_fp.map(|actual| {
        // Baseline over actual: spending fewer hours per FP than the
        // baseline saturates at 1.0.
        (policy.baseline_hours_per_fp / actual).clamp(0.0, 1.0)
    });
    let rating = hours_per_fp.map(|h| ProductivityRating::from_hours_per_fp(h, policy));

    let high_fp: u32 = components
        .iter()
        .filter(|c| c.complexity == Complexity::High)
        .map(|c| c.function_points)
        .sum();
    let high_complexity_share = if unadjusted_fp == 0 {
        0.0
    } else {
        high_fp as f64 / unadjusted_fp as f64
    };

    let risk = assess_risk(
        config.team_size,
        adjusted_fp,
        fp_per_day,
        high_complexity_share,
        policy,
    );

    let phases = PHASES
        .iter()
        .map(|(phase, share)| PhaseBreakdown {
            phase: phase.to_string(),
            share: *share,
            effort_hours: effort_hours * share,
            cost: total_cost * share,
        })
        .collect();

    CalculationResult {
        unadjusted_fp,
        adjustment,
        adjusted_fp,
        productivity_factor,
        effort_hours,
        duration_days,
        duration_months,
        total_cost,
        cost_per_fp,
        cost_per_person,
        by_type,
        by_complexity,
        productivity: ProductivityMetrics {
            hours_per_fp,
            fp_per_day,
            team_efficiency,
            rating,
        },
        risk,
        phases,
    }
}

fn breakdown_by(
    components: &[ClassifiedComponent],
    total_fp: u32,
    label_of: impl Fn(&ClassifiedComponent) -> String,
) -> Vec<Breakdown> {
    let mut groups: Vec<Breakdown> = Vec::new();

    for component in components {
        let label = label_of(component);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => {
                group.count += 1;
                group.function_points += component.function_points;
            }
            None => groups.push(Breakdown {
                label,
                count: 1,
                function_points: component.function_points,
                percentage: 0.0,
            }),
        }
    }

    for group in &mut groups {
        group.percentage = if total_fp == 0 {
            0.0
        } else {
            group.function_points as f64 / total_fp as f64 * 100.0
        };
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProjectConfig {
        ProjectConfig {
            average_daily_working_hours: 8.0,
            team_size: 4,
            hourly_rate_brl: 100.0,
            productivity_factor: Some(10.0),
        }
    }

    fn policy() -> CalculationPolicy {
        CalculationPolicy::default()
    }

    fn component(
        component_type: ComponentType,
        complexity: Complexity,
        function_points: u32,
    ) -> ClassifiedComponent {
        ClassifiedComponent {
            component_type,
            complexity,
            function_points,
        }
    }

    #[test]
    fn test_basic_aggregate() {
        let components = vec![
            component(ComponentType::Ali, Complexity::Low, 7),
            component(ComponentType::Ei, Complexity::Average, 4),
            component(ComponentType::Eo, Complexity::High, 7),
        ];
        let result = calculate(&components, &config(), None, &policy());

        assert_eq!(result.unadjusted_fp, 18);
        // No GSC: factor 1.0, adjusted equals unadjusted
        assert_eq!(result.adjustment.factor, 1.0);
        assert_eq!(result.adjustment.tdi, None);
        assert!((result.adjusted_fp - 18.0).abs() < 1e-12);
        assert!((result.effort_hours - 180.0).abs() < 1e-12);
        assert!((result.total_cost - 18_000.0).abs() < 1e-9);
        // 180h / (4 people * 8h) = 5.625 days
        assert!((result.duration_days.unwrap() - 5.625).abs() < 1e-12);
        assert!((result.duration_months.unwrap() - 5.625 / 21.0).abs() < 1e-12);
        assert!((result.cost_per_fp.unwrap() - 1000.0).abs() < 1e-9);
        assert!((result.cost_per_person.unwrap() - 4500.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjusted_equals_unadjusted_times_factor() {
        let components = vec![component(ComponentType::Ali, Complexity::Average, 10)];
        let gsc = Gsc::new(vec![3, 2, 5, 0, 1, 4, 3, 2, 5, 0, 1, 4, 3, 2]).unwrap();
        let result = calculate(&components, &config(), Some(&gsc), &policy());

        assert_eq!(result.adjustment.tdi, Some(35));
        assert!((result.adjustment.factor - 1.0).abs() < 1e-12);
        assert_eq!(
            result.adjusted_fp,
            result.unadjusted_fp as f64 * result.adjustment.factor
        );
    }

    #[test]
    fn test_all_zero_gsc_differs_from_absent() {
        let components = vec![component(ComponentType::Ali, Complexity::Low, 7)];
        let zero_gsc = Gsc::new(vec![0; 14]).unwrap();

        let with_zero = calculate(&components, &config(), Some(&zero_gsc), &policy());
        assert_eq!(with_zero.adjustment.tdi, Some(0));
        assert!((with_zero.adjustment.factor - 0.65).abs() < 1e-12);
        assert!((with_zero.adjusted_fp - 4.55).abs() < 1e-12);

        let without = calculate(&components, &config(), None, &policy());
        assert_eq!(without.adjustment.tdi, None);
        assert_eq!(without.adjustment.factor, 1.0);
    }

    #[test]
    fn test_empty_component_list_yields_undefined_quotients() {
        let result = calculate(&[], &config(), None, &policy());

        assert_eq!(result.unadjusted_fp, 0);
        assert_eq!(result.adjusted_fp, 0.0);
        assert_eq!(result.effort_hours, 0.0);
        assert_eq!(result.cost_per_fp, None);
        assert_eq!(result.productivity.hours_per_fp, None);
        assert_eq!(result.productivity.fp_per_day, None);
        assert_eq!(result.productivity.team_efficiency, None);
        assert_eq!(result.productivity.rating, None);
        assert!(result.by_type.is_empty());
        assert!(result.by_complexity.is_empty());
    }

    #[test]
    fn test_zero_team_yields_undefined_duration() {
        let mut cfg = config();
        cfg.team_size = 0;
        let components = vec![component(ComponentType::Ali, Complexity::Low, 7)];
        let result = calculate(&components, &cfg, None, &policy());

        assert_eq!(result.duration_days, None);
        assert_eq!(result.duration_months, None);
        assert_eq!(result.cost_per_person, None);
        assert_eq!(result.productivity.fp_per_day, None);
        // Values that do not divide by team size remain defined
        assert!(result.effort_hours > 0.0);
        assert!(result.cost_per_fp.is_some());
    }

    #[test]
    fn test_productivity_factor_falls_back_to_policy() {
        let mut cfg = config();
        cfg.productivity_factor = None;
        let components = vec![component(ComponentType::Ali, Complexity::Low, 7)];
        let result = calculate(&components, &cfg, None, &policy());

        assert_eq!(result.productivity_factor, policy().default_productivity_factor);
        assert!((result.effort_hours - 70.0).abs() < 1e-12);
    }

    #[test]
    fn test_breakdowns_sum_to_total() {
        let components = vec![
            component(ComponentType::Ali, Complexity::Low, 7),
            component(ComponentType::Ali, Complexity::High, 15),
            component(ComponentType::Ei, Complexity::Low, 3),
        ];
        let result = calculate(&components, &config(), None, &policy());

        let type_total: u32 = result.by_type.iter().map(|b| b.function_points).sum();
        assert_eq!(type_total, result.unadjusted_fp);
        let pct_total: f64 = result.by_type.iter().map(|b| b.percentage).sum();
        assert!((pct_total - 100.0).abs() < 1e-9);

        let ali = result.by_type.iter().find(|b| b.label == "ALI").unwrap();
        assert_eq!(ali.count, 2);
        assert_eq!(ali.function_points, 22);

        let high = result
            .by_complexity
            .iter()
            .find(|b| b.label == "high")
            .unwrap();
        assert_eq!(high.count, 1);
        assert_eq!(high.function_points, 15);
    }

    #[test]
    fn test_phase_shares_sum_to_one_and_apportion_effort() {
        let components = vec![component(ComponentType::Ali, Complexity::Average, 10)];
        let result = calculate(&components, &config(), None, &policy());

        let share_total: f64 = result.phases.iter().map(|p| p.share).sum();
        assert!((share_total - 1.0).abs() < 1e-12);

        let effort_total: f64 = result.phases.iter().map(|p| p.effort_hours).sum();
        assert!((effort_total - result.effort_hours).abs() < 1e-9);

        let cost_total: f64 = result.phases.iter().map(|p| p.cost).sum();
        assert!((cost_total - result.total_cost).abs() < 1e-9);
    }

    #[test]
    fn test_hours_per_fp_equals_productivity_factor() {
        let components = vec![component(ComponentType::Eq, Complexity::Low, 3)];
        let result = calculate(&components, &config(), None, &policy());
        assert!((result.productivity.hours_per_fp.unwrap() - 10.0).abs() < 1e-12);
        assert_eq!(
            result.productivity.rating,
            Some(ProductivityRating::Average)
        );
    }

    #[test]
    fn test_team_efficiency_is_bounded() {
        let mut cfg = config();
        cfg.productivity_factor = Some(5.0); // better than baseline
        let components = vec![component(ComponentType::Ali, Complexity::Low, 7)];
        let result = calculate(&components, &cfg, None, &policy());
        assert_eq!(result.productivity.team_efficiency, Some(1.0));

        cfg.productivity_factor = Some(20.0); // worse than baseline
        let result = calculate(&components, &cfg, None, &policy());
        assert!((result.productivity.team_efficiency.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let components = vec![
            component(ComponentType::Ali, Complexity::Low, 7),
            component(ComponentType::Eo, Complexity::High, 7),
        ];
        let gsc = Gsc::new(vec![1; 14]).unwrap();

        let a = calculate(&components, &config(), Some(&gsc), &policy());
        let b = calculate(&components, &config(), Some(&gsc), &policy());

        assert_eq!(a.unadjusted_fp, b.unadjusted_fp);
        assert_eq!(a.adjusted_fp, b.adjusted_fp);
        assert_eq!(a.effort_hours, b.effort_hours);
        assert_eq!(a.risk.overall, b.risk.overall);
    }
}
