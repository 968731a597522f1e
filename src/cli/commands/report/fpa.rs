//! FPA calculation report for an estimate

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::format_metric;
use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::parse_entity_reference;
use crate::core::Config;
use crate::entities::component::Component;
use crate::entities::estimate::Estimate;
use crate::fpa::calculation::{calculate, CalculationResult};
use crate::fpa::RiskTier;

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct FpaArgs {
    /// Estimate ID or short ID (EST@N)
    pub id: String,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: FpaArgs, _global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let id = parse_entity_reference(&args.id, &project);
    let (_, estimate) = loader::load_entity::<Estimate>(&project, EntityPrefix::Est, &id)?
        .ok_or_else(|| miette::miette!("estimate '{}' not found", args.id))?;

    let components = super::super::est::load_components(&project, &estimate)?;
    let policy = Config::load().calculation();
    let classified: Vec<_> = components.iter().map(|c| c.classified()).collect();
    let result = calculate(&classified, &estimate.config, estimate.gsc.as_ref(), &policy);

    let output = render_markdown(&estimate, &components, &result);
    write_output(&output, args.output)?;
    Ok(())
}

/// Render the full calculation as a markdown report
pub(crate) fn render_markdown(
    estimate: &Estimate,
    components: &[Component],
    result: &CalculationResult,
) -> String {
    let mut output = String::new();
    output.push_str(&format!("# FPA Report: {}\n\n", estimate.title));

    // Components with their derived classification
    output.push_str("## Components\n\n");
    if components.is_empty() {
        output.push_str("No components recorded.\n");
    } else {
        let mut builder = Builder::default();
        builder.push_record(["Title", "Type", "RET/FTR", "DET", "Complexity", "FP"]);
        for component in components {
            let structural = if component.component_type.is_data_function() {
                component.record_element_types
            } else {
                component.file_types_referenced
            };
            builder.push_record([
                component.title.clone(),
                component.component_type.to_string(),
                structural.map_or("-".to_string(), |v| v.to_string()),
                component
                    .data_element_types
                    .map_or("-".to_string(), |v| v.to_string()),
                component.complexity().to_string(),
                component.function_points().to_string(),
            ]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push('\n');
    }

    // Totals
    output.push_str("\n## Function Points\n\n");
    output.push_str(&format!(
        "- **Unadjusted (PFNA):** {}\n",
        result.unadjusted_fp
    ));
    match result.adjustment.tdi {
        Some(tdi) => {
            output.push_str(&format!("- **TDI:** {}\n", tdi));
            output.push_str(&format!("- **VAF:** {:.2}\n", result.adjustment.factor));
        }
        None => output.push_str("- **VAF:** 1.00 (no GSC supplied)\n"),
    }
    output.push_str(&format!("- **Adjusted (PFA):** {:.2}\n", result.adjusted_fp));

    // Effort and cost
    output.push_str("\n## Effort and Cost\n\n");
    output.push_str(&format!(
        "- **Productivity factor:** {:.1} h/FP\n",
        result.productivity_factor
    ));
    output.push_str(&format!("- **Effort:** {:.1} h\n", result.effort_hours));
    output.push_str(&format!(
        "- **Duration:** {} days ({} months)\n",
        format_metric(result.duration_days, 1),
        format_metric(result.duration_months, 1)
    ));
    output.push_str(&format!("- **Total cost:** R$ {:.2}\n", result.total_cost));
    output.push_str(&format!(
        "- **Cost per FP:** {}\n",
        format_metric(result.cost_per_fp, 2)
    ));
    output.push_str(&format!(
        "- **Cost per person:** {}\n",
        format_metric(result.cost_per_person, 2)
    ));

    // Breakdowns
    if !result.by_type.is_empty() {
        output.push_str("\n## Breakdown by Type\n\n");
        let mut builder = Builder::default();
        builder.push_record(["Type", "Count", "FP", "Share"]);
        for group in &result.by_type {
            builder.push_record([
                group.label.clone(),
                group.count.to_string(),
                group.function_points.to_string(),
                format!("{:.1}%", group.percentage),
            ]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push('\n');

        output.push_str("\n## Breakdown by Complexity\n\n");
        let mut builder = Builder::default();
        builder.push_record(["Complexity", "Count", "FP", "Share"]);
        for group in &result.by_complexity {
            builder.push_record([
                group.label.clone(),
                group.count.to_string(),
                group.function_points.to_string(),
                format!("{:.1}%", group.percentage),
            ]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push('\n');
    }

    // Productivity
    output.push_str("\n## Productivity\n\n");
    output.push_str(&format!(
        "- **Hours per FP:** {}\n",
        format_metric(result.productivity.hours_per_fp, 2)
    ));
    output.push_str(&format!(
        "- **FP per day:** {}\n",
        format_metric(result.productivity.fp_per_day, 2)
    ));
    output.push_str(&format!(
        "- **Team efficiency:** {}\n",
        format_metric(result.productivity.team_efficiency, 2)
    ));
    match result.productivity.rating {
        Some(rating) => output.push_str(&format!("- **Industry rating:** {}\n", rating)),
        None => output.push_str("- **Industry rating:** n/a\n"),
    }

    // Risk
    output.push_str("\n## Risk\n\n");
    let mut builder = Builder::default();
    builder.push_record(["Factor", "Tier", "Detail"]);
    for factor in &result.risk.factors {
        builder.push_record([
            factor.name.clone(),
            factor.tier.to_string(),
            factor.detail.clone(),
        ]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');
    output.push_str(&format!("\n**Overall risk:** {}\n", result.risk.overall));
    if result.risk.overall != RiskTier::Low {
        output.push_str("\nRecommendations:\n\n");
        for recommendation in &result.risk.recommendations {
            output.push_str(&format!("- {}\n", recommendation));
        }
    }

    // Phases
    output.push_str("\n## Phase Breakdown\n\n");
    let mut builder = Builder::default();
    builder.push_record(["Phase", "Share", "Effort (h)", "Cost (R$)"]);
    for phase in &result.phases {
        builder.push_record([
            phase.phase.clone(),
            format!("{:.0}%", phase.share * 100.0),
            format!("{:.1}", phase.effort_hours),
            format!("{:.2}", phase.cost),
        ]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');

    output
}
