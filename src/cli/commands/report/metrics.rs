//! Metric values per cycle for a measurement plan

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::entities::cycle::Cycle;
use crate::entities::plan::Metric;
use crate::formula::{self, EvalError};

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct MetricsArgs {
    /// Plan ID or short ID (PLAN@N)
    pub id: String,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: MetricsArgs, _global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, plan) = super::super::plan::load_plan(&project, &args.id)?;

    let mut cycles: Vec<Cycle> = loader::load_all(&project, EntityPrefix::Cyc)?;
    cycles.retain(|c| c.plan == plan.id);
    cycles.sort_by(|a, b| a.start_date.cmp(&b.start_date));

    let metrics: Vec<&Metric> = plan.metrics().filter(|m| m.formula.is_some()).collect();

    let mut output = String::new();
    output.push_str(&format!("# Metric Report: {}\n\n", plan.title));

    if metrics.is_empty() {
        output.push_str("No metrics with formulas defined.\n");
        write_output(&output, args.output)?;
        return Ok(());
    }
    if cycles.is_empty() {
        output.push_str("No cycles recorded for this plan.\n");
        write_output(&output, args.output)?;
        return Ok(());
    }

    let mut builder = Builder::default();
    let mut header = vec!["Metric".to_string(), "Formula".to_string()];
    header.extend(cycles.iter().map(|c| c.title.clone()));
    builder.push_record(header);

    for metric in &metrics {
        let formula_text = metric.formula.as_deref().unwrap_or_default();
        let mut row = vec![metric.name.clone(), formula_text.to_string()];
        for cycle in &cycles {
            row.push(render_cell(metric, formula_text, cycle));
        }
        builder.push_record(row);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');

    output.push_str("\n## Summary\n\n");
    output.push_str(&format!("- **Metrics:** {}\n", metrics.len()));
    output.push_str(&format!("- **Cycles:** {}\n", cycles.len()));

    write_output(&output, args.output)?;
    Ok(())
}

fn render_cell(metric: &Metric, formula_text: &str, cycle: &Cycle) -> String {
    let snapshot = cycle.snapshot_for(metric);
    match formula::evaluate(formula_text, &snapshot) {
        Ok(evaluation) => match evaluation.calculated_value {
            Some(value) => format!("{:.4}", value),
            None => "undefined".to_string(),
        },
        Err(EvalError::MissingMeasurement(e)) => {
            format!("missing: {}", e.missing.join(", "))
        }
        Err(EvalError::Syntax(_)) => "invalid formula".to_string(),
    }
}
