//! `metria cycle` command - Reporting cycle management
//!
//! `record` appends measurement values; `eval` runs the formula engine
//! (parse, resolve, evaluate) for one or all metrics of the cycle's plan.
//! Missing measurements and division by zero are expected, recoverable
//! outcomes and render as such rather than aborting the command.

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::{parse_entity_reference, ShortIdIndex};
use crate::core::Config;
use crate::entities::cycle::Cycle;
use crate::entities::plan::{MeasurementPlan, Metric};
use crate::formula::{self, EvalError};

#[derive(Subcommand, Debug)]
pub enum CycleCommands {
    /// List cycles
    List(ListArgs),

    /// Create a new cycle under a plan
    New(NewArgs),

    /// Show a cycle's details
    Show(ShowArgs),

    /// Edit a cycle in your editor
    Edit(EditArgs),

    /// Record measurement values (ACRONYM=VALUE ...)
    Record(RecordArgs),

    /// Evaluate metric formulas against the cycle's measurements
    Eval(EvalArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by owning plan (ID or PLAN@N)
    #[arg(long, short = 'p')]
    pub plan: Option<String>,

    /// Search in title
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Owning plan (ID or PLAN@N)
    #[arg(long, short = 'p')]
    pub plan: String,

    /// Cycle title (e.g. "2026-Q1")
    #[arg(long, short = 't')]
    pub title: String,

    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Cycle ID or short ID (CYC@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Cycle ID or short ID (CYC@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RecordArgs {
    /// Cycle ID or short ID (CYC@N)
    pub id: String,

    /// Measurements to record, as ACRONYM=VALUE pairs
    #[arg(required = true)]
    pub values: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct EvalArgs {
    /// Cycle ID or short ID (CYC@N)
    pub id: String,

    /// Evaluate a single metric by name (default: every metric with a formula)
    #[arg(long, short = 'm')]
    pub metric: Option<String>,
}

/// Run a cycle subcommand
pub fn run(cmd: CycleCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CycleCommands::List(args) => run_list(args, global),
        CycleCommands::New(args) => run_new(args),
        CycleCommands::Show(args) => run_show(args, global),
        CycleCommands::Edit(args) => run_edit(args),
        CycleCommands::Record(args) => run_record(args),
        CycleCommands::Eval(args) => run_eval(args, global),
    }
}

fn load_cycle(project: &Project, reference: &str) -> Result<(PathBuf, Cycle)> {
    let id = parse_entity_reference(reference, project);
    loader::load_entity(project, EntityPrefix::Cyc, &id)?
        .ok_or_else(|| miette::miette!("cycle '{}' not found", reference))
}

fn load_owning_plan(project: &Project, cycle: &Cycle) -> Result<MeasurementPlan> {
    loader::load_entity(project, EntityPrefix::Plan, &cycle.plan.to_string())?
        .map(|(_, plan)| plan)
        .ok_or_else(|| miette::miette!("plan {} of cycle {} not found", cycle.plan, cycle.id))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut cycles: Vec<Cycle> = loader::load_all(&project, EntityPrefix::Cyc)?;

    if let Some(ref reference) = args.plan {
        let (_, plan) = super::plan::load_plan(&project, reference)?;
        cycles.retain(|c| c.plan == plan.id);
    }
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        cycles.retain(|c| c.title.to_lowercase().contains(&needle));
    }
    cycles.sort_by(|a, b| a.start_date.cmp(&b.start_date));

    if args.count {
        println!("{}", cycles.len());
        return Ok(());
    }
    if cycles.is_empty() {
        println!("No cycles found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(cycles.iter().map(|c| c.id.to_string()));
    let _ = short_ids.save(&project);

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&cycles).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&cycles).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,start,end,measurements");
            for c in &cycles {
                let short_id = short_ids
                    .get_short_id(&c.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    short_id,
                    c.id,
                    escape_csv(&c.title),
                    c.start_date,
                    c.end_date,
                    c.measurements.len()
                );
            }
        }
        OutputFormat::Id => {
            for c in &cycles {
                println!("{}", c.id);
            }
        }
        _ => {
            println!(
                "{:<8} {:<20} {:<12} {:<12} {:<12}",
                style("SHORT").bold(),
                style("TITLE").bold(),
                style("START").bold(),
                style("END").bold(),
                style("VALUES").bold()
            );
            println!("{}", "-".repeat(66));
            for c in &cycles {
                let short_id = short_ids
                    .get_short_id(&c.id.to_string())
                    .map(|n| format!("CYC@{}", n))
                    .unwrap_or_default();
                println!(
                    "{:<8} {:<20} {:<12} {:<12} {:<12}",
                    style(short_id).cyan(),
                    truncate_str(&c.title, 18),
                    c.start_date,
                    c.end_date,
                    c.measurements.len()
                );
            }
            println!();
            println!(
                "{} cycle(s) found. Use {} to reference by short ID.",
                style(cycles.len()).cyan(),
                style("CYC@N").cyan()
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (_, plan) = super::plan::load_plan(&project, &args.plan)?;

    let cycle = Cycle::new(plan.id.clone(), args.title, args.start, args.end, config.author());

    let issues = cycle.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("{}", issues.join("; ")));
    }

    let path = project.entity_path(EntityPrefix::Cyc, &cycle.id);
    let yaml = serde_yml::to_string(&cycle).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(cycle.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created cycle {} ({}) under {}",
        style("✓").green(),
        style(&cycle.id).cyan(),
        style(format!("CYC@{}", short_id)).cyan(),
        style(&plan.id).cyan()
    );

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, cycle) = load_cycle(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cycle).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(&cycle).into_diagnostic()?);
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _) = load_cycle(&project, &args.id)?;

    let config = Config::load();
    config.run_editor(&path).into_diagnostic()?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    match serde_yml::from_str::<Cycle>(&content) {
        Ok(cycle) => {
            for issue in cycle.validate() {
                println!("{} {}", style("!").yellow(), issue);
            }
            println!(
                "{} Updated cycle {}",
                style("✓").green(),
                style(&cycle.id).cyan()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!(
            "edited file no longer parses as a cycle: {}",
            e
        )),
    }
}

fn run_record(args: RecordArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut cycle) = load_cycle(&project, &args.id)?;

    for pair in &args.values {
        let (acronym, value_text) = pair
            .split_once('=')
            .ok_or_else(|| miette::miette!("'{}' is not an ACRONYM=VALUE pair", pair))?;
        let acronym = acronym.trim();
        if acronym.is_empty() {
            return Err(miette::miette!("'{}' has an empty acronym", pair));
        }
        let value: f64 = value_text
            .trim()
            .parse()
            .map_err(|_| miette::miette!("'{}' is not a number in '{}'", value_text, pair))?;
        if !value.is_finite() {
            return Err(miette::miette!("'{}' must be a finite number", pair));
        }
        cycle.record(acronym, value);
        println!(
            "{} Recorded {} = {} in {}",
            style("✓").green(),
            style(acronym).cyan(),
            value,
            style(&cycle.id).cyan()
        );
    }

    let yaml = serde_yml::to_string(&cycle).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    Ok(())
}

fn run_eval(args: EvalArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, cycle) = load_cycle(&project, &args.id)?;
    let plan = load_owning_plan(&project, &cycle)?;

    if let Some(ref name) = args.metric {
        let metric = plan
            .find_metric(name)
            .ok_or_else(|| miette::miette!("plan {} has no metric '{}'", plan.id, name))?;
        return eval_single(metric, &cycle, global);
    }

    let metrics: Vec<&Metric> = plan.metrics().filter(|m| m.formula.is_some()).collect();
    if metrics.is_empty() {
        println!("Plan {} has no metrics with formulas.", plan.id);
        return Ok(());
    }

    if global.format == OutputFormat::Json {
        let mut rows = Vec::new();
        for metric in &metrics {
            rows.push(eval_to_json(metric, &cycle));
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).into_diagnostic()?
        );
        return Ok(());
    }

    println!(
        "{} {} · cycle {}",
        style("Plan:").bold(),
        style(&plan.title).cyan(),
        style(&cycle.title).cyan()
    );
    println!();
    for metric in &metrics {
        print_eval_line(metric, &cycle);
    }

    Ok(())
}

fn eval_single(metric: &Metric, cycle: &Cycle, global: &GlobalOpts) -> Result<()> {
    let formula_text = metric
        .formula
        .as_deref()
        .ok_or_else(|| miette::miette!("metric '{}' has no formula", metric.name))?;

    let snapshot = cycle.snapshot_for(metric);
    let evaluation = formula::evaluate(formula_text, &snapshot)?;

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&evaluation).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&evaluation).into_diagnostic()?);
        }
        _ => {
            match evaluation.calculated_value {
                Some(value) => println!(
                    "{} = {}",
                    style(&metric.name).cyan(),
                    style(value).green()
                ),
                None => println!(
                    "{} = {} (division by zero or undefined arithmetic)",
                    style(&metric.name).cyan(),
                    style("undefined").yellow()
                ),
            }
            for (acronym, value) in &evaluation.variables {
                println!("  {} = {}", acronym, value);
            }
        }
    }

    Ok(())
}

fn print_eval_line(metric: &Metric, cycle: &Cycle) {
    let formula_text = metric.formula.as_deref().unwrap_or_default();
    let snapshot = cycle.snapshot_for(metric);

    match formula::evaluate(formula_text, &snapshot) {
        Ok(evaluation) => match evaluation.calculated_value {
            Some(value) => println!(
                "  {:<24} {} {}",
                style(&metric.name).cyan(),
                style(format!("{:.4}", value)).green(),
                style(format!("({})", formula_text)).dim()
            ),
            None => println!(
                "  {:<24} {} {}",
                style(&metric.name).cyan(),
                style("undefined").yellow(),
                style("(division by zero)").dim()
            ),
        },
        Err(EvalError::MissingMeasurement(e)) => println!(
            "  {:<24} {} missing: {}",
            style(&metric.name).cyan(),
            style("blocked").red(),
            style(e.missing.join(", ")).red()
        ),
        Err(EvalError::Syntax(e)) => println!(
            "  {:<24} {} {}",
            style(&metric.name).cyan(),
            style("invalid formula").red(),
            e.message
        ),
    }
}

fn eval_to_json(metric: &Metric, cycle: &Cycle) -> serde_json::Value {
    let formula_text = metric.formula.as_deref().unwrap_or_default();
    let snapshot = cycle.snapshot_for(metric);

    match formula::evaluate(formula_text, &snapshot) {
        Ok(evaluation) => serde_json::json!({
            "metric": metric.name,
            "calculated_value": evaluation.calculated_value,
            "variables": evaluation.variables,
        }),
        Err(EvalError::MissingMeasurement(e)) => serde_json::json!({
            "metric": metric.name,
            "error": { "kind": "missing_measurement", "missing": e.missing },
        }),
        Err(EvalError::Syntax(e)) => serde_json::json!({
            "metric": metric.name,
            "error": { "kind": "syntax", "message": e.message },
        }),
    }
}
