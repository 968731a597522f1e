//! `metria plan` command - Measurement plan management
//!
//! The GQM nesting (objectives, questions, metrics, measurement
//! definitions) is edited as YAML in the user's editor; the CLI keeps
//! creation, listing and inspection.

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Entity, Status};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::{parse_entity_reference, ShortIdIndex};
use crate::core::Config;
use crate::entities::plan::MeasurementPlan;

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// List measurement plans
    List(ListArgs),

    /// Create a new measurement plan
    New(NewArgs),

    /// Show a plan's details
    Show(ShowArgs),

    /// Edit a plan in your editor
    Edit(EditArgs),
}

/// Status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Draft,
    Review,
    Approved,
    Released,
    Obsolete,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Search in title
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Plan title
    #[arg(long, short = 't')]
    pub title: String,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Plan ID or short ID (PLAN@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Plan ID or short ID (PLAN@N)
    pub id: String,
}

/// Run a plan subcommand
pub fn run(cmd: PlanCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PlanCommands::List(args) => run_list(args, global),
        PlanCommands::New(args) => run_new(args),
        PlanCommands::Show(args) => run_show(args, global),
        PlanCommands::Edit(args) => run_edit(args),
    }
}

pub(crate) fn load_plan(project: &Project, reference: &str) -> Result<(PathBuf, MeasurementPlan)> {
    let id = parse_entity_reference(reference, project);
    loader::load_entity(project, EntityPrefix::Plan, &id)?
        .ok_or_else(|| miette::miette!("plan '{}' not found", reference))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut plans: Vec<MeasurementPlan> =
        loader::load_all(&project, EntityPrefix::Plan)?;

    plans.retain(|p| match args.status {
        StatusFilter::Draft => p.status == Status::Draft,
        StatusFilter::Review => p.status == Status::Review,
        StatusFilter::Approved => p.status == Status::Approved,
        StatusFilter::Released => p.status == Status::Released,
        StatusFilter::Obsolete => p.status == Status::Obsolete,
        StatusFilter::All => true,
    });
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        plans.retain(|p| p.title.to_lowercase().contains(&needle));
    }
    plans.sort_by(|a, b| a.created.cmp(&b.created));

    if args.count {
        println!("{}", plans.len());
        return Ok(());
    }
    if plans.is_empty() {
        println!("No plans found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(plans.iter().map(|p| p.id.to_string()));
    let _ = short_ids.save(&project);

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plans).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&plans).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,objectives,metrics,status");
            for p in &plans {
                let short_id = short_ids
                    .get_short_id(&p.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    short_id,
                    p.id,
                    escape_csv(&p.title),
                    p.objectives.len(),
                    p.metrics().count(),
                    p.status()
                );
            }
        }
        OutputFormat::Id => {
            for p in &plans {
                println!("{}", p.id);
            }
        }
        _ => {
            println!(
                "{:<9} {:<26} {:<11} {:<8} {:<10}",
                style("SHORT").bold(),
                style("TITLE").bold(),
                style("OBJECTIVES").bold(),
                style("METRICS").bold(),
                style("STATUS").bold()
            );
            println!("{}", "-".repeat(68));
            for p in &plans {
                let short_id = short_ids
                    .get_short_id(&p.id.to_string())
                    .map(|n| format!("PLAN@{}", n))
                    .unwrap_or_default();
                println!(
                    "{:<9} {:<26} {:<11} {:<8} {:<10}",
                    style(short_id).cyan(),
                    truncate_str(&p.title, 24),
                    p.objectives.len(),
                    p.metrics().count(),
                    p.status()
                );
            }
            println!();
            println!(
                "{} plan(s) found. Use {} to reference by short ID.",
                style(plans.len()).cyan(),
                style("PLAN@N").cyan()
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let plan = MeasurementPlan::new(args.title, config.author());
    let path = project.entity_path(EntityPrefix::Plan, &plan.id);
    let yaml = serde_yml::to_string(&plan).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(plan.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created plan {} ({})",
        style("✓").green(),
        style(&plan.id).cyan(),
        style(format!("PLAN@{}", short_id)).cyan()
    );
    println!(
        "  Add objectives, questions and metrics with {}",
        style(format!("metria plan edit PLAN@{}", short_id)).yellow()
    );

    if args.edit {
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, plan) = load_plan(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(&plan).into_diagnostic()?);
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _) = load_plan(&project, &args.id)?;

    let config = Config::load();
    config.run_editor(&path).into_diagnostic()?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    match serde_yml::from_str::<MeasurementPlan>(&content) {
        Ok(plan) => {
            // Surface structural problems right away, but keep the edit
            for issue in plan.validate() {
                println!("{} {}", style("!").yellow(), issue);
            }
            println!(
                "{} Updated plan {} ({} metric(s))",
                style("✓").green(),
                style(&plan.id).cyan(),
                plan.metrics().count()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!(
            "edited file no longer parses as a plan: {}",
            e
        )),
    }
}
