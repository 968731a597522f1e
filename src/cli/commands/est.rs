//! `metria est` command - Estimate management

use chrono::{Duration, Utc};
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::{escape_csv, format_metric, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Entity, Status};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::{parse_entity_reference, ShortIdIndex};
use crate::core::Config;
use crate::entities::component::Component;
use crate::entities::estimate::Estimate;
use crate::fpa::calculation::{calculate, CalculationResult, ProjectConfig};
use crate::fpa::gsc::{Gsc, GSC_COUNT};
use crate::fpa::ValidationError;

#[derive(Subcommand, Debug)]
pub enum EstCommands {
    /// List estimates with filtering
    List(ListArgs),

    /// Create a new estimate
    New(NewArgs),

    /// Show an estimate's details
    Show(ShowArgs),

    /// Edit an estimate in your editor
    Edit(EditArgs),

    /// Set or clear the 14 general system characteristic scores
    Gsc(GscArgs),

    /// Run the FPA calculation over the estimate's components
    Calc(CalcArgs),
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

impl StatusFilter {
    fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::Draft => status == Status::Draft,
            StatusFilter::Review => status == Status::Review,
            StatusFilter::Approved => status == Status::Approved,
            StatusFilter::Released => status == Status::Released,
            StatusFilter::Obsolete => status == Status::Obsolete,
            StatusFilter::All => true,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Search in title and description
    #[arg(long)]
    pub search: Option<String>,

    /// Filter by author
    #[arg(long, short = 'a')]
    pub author: Option<String>,

    /// Show only estimates created in the last N days
    #[arg(long)]
    pub recent: Option<u32>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Estimate title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Team size (people)
    #[arg(long, default_value = "4")]
    pub team_size: u32,

    /// Average working hours per person per day
    #[arg(long, default_value = "8.0")]
    pub daily_hours: f64,

    /// Hourly rate in BRL
    #[arg(long, default_value = "100.0")]
    pub hourly_rate: f64,

    /// Productivity factor (hours per function point)
    #[arg(long)]
    pub productivity_factor: Option<f64>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Estimate ID or short ID (EST@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Estimate ID or short ID (EST@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct GscArgs {
    /// Estimate ID or short ID (EST@N)
    pub id: String,

    /// The 14 scores, comma-separated (e.g. "3,2,5,0,1,4,3,2,5,0,1,4,3,2")
    #[arg(long, conflicts_with = "clear", allow_hyphen_values = true)]
    pub scores: Option<String>,

    /// Remove the GSC scores (VAF falls back to 1.0)
    #[arg(long)]
    pub clear: bool,
}

#[derive(clap::Args, Debug)]
pub struct CalcArgs {
    /// Estimate ID or short ID (EST@N)
    pub id: String,
}

/// Run an est subcommand
pub fn run(cmd: EstCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EstCommands::List(args) => run_list(args, global),
        EstCommands::New(args) => run_new(args),
        EstCommands::Show(args) => run_show(args, global),
        EstCommands::Edit(args) => run_edit(args),
        EstCommands::Gsc(args) => run_gsc(args),
        EstCommands::Calc(args) => run_calc(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut estimates: Vec<Estimate> = loader::load_all(&project, EntityPrefix::Est)?;

    estimates.retain(|e| args.status.matches(e.status));
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        estimates.retain(|e| {
            e.title.to_lowercase().contains(&needle)
                || e.description
                    .as_ref()
                    .map_or(false, |d| d.to_lowercase().contains(&needle))
        });
    }
    if let Some(ref author) = args.author {
        let needle = author.to_lowercase();
        estimates.retain(|e| e.author.to_lowercase().contains(&needle));
    }
    if let Some(days) = args.recent {
        let cutoff = Utc::now() - Duration::days(days as i64);
        estimates.retain(|e| e.created >= cutoff);
    }

    estimates.sort_by(|a, b| a.created.cmp(&b.created));
    if let Some(limit) = args.limit {
        estimates.truncate(limit);
    }

    if args.count {
        println!("{}", estimates.len());
        return Ok(());
    }
    if estimates.is_empty() {
        println!("No estimates found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(estimates.iter().map(|e| e.id.to_string()));
    let _ = short_ids.save(&project);

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&estimates).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&estimates).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,team_size,status,author");
            for e in &estimates {
                let short_id = short_ids
                    .get_short_id(&e.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    short_id,
                    e.id,
                    escape_csv(&e.title),
                    e.config.team_size,
                    e.status(),
                    escape_csv(&e.author)
                );
            }
        }
        OutputFormat::Md => {
            println!("| ID | Title | Team | Status | Author |");
            println!("|----|-------|------|--------|--------|");
            for e in &estimates {
                let short_id = short_ids.get_short_id(&e.id.to_string()).unwrap_or(0);
                println!(
                    "| EST@{} | {} | {} | {} | {} |",
                    short_id,
                    e.title,
                    e.config.team_size,
                    e.status(),
                    e.author
                );
            }
        }
        OutputFormat::Id => {
            for e in &estimates {
                println!("{}", e.id);
            }
        }
        _ => {
            println!(
                "{:<8} {:<26} {:<6} {:<10} {:<15}",
                style("SHORT").bold(),
                style("TITLE").bold(),
                style("TEAM").bold(),
                style("STATUS").bold(),
                style("AUTHOR").bold()
            );
            println!("{}", "-".repeat(68));
            for e in &estimates {
                let short_id = short_ids
                    .get_short_id(&e.id.to_string())
                    .map(|n| format!("EST@{}", n))
                    .unwrap_or_default();
                println!(
                    "{:<8} {:<26} {:<6} {:<10} {:<15}",
                    style(short_id).cyan(),
                    truncate_str(&e.title, 24),
                    e.config.team_size,
                    e.status(),
                    truncate_str(&e.author, 13)
                );
            }
            println!();
            println!(
                "{} estimate(s) found. Use {} to reference by short ID.",
                style(estimates.len()).cyan(),
                style("EST@N").cyan()
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let (title, project_config) = if args.interactive {
        prompt_for_estimate(&args)?
    } else {
        let title = args
            .title
            .clone()
            .ok_or_else(|| miette::miette!("--title is required (or use --interactive)"))?;
        (
            title,
            ProjectConfig {
                average_daily_working_hours: args.daily_hours,
                team_size: args.team_size,
                hourly_rate_brl: args.hourly_rate,
                productivity_factor: args.productivity_factor,
            },
        )
    };

    let estimate = Estimate::new(title, project_config, config.author());
    let path = project.entity_path(EntityPrefix::Est, &estimate.id);
    let yaml = serde_yml::to_string(&estimate).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(estimate.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created estimate {} ({})",
        style("✓").green(),
        style(&estimate.id).cyan(),
        style(format!("EST@{}", short_id)).cyan()
    );

    if args.edit {
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn prompt_for_estimate(args: &NewArgs) -> Result<(String, ProjectConfig)> {
    let title: String = dialoguer::Input::new()
        .with_prompt("Estimate title")
        .with_initial_text(args.title.clone().unwrap_or_default())
        .interact_text()
        .into_diagnostic()?;

    let team_size: u32 = dialoguer::Input::new()
        .with_prompt("Team size")
        .default(args.team_size)
        .interact_text()
        .into_diagnostic()?;

    let daily_hours: f64 = dialoguer::Input::new()
        .with_prompt("Average daily working hours")
        .default(args.daily_hours)
        .interact_text()
        .into_diagnostic()?;

    let hourly_rate: f64 = dialoguer::Input::new()
        .with_prompt("Hourly rate (BRL)")
        .default(args.hourly_rate)
        .interact_text()
        .into_diagnostic()?;

    Ok((
        title,
        ProjectConfig {
            average_daily_working_hours: daily_hours,
            team_size,
            hourly_rate_brl: hourly_rate,
            productivity_factor: args.productivity_factor,
        },
    ))
}

fn load_estimate(project: &Project, reference: &str) -> Result<(std::path::PathBuf, Estimate)> {
    let id = parse_entity_reference(reference, project);
    loader::load_entity(project, EntityPrefix::Est, &id)?
        .ok_or_else(|| miette::miette!("estimate '{}' not found", reference))
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, estimate) = load_estimate(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&estimate).into_diagnostic()?
            );
        }
        _ => {
            print!("{}", serde_yml::to_string(&estimate).into_diagnostic()?);
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _) = load_estimate(&project, &args.id)?;

    let config = Config::load();
    config.run_editor(&path).into_diagnostic()?;

    // Re-parse to surface any errors introduced by the edit
    let content = fs::read_to_string(&path).into_diagnostic()?;
    match serde_yml::from_str::<Estimate>(&content) {
        Ok(estimate) => {
            println!(
                "{} Updated estimate {}",
                style("✓").green(),
                style(&estimate.id).cyan()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!(
            "edited file no longer parses as an estimate: {}",
            e
        )),
    }
}

fn run_gsc(args: GscArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut estimate) = load_estimate(&project, &args.id)?;

    if args.clear {
        estimate.gsc = None;
        let yaml = serde_yml::to_string(&estimate).into_diagnostic()?;
        fs::write(&path, yaml).into_diagnostic()?;
        println!(
            "{} Cleared GSC scores on {} (VAF falls back to 1.0)",
            style("✓").green(),
            style(&estimate.id).cyan()
        );
        return Ok(());
    }

    let scores_text = args
        .scores
        .ok_or_else(|| miette::miette!("--scores is required (or use --clear)"))?;

    let mut scores = Vec::with_capacity(GSC_COUNT);
    for (index, part) in scores_text.split(',').enumerate() {
        let value: i64 = part
            .trim()
            .parse()
            .map_err(|_| miette::miette!("score #{} ('{}') is not an integer", index + 1, part))?;
        if value < 0 {
            return Err(ValidationError::NegativeCount {
                field: format!("gsc score #{}", index + 1),
                value,
            }
            .into());
        }
        if value > u8::MAX as i64 {
            return Err(ValidationError::GscScoreOutOfRange {
                index,
                value: u8::MAX,
            }
            .into());
        }
        scores.push(value as u8);
    }

    let gsc = Gsc::new(scores)?;
    let tdi = gsc.total_degree_of_influence();
    let vaf = gsc.value_adjustment_factor();
    estimate.gsc = Some(gsc);

    let yaml = serde_yml::to_string(&estimate).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    println!(
        "{} GSC set on {}: TDI {} , VAF {:.2}",
        style("✓").green(),
        style(&estimate.id).cyan(),
        style(tdi).cyan(),
        style(vaf).cyan()
    );

    Ok(())
}

/// Load an estimate's components, in creation order
pub(crate) fn load_components(project: &Project, estimate: &Estimate) -> Result<Vec<Component>> {
    let mut components: Vec<Component> =
        loader::load_all(&project, EntityPrefix::Cmp)?;
    components.retain(|c| c.estimate == estimate.id);
    components.sort_by(|a, b| a.created.cmp(&b.created));
    Ok(components)
}

fn run_calc(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, estimate) = load_estimate(&project, &args.id)?;
    let components = load_components(&project, &estimate)?;

    let policy = Config::load().calculation();
    let classified: Vec<_> = components.iter().map(|c| c.classified()).collect();
    let result = calculate(&classified, &estimate.config, estimate.gsc.as_ref(), &policy);

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&result).into_diagnostic()?);
        }
        OutputFormat::Md => {
            print!(
                "{}",
                super::report::fpa::render_markdown(&estimate, &components, &result)
            );
        }
        _ => print_human_report(&estimate, components.len(), &result),
    }

    Ok(())
}

fn print_human_report(estimate: &Estimate, component_count: usize, result: &CalculationResult) {
    println!(
        "{} {}",
        style("Estimate:").bold(),
        style(&estimate.title).cyan()
    );
    println!();

    println!("{}", style("Function points").bold().underlined());
    println!("  unadjusted (PFNA)   {}", result.unadjusted_fp);
    match result.adjustment.tdi {
        Some(tdi) => println!(
            "  TDI / VAF           {} / {:.2}",
            tdi, result.adjustment.factor
        ),
        None => println!("  TDI / VAF           no GSC supplied / 1.00"),
    }
    println!("  adjusted (PFA)      {:.2}", result.adjusted_fp);
    println!();

    println!("{}", style("Effort and cost").bold().underlined());
    println!(
        "  productivity        {:.1} h/FP",
        result.productivity_factor
    );
    println!("  effort              {:.1} h", result.effort_hours);
    println!(
        "  duration            {} days ({} months)",
        format_metric(result.duration_days, 1),
        format_metric(result.duration_months, 1)
    );
    println!("  total cost          R$ {:.2}", result.total_cost);
    println!(
        "  cost per FP         {}",
        format_metric(result.cost_per_fp, 2)
    );
    println!(
        "  cost per person     {}",
        format_metric(result.cost_per_person, 2)
    );
    println!();

    if !result.by_type.is_empty() {
        println!("{}", style("By type").bold().underlined());
        for group in &result.by_type {
            println!(
                "  {:<10} {:>3} component(s) {:>5} FP  {:>5.1}%",
                group.label, group.count, group.function_points, group.percentage
            );
        }
        println!();

        println!("{}", style("By complexity").bold().underlined());
        for group in &result.by_complexity {
            println!(
                "  {:<10} {:>3} component(s) {:>5} FP  {:>5.1}%",
                group.label, group.count, group.function_points, group.percentage
            );
        }
        println!();
    }

    println!("{}", style("Productivity").bold().underlined());
    println!(
        "  hours per FP        {}",
        format_metric(result.productivity.hours_per_fp, 2)
    );
    println!(
        "  FP per day          {}",
        format_metric(result.productivity.fp_per_day, 2)
    );
    println!(
        "  team efficiency     {}",
        format_metric(result.productivity.team_efficiency, 2)
    );
    match result.productivity.rating {
        Some(rating) => println!("  industry rating     {}", rating),
        None => println!("  industry rating     n/a"),
    }
    println!();

    println!("{}", style("Risk").bold().underlined());
    for factor in &result.risk.factors {
        let tier = match factor.tier {
            crate::fpa::RiskTier::Low => style(factor.tier.to_string()).green(),
            crate::fpa::RiskTier::Medium => style(factor.tier.to_string()).yellow(),
            crate::fpa::RiskTier::High => style(factor.tier.to_string()).red(),
        };
        println!("  {:<26} {:<8} {}", factor.name, tier, factor.detail);
    }
    println!(
        "  {:<26} {}",
        style("overall").bold(),
        style(result.risk.overall.to_string()).bold()
    );
    for recommendation in &result.risk.recommendations {
        println!("  {} {}", style("→").blue(), recommendation);
    }
    println!();

    println!("{}", style("Phases").bold().underlined());
    for phase in &result.phases {
        println!(
            "  {:<10} {:>4.0}%  {:>8.1} h  R$ {:>10.2}",
            phase.phase,
            phase.share * 100.0,
            phase.effort_hours,
            phase.cost
        );
    }
    println!();

    println!(
        "{} component(s) aggregated.",
        style(component_count).cyan()
    );
}
