//! `metria cmp` command - Component management
//!
//! Components never store their complexity or weight; listings and
//! reports recompute both from the structural counts on every run.

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::{parse_entity_reference, ShortIdIndex};
use crate::core::Config;
use crate::entities::component::{Component, SpecialQueryCounts};
use crate::entities::estimate::Estimate;
use crate::fpa::complexity::{checked_count, ComponentType};

#[derive(Subcommand, Debug)]
pub enum CmpCommands {
    /// List components with derived complexity and function points
    List(ListArgs),

    /// Create a new component under an estimate
    New(NewArgs),

    /// Show a component's details (includes derived values)
    Show(ShowArgs),

    /// Edit a component in your editor
    Edit(EditArgs),

    /// Remove component(s)
    #[command(name = "rm")]
    Remove(RemoveArgs),

    /// Bulk-import components from a CSV file
    Import(ImportArgs),
}

/// Component type selection
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TypeArg {
    Ali,
    Aie,
    Ei,
    Eo,
    Eq,
}

impl From<TypeArg> for ComponentType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Ali => ComponentType::Ali,
            TypeArg::Aie => ComponentType::Aie,
            TypeArg::Ei => ComponentType::Ei,
            TypeArg::Eo => ComponentType::Eo,
            TypeArg::Eq => ComponentType::Eq,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by owning estimate (ID or EST@N)
    #[arg(long, short = 'e')]
    pub estimate: Option<String>,

    /// Filter by component type
    #[arg(long, short = 't')]
    pub r#type: Option<TypeArg>,

    /// Search in title
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Owning estimate (ID or EST@N)
    #[arg(long, short = 'e')]
    pub estimate: String,

    /// Component title
    #[arg(long, short = 't')]
    pub title: String,

    /// Component type
    #[arg(long)]
    pub r#type: TypeArg,

    /// Record element types (ALI/AIE)
    #[arg(long, allow_negative_numbers = true)]
    pub ret: Option<i64>,

    /// File types referenced (EI/EO/EQ)
    #[arg(long, allow_negative_numbers = true)]
    pub ftr: Option<i64>,

    /// Data element types
    #[arg(long, allow_negative_numbers = true)]
    pub det: Option<i64>,

    /// Input-side FTR for a two-sided query (requires the other three)
    #[arg(long, allow_negative_numbers = true)]
    pub input_ftr: Option<i64>,

    /// Input-side DET for a two-sided query
    #[arg(long, allow_negative_numbers = true)]
    pub input_det: Option<i64>,

    /// Output-side FTR for a two-sided query
    #[arg(long, allow_negative_numbers = true)]
    pub output_ftr: Option<i64>,

    /// Output-side DET for a two-sided query
    #[arg(long, allow_negative_numbers = true)]
    pub output_det: Option<i64>,

    /// Open in editor after creation
    #[arg(long)]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Component ID or short ID (CMP@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Component ID or short ID (CMP@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Component IDs or short IDs (CMP@N)
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Owning estimate (ID or EST@N)
    #[arg(long, short = 'e')]
    pub estimate: String,

    /// CSV file with columns: title,type,ret,ftr,det,input_ftr,input_det,output_ftr,output_det
    pub file: PathBuf,
}

/// Run a cmp subcommand
pub fn run(cmd: CmpCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CmpCommands::List(args) => run_list(args, global),
        CmpCommands::New(args) => run_new(args),
        CmpCommands::Show(args) => run_show(args, global),
        CmpCommands::Edit(args) => run_edit(args),
        CmpCommands::Remove(args) => run_remove(args),
        CmpCommands::Import(args) => run_import(args),
    }
}

fn resolve_estimate(project: &Project, reference: &str) -> Result<Estimate> {
    let id = parse_entity_reference(reference, project);
    loader::load_entity(project, EntityPrefix::Est, &id)?
        .map(|(_, estimate)| estimate)
        .ok_or_else(|| miette::miette!("estimate '{}' not found", reference))
}

fn load_component(project: &Project, reference: &str) -> Result<(PathBuf, Component)> {
    let id = parse_entity_reference(reference, project);
    loader::load_entity(project, EntityPrefix::Cmp, &id)?
        .ok_or_else(|| miette::miette!("component '{}' not found", reference))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut components: Vec<Component> =
        loader::load_all(&project, EntityPrefix::Cmp)?;

    if let Some(ref reference) = args.estimate {
        let estimate = resolve_estimate(&project, reference)?;
        components.retain(|c| c.estimate == estimate.id);
    }
    if let Some(type_filter) = args.r#type {
        let wanted: ComponentType = type_filter.into();
        components.retain(|c| c.component_type == wanted);
    }
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        components.retain(|c| c.title.to_lowercase().contains(&needle));
    }

    components.sort_by(|a, b| a.created.cmp(&b.created));
    if let Some(limit) = args.limit {
        components.truncate(limit);
    }

    if args.count {
        println!("{}", components.len());
        return Ok(());
    }
    if components.is_empty() {
        println!("No components found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(components.iter().map(|c| c.id.to_string()));
    let _ = short_ids.save(&project);

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&components).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&components).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,type,complexity,function_points,status");
            for c in &components {
                let short_id = short_ids
                    .get_short_id(&c.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{}",
                    short_id,
                    c.id,
                    escape_csv(&c.title),
                    c.component_type,
                    c.complexity(),
                    c.function_points(),
                    c.status()
                );
            }
        }
        OutputFormat::Md => {
            println!("| ID | Title | Type | Complexity | FP |");
            println!("|----|-------|------|------------|----|");
            for c in &components {
                let short_id = short_ids.get_short_id(&c.id.to_string()).unwrap_or(0);
                println!(
                    "| CMP@{} | {} | {} | {} | {} |",
                    short_id,
                    c.title,
                    c.component_type,
                    c.complexity(),
                    c.function_points()
                );
            }
        }
        OutputFormat::Id => {
            for c in &components {
                println!("{}", c.id);
            }
        }
        _ => {
            println!(
                "{:<8} {:<26} {:<6} {:<11} {:<4} {:<10}",
                style("SHORT").bold(),
                style("TITLE").bold(),
                style("TYPE").bold(),
                style("COMPLEXITY").bold(),
                style("FP").bold(),
                style("STATUS").bold()
            );
            println!("{}", "-".repeat(70));
            for c in &components {
                let short_id = short_ids
                    .get_short_id(&c.id.to_string())
                    .map(|n| format!("CMP@{}", n))
                    .unwrap_or_default();
                println!(
                    "{:<8} {:<26} {:<6} {:<11} {:<4} {:<10}",
                    style(short_id).cyan(),
                    truncate_str(&c.title, 24),
                    c.component_type.to_string(),
                    c.complexity().to_string(),
                    c.function_points(),
                    c.status()
                );
            }
            println!();
            let total_fp: u32 = components.iter().map(|c| c.function_points()).sum();
            println!(
                "{} component(s), {} unadjusted FP.",
                style(components.len()).cyan(),
                style(total_fp).cyan()
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let estimate = resolve_estimate(&project, &args.estimate)?;

    let component_type: ComponentType = args.r#type.into();
    let mut component = Component::new(
        estimate.id.clone(),
        component_type,
        args.title.clone(),
        config.author(),
    );

    if let Some(ret) = args.ret {
        component.record_element_types = Some(checked_count("ret", ret)?);
    }
    if let Some(ftr) = args.ftr {
        component.file_types_referenced = Some(checked_count("ftr", ftr)?);
    }
    if let Some(det) = args.det {
        component.data_element_types = Some(checked_count("det", det)?);
    }
    let sides = [
        args.input_ftr,
        args.input_det,
        args.output_ftr,
        args.output_det,
    ];
    if sides.iter().any(Option::is_some) {
        if component_type != ComponentType::Eq {
            return Err(miette::miette!(
                "two-sided counts are only valid on EQ components"
            ));
        }
        let [Some(input_ftr), Some(input_det), Some(output_ftr), Some(output_det)] = sides else {
            return Err(miette::miette!(
                "a two-sided query needs all of --input-ftr, --input-det, --output-ftr, --output-det"
            ));
        };
        component.special_query = Some(SpecialQueryCounts {
            input_ftr: checked_count("input_ftr", input_ftr)?,
            input_det: checked_count("input_det", input_det)?,
            output_ftr: checked_count("output_ftr", output_ftr)?,
            output_det: checked_count("output_det", output_det)?,
        });
    }

    let path = project.entity_path(EntityPrefix::Cmp, &component.id);
    let yaml = serde_yml::to_string(&component).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(component.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created component {} ({}): {} {} = {} FP",
        style("✓").green(),
        style(&component.id).cyan(),
        style(format!("CMP@{}", short_id)).cyan(),
        component.component_type,
        component.complexity(),
        component.function_points()
    );

    if args.edit {
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, component) = load_component(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&component).into_diagnostic()?
            );
        }
        _ => {
            print!("{}", serde_yml::to_string(&component).into_diagnostic()?);
            // Derived values are not stored; show them alongside
            println!("# derived");
            println!("# complexity: {}", component.complexity());
            println!("# function_points: {}", component.function_points());
            if let Some(side) = component.winning_side() {
                println!("# winning_side: {}", side);
            }
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _) = load_component(&project, &args.id)?;

    let config = Config::load();
    config.run_editor(&path).into_diagnostic()?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    match serde_yml::from_str::<Component>(&content) {
        Ok(component) => {
            println!(
                "{} Updated component {}: {} {} = {} FP",
                style("✓").green(),
                style(&component.id).cyan(),
                component.component_type,
                component.complexity(),
                component.function_points()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!(
            "edited file no longer parses as a component: {}",
            e
        )),
    }
}

fn run_remove(args: RemoveArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    for reference in &args.ids {
        let (path, component) = load_component(&project, reference)?;
        fs::remove_file(&path).into_diagnostic()?;
        println!(
            "{} Removed component {} ({})",
            style("✓").green(),
            style(&component.id).cyan(),
            component.title
        );
    }

    Ok(())
}

fn run_import(args: ImportArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let estimate = resolve_estimate(&project, &args.estimate)?;

    let mut reader = csv::Reader::from_path(&args.file)
        .map_err(|e| miette::miette!("cannot read {}: {}", args.file.display(), e))?;

    let headers = reader
        .headers()
        .map_err(|e| miette::miette!("invalid CSV header: {}", e))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let title_col = column("title")
        .ok_or_else(|| miette::miette!("CSV is missing the required 'title' column"))?;
    let type_col = column("type")
        .ok_or_else(|| miette::miette!("CSV is missing the required 'type' column"))?;
    let ret_col = column("ret");
    let ftr_col = column("ftr");
    let det_col = column("det");
    let input_ftr_col = column("input_ftr");
    let input_det_col = column("input_det");
    let output_ftr_col = column("output_ftr");
    let output_det_col = column("output_det");

    let author = config.author();
    let mut created = 0usize;
    let mut short_ids = ShortIdIndex::load(&project);

    for (row_index, record) in reader.records().enumerate() {
        let row = row_index + 2; // header is row 1
        let record = record.map_err(|e| miette::miette!("row {}: {}", row, e))?;

        let title = record
            .get(title_col)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| miette::miette!("row {}: empty title", row))?;
        let component_type: ComponentType = record
            .get(type_col)
            .map(str::trim)
            .unwrap_or("")
            .parse()
            .map_err(|e| miette::miette!("row {}: {}", row, e))?;

        let count_at = |col: Option<usize>, field: &str| -> Result<Option<u32>> {
            let Some(col) = col else { return Ok(None) };
            let Some(raw) = record.get(col).map(str::trim).filter(|v| !v.is_empty()) else {
                return Ok(None);
            };
            let value: i64 = raw
                .parse()
                .map_err(|_| miette::miette!("row {}: {} ('{}') is not an integer", row, field, raw))?;
            let checked = checked_count(field, value)
                .map_err(|e| miette::miette!("row {}: {}", row, e))?;
            Ok(Some(checked))
        };

        let mut component = Component::new(
            estimate.id.clone(),
            component_type,
            title.to_string(),
            author.clone(),
        );
        component.record_element_types = count_at(ret_col, "ret")?;
        component.file_types_referenced = count_at(ftr_col, "ftr")?;
        component.data_element_types = count_at(det_col, "det")?;

        let input_ftr = count_at(input_ftr_col, "input_ftr")?;
        let input_det = count_at(input_det_col, "input_det")?;
        let output_ftr = count_at(output_ftr_col, "output_ftr")?;
        let output_det = count_at(output_det_col, "output_det")?;
        if let (Some(input_ftr), Some(input_det), Some(output_ftr), Some(output_det)) =
            (input_ftr, input_det, output_ftr, output_det)
        {
            if component_type != ComponentType::Eq {
                return Err(miette::miette!(
                    "row {}: two-sided counts are only valid on EQ components",
                    row
                ));
            }
            component.special_query = Some(SpecialQueryCounts {
                input_ftr,
                input_det,
                output_ftr,
                output_det,
            });
        }

        let path = project.entity_path(EntityPrefix::Cmp, &component.id);
        let yaml = serde_yml::to_string(&component).into_diagnostic()?;
        fs::write(&path, yaml).into_diagnostic()?;
        short_ids.add(component.id.to_string());
        created += 1;
    }

    let _ = short_ids.save(&project);

    println!(
        "{} Imported {} component(s) into {}",
        style("✓").green(),
        style(created).cyan(),
        style(&estimate.id).cyan()
    );

    Ok(())
}
