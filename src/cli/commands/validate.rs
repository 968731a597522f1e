//! `metria validate` command - Validate project files
//!
//! Parses every entity file, runs the per-entity structural checks, and
//! verifies cross-entity links (components to estimates, cycles to
//! plans). Parse failures and dangling links are errors; structural
//! issues are warnings unless --strict.

use console::style;
use miette::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;
use crate::entities::component::Component;
use crate::entities::cycle::Cycle;
use crate::entities::estimate::Estimate;
use crate::entities::plan::MeasurementPlan;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Show summary only, don't show individual findings
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    errors: usize,
    warnings: usize,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let mut stats = ValidationStats::default();

    let mut estimate_ids: HashSet<String> = HashSet::new();
    let mut plan_ids: HashSet<String> = HashSet::new();

    // First pass: estimates and plans, so link targets are known
    for path in project.iter_entity_files(EntityPrefix::Est) {
        check_entity::<Estimate>(&path, &args, &mut stats, |estimate| {
            estimate_ids.insert(estimate.id.to_string());
            estimate.validate()
        });
    }
    for path in project.iter_entity_files(EntityPrefix::Plan) {
        check_entity::<MeasurementPlan>(&path, &args, &mut stats, |plan| {
            plan_ids.insert(plan.id.to_string());
            plan.validate()
        });
    }

    // Second pass: components and cycles, with link checks
    for path in project.iter_entity_files(EntityPrefix::Cmp) {
        check_entity::<Component>(&path, &args, &mut stats, |component| {
            let mut issues = component.validate();
            if !estimate_ids.contains(&component.estimate.to_string()) {
                issues.push(format!(
                    "{}: references missing estimate {}",
                    component.id, component.estimate
                ));
            }
            issues
        });
    }
    for path in project.iter_entity_files(EntityPrefix::Cyc) {
        check_entity::<Cycle>(&path, &args, &mut stats, |cycle| {
            let mut issues = cycle.validate();
            if !plan_ids.contains(&cycle.plan.to_string()) {
                issues.push(format!(
                    "{}: references missing plan {}",
                    cycle.id, cycle.plan
                ));
            }
            issues
        });
    }

    println!();
    println!(
        "{} file(s) checked: {} passed, {} error(s), {} warning(s)",
        stats.files_checked,
        style(stats.files_passed).green(),
        if stats.errors > 0 {
            style(stats.errors).red()
        } else {
            style(stats.errors).green()
        },
        if stats.warnings > 0 {
            style(stats.warnings).yellow()
        } else {
            style(stats.warnings).green()
        }
    );

    let failing = stats.errors + if args.strict { stats.warnings } else { 0 };
    if failing > 0 {
        Err(miette::miette!("validation failed with {} issue(s)", failing))
    } else {
        Ok(())
    }
}

fn check_entity<T: serde::de::DeserializeOwned + 'static>(
    path: &Path,
    args: &ValidateArgs,
    stats: &mut ValidationStats,
    checks: impl FnOnce(&T) -> Vec<String>,
) {
    stats.files_checked += 1;

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            stats.errors += 1;
            if !args.summary {
                println!("{} {} - {}", style("✗").red(), path.display(), e);
            }
            return;
        }
    };

    let entity: T = match serde_yml::from_str(&content) {
        Ok(entity) => entity,
        Err(e) => {
            stats.errors += 1;
            if !args.summary {
                println!("{} {} - {}", style("✗").red(), path.display(), e);
            }
            return;
        }
    };

    let issues = checks(&entity);
    if issues.is_empty() {
        stats.files_passed += 1;
        if !args.summary {
            println!("{} {}", style("✓").green(), path.display());
        }
    } else {
        stats.warnings += issues.len();
        if !args.summary {
            println!("{} {}", style("!").yellow(), path.display());
            for issue in issues {
                println!("    {}", issue);
            }
        }
    }
}
