//! `metria formula` command - Authoring-time formula utilities

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::formula;

#[derive(Subcommand, Debug)]
pub enum FormulaCommands {
    /// Check a formula's syntax without evaluating it
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// The formula text, e.g. "HH / PF"
    pub formula: String,
}

/// Run a formula subcommand
pub fn run(cmd: FormulaCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FormulaCommands::Check(args) => run_check(args, global),
    }
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let validation = formula::validate(&args.formula);

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&validation).into_diagnostic()?
        );
        return Ok(());
    }

    if validation.is_valid {
        println!(
            "{} {} is a valid formula",
            style("✓").green(),
            style(&args.formula).cyan()
        );
        // Show the acronyms the formula will need at evaluation time
        if let Ok(expr) = formula::parse(&args.formula) {
            let variables = expr.variables();
            if !variables.is_empty() {
                println!("  references: {}", variables.join(", "));
            }
        }
        Ok(())
    } else {
        // Re-parse for the full miette diagnostic with the source span
        match formula::parse(&args.formula) {
            Err(e) => Err(e.into()),
            Ok(_) => unreachable!("validation and parse disagree"),
        }
    }
}
