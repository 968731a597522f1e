//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    cmp::CmpCommands, completions::CompletionsArgs, cycle::CycleCommands, est::EstCommands,
    formula::FormulaCommands, init::InitArgs, plan::PlanCommands, report::ReportCommands,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "metria")]
#[command(author, version, about = "Metria Software Measurement Toolkit")]
#[command(
    long_about = "A Unix-style toolkit for function point analysis and GQM measurement plans, managed as plain text files under git version control."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .metria/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new Metria project
    Init(InitArgs),

    /// Estimate management (FPA sizing exercises)
    #[command(subcommand)]
    Est(EstCommands),

    /// Component management (ALI/AIE/EI/EO/EQ functional units)
    #[command(subcommand)]
    Cmp(CmpCommands),

    /// Measurement plan management (GQM objectives, questions, metrics)
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Cycle management (reporting windows and measurement values)
    #[command(subcommand)]
    Cycle(CycleCommands),

    /// Formula utilities (authoring-time validation)
    #[command(subcommand)]
    Formula(FormulaCommands),

    /// Validate project files
    Validate(ValidateArgs),

    /// Generate reports (FPA breakdown, metric values per cycle)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
