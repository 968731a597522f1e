//! `metria report` command - Generate measurement reports

pub(crate) mod fpa;
mod metrics;

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::cli::GlobalOpts;

pub use fpa::FpaArgs;
pub use metrics::MetricsArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// FPA calculation report for an estimate
    Fpa(FpaArgs),

    /// Metric values per cycle for a measurement plan
    Metrics(MetricsArgs),
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Fpa(args) => fpa::run(args, global),
        ReportCommands::Metrics(args) => metrics::run(args, global),
    }
}

// Shared helper functions

pub(crate) fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
