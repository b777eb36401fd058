//! Planning report builder CLI.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use planreport_xlsx::{
    SpecProcessReport, SystemClock, derive_default_output_name, derive_default_report_options,
    process_file,
};
use tracing::warn;

mod cli;
mod logging;

use crate::cli::Cli;
use crate::logging::{LogConfig, init_logging};

fn main() {
    let cli = Cli::parse();
    init_logging(
        &LogConfig::from_verbosity(cli.verbose).with_ansi(io::stderr().is_terminal()),
    );

    let exit_code = match run(&cli) {
        Ok(report) => {
            print_summary(&report);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<SpecProcessReport> {
    let clock = SystemClock;
    let path_out = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(derive_default_output_name(&clock)));

    let report = process_file(
        &cli.input,
        &path_out,
        &clock,
        &derive_default_report_options(),
    )
    .with_context(|| format!("failed to build report from {}", cli.input.display()))?;

    for c_warning in &report.warnings {
        warn!("{c_warning}");
    }
    println!("Report written to {}", path_out.display());
    Ok(report)
}

fn print_summary(report: &SpecProcessReport) {
    println!("{report}");
}
