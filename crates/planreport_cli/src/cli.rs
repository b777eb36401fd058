//! CLI argument definitions for the planning report builder.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "planreport",
    version,
    about = "Build the planning routine workbook from one planning export",
    long_about = "Read one planning export (xlsx, xlsm, xlsb, xls, ods or Arrow IPC) and write\n\
                  a workbook with Overview, FullReport, RM, PO and Stock sheets."
)]
pub struct Cli {
    /// Planning export to process.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output workbook (default: "<YYYYMMDD> - Rotina de planejamento.xlsx").
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}
