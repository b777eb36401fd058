//! Typed errors of the report pipeline.

use thiserror::Error;

/// Fatal fault raised by a pipeline stage.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook read error: {0}")]
    WorkbookRead(#[from] calamine::Error),

    #[error("IPC read error: {0}")]
    IpcRead(#[from] polars::error::PolarsError),

    #[error("Spreadsheet sink error: {0}")]
    Sink(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

/// The single user-facing failure of one processing run.
#[derive(Error, Debug)]
#[error("Processing error: {source}")]
pub struct ProcessingError {
    #[from]
    source: ReportError,
}

impl ProcessingError {
    /// Underlying stage error.
    pub fn cause(&self) -> &ReportError {
        &self.source
    }
}
