//! `planreport_xlsx` v1:
//! Planning report partitioning and conditional styling kernel.
//!
//! One planning dataset in, one five-sheet workbook out:
//! - `conf`      : constants, column lists, labels and default presets
//! - `spec`      : specs/models/options
//! - `util`      : pure helper functions
//! - `reader`    : spreadsheet / Arrow IPC input adapter
//! - `normalize` : date canonicalization and ordering-key sort
//! - `partition` : FullReport / RM / PO / Stock views
//! - `overview`  : overview sheet builder
//! - `style`     : header, row-rule and overview styles plus column widths
//! - `writer`    : spreadsheet sink trait and buffered XLSX sink
//! - `pipeline`  : orchestration and the outer error boundary
//! - `error`     : typed errors
pub mod conf;
pub mod error;
pub mod normalize;
pub mod overview;
pub mod partition;
pub mod pipeline;
pub mod reader;
pub mod spec;
pub mod style;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_FULL_REPORT, C_SHEET_OVERVIEW, C_SHEET_PO, C_SHEET_RM, C_SHEET_STOCK,
    derive_default_report_options, style_registry,
};
pub use error::{ProcessingError, ReportError};
pub use overview::{EnumAssemblyOutcome, SpecCrossTab, build_overview};
pub use partition::partition_views;
pub use pipeline::{
    SpecProcessOutput, build_report, derive_default_output_name, process_bytes, process_dataset,
    process_file, render_report,
};
pub use reader::{EnumInputFormat, read_dataset_from_bytes, read_dataset_from_path};
pub use spec::{
    Clock, EnumCellValue, EnumOverviewLine, EnumViewKind, FixedClock, SpecCellFormat, SpecDataset,
    SpecOverviewDocument, SpecProcessReport, SpecReportBook, SpecReportOptions, SpecSheetStyle,
    SpecStyleRegistry, SpecView, SystemClock,
};
pub use writer::{SpreadsheetSink, XlsxSink};
