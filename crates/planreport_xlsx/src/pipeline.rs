//! End-to-end orchestration: read, normalize, derive, style and write.
//!
//! Every stage below the public `process_*` entry points reports
//! [`ReportError`]; the entry points convert it into the single
//! [`ProcessingError`] shown to the user.

use std::path::Path;

use tracing::{info, warn};

use crate::conf::{
    C_OUTPUT_DATE_FORMAT, C_OUTPUT_NAME_SUFFIX, C_SHEET_OVERVIEW, TUP_VIEW_DEFINITIONS,
    style_registry,
};
use crate::error::{ProcessingError, ReportError};
use crate::normalize::normalize_dataset;
use crate::overview::build_overview;
use crate::partition::{count_overlapping_rows, partition_views};
use crate::reader::{EnumInputFormat, read_dataset_from_bytes, read_dataset_from_path};
use crate::spec::{
    Clock, EnumViewKind, SpecDataset, SpecProcessReport, SpecReportBook, SpecReportOptions,
    SpecSheetStyle, SpecStyleRegistry,
};
use crate::style::{resolve_data_sheet_style, resolve_overview_style};
use crate::writer::{SpreadsheetSink, XlsxSink};

/// Workbook bytes plus the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecProcessOutput {
    pub v_bytes: Vec<u8>,
    pub report: SpecProcessReport,
}

////////////////////////////////////////////////////////////////////////////////
// #region Core

/// Normalize `raw` and derive the overview plus the four data views.
pub fn build_report(
    raw: SpecDataset,
    clock: &dyn Clock,
    options: &SpecReportOptions,
) -> SpecReportBook {
    let dataset = normalize_dataset(raw);
    info!(rows = dataset.height(), columns = dataset.width(), "dataset normalized");

    let overview = build_overview(&dataset, clock, options);
    let views = partition_views(&dataset);
    SpecReportBook { overview, views }
}

/// Write `book` through `sink`: create all sheets, style them, then add
/// filters and frozen headers to the data sheets.
pub fn render_report(
    book: &SpecReportBook,
    sink: &mut dyn SpreadsheetSink,
    registry: &SpecStyleRegistry,
    options: &SpecReportOptions,
) -> Result<(), ReportError> {
    let l_grid_overview = book.overview.to_grid();
    sink.create_sheet(C_SHEET_OVERVIEW, &l_grid_overview, None)
        .map_err(ReportError::Sink)?;
    for view in &book.views {
        sink.create_sheet(view.sheet_name(), &view.rows, Some(view.columns.as_slice()))
            .map_err(ReportError::Sink)?;
    }

    let style_overview = resolve_overview_style(&l_grid_overview, registry, options);
    apply_sheet_style(sink, C_SHEET_OVERVIEW, &style_overview)?;
    for view in &book.views {
        let style = resolve_data_sheet_style(&view.columns, &view.rows, registry, options);
        apply_sheet_style(sink, view.sheet_name(), &style)?;
    }

    for view in &book.views {
        sink.enable_auto_filter(view.sheet_name())
            .map_err(ReportError::Sink)?;
        sink.freeze_header_row(view.sheet_name())
            .map_err(ReportError::Sink)?;
    }

    Ok(())
}

fn apply_sheet_style(
    sink: &mut dyn SpreadsheetSink,
    sheet: &str,
    style: &SpecSheetStyle,
) -> Result<(), ReportError> {
    for (row_idx, l_formats) in style.cells.iter().enumerate() {
        for (col_idx, format) in l_formats.iter().enumerate() {
            sink.set_cell_style(sheet, row_idx, col_idx, format)
                .map_err(ReportError::Sink)?;
        }
    }
    for (col_idx, width) in style.widths.iter().enumerate() {
        sink.set_column_width(sheet, col_idx, *width)
            .map_err(ReportError::Sink)?;
    }
    Ok(())
}

/// Build and serialize the complete workbook for one raw dataset.
pub fn process_dataset(
    raw: SpecDataset,
    clock: &dyn Clock,
    options: &SpecReportOptions,
) -> Result<SpecProcessOutput, ReportError> {
    let mut report = SpecProcessReport::default();
    for def in &TUP_VIEW_DEFINITIONS {
        if !raw.has_column(def.predicate_column) {
            report.warn(format!(
                "{}: column {} absent; sheet left empty",
                def.kind.sheet_name(),
                def.predicate_column
            ));
        }
    }

    // Normalization leaves predicate columns untouched.
    let n_overlap = count_overlapping_rows(&raw);
    if n_overlap > 0 {
        warn!(rows = n_overlap, "rows selected by more than one view");
        report.warn(format!("{n_overlap} rows appear in more than one view"));
    }

    let book = build_report(raw, clock, options);

    let derive_height = |kind| book.view(kind).map(|view| view.height()).unwrap_or(0);
    report.cnt_full = derive_height(EnumViewKind::FullReport);
    report.cnt_rm = derive_height(EnumViewKind::Rm);
    report.cnt_po = derive_height(EnumViewKind::Po);
    report.cnt_stock = derive_height(EnumViewKind::Stock);

    let mut sink = XlsxSink::new();
    render_report(&book, &mut sink, style_registry(), options)?;
    let v_bytes = sink.finish().map_err(ReportError::Sink)?;

    info!(bytes = v_bytes.len(), "{}", report.format("[REPORT]"));
    Ok(SpecProcessOutput { v_bytes, report })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EntryPoints

/// Process an in-memory input file.
pub fn process_bytes(
    v_bytes: Vec<u8>,
    format: EnumInputFormat,
    clock: &dyn Clock,
    options: &SpecReportOptions,
) -> Result<SpecProcessOutput, ProcessingError> {
    let raw = read_dataset_from_bytes(v_bytes, format)?;
    Ok(process_dataset(raw, clock, options)?)
}

/// Process `path_in` and write the workbook to `path_out`.
///
/// The output file is only touched once the whole workbook is serialized.
pub fn process_file(
    path_in: &Path,
    path_out: &Path,
    clock: &dyn Clock,
    options: &SpecReportOptions,
) -> Result<SpecProcessReport, ProcessingError> {
    let raw = read_dataset_from_path(path_in)?;
    let output = process_dataset(raw, clock, options)?;
    std::fs::write(path_out, &output.v_bytes).map_err(ReportError::from)?;
    info!(path = %path_out.display(), "workbook written");
    Ok(output.report)
}

/// `<YYYYMMDD> - Rotina de planejamento.xlsx`, dated by `clock`.
pub fn derive_default_output_name(clock: &dyn Clock) -> String {
    format!(
        "{}{C_OUTPUT_NAME_SUFFIX}",
        clock.now().format(C_OUTPUT_DATE_FORMAT)
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, open_workbook_auto_from_rs};
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_xlsxwriter::Workbook;

    use super::*;
    use crate::conf::{
        C_COLOR_DEMAND_R_FILL, C_COLOR_HEADER_FILL, C_COLOR_IN_STOCK_FILL, C_LABEL_TITLE,
    };
    use crate::spec::{EnumCellValue, FixedClock, SpecCellFormat};

    fn derive_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    fn derive_raw() -> SpecDataset {
        SpecDataset::new(
            ["Counter", "Status", "STATUS_STYPE", "DEMAND", "PROCUREMENT_KEY", "OPENING_DATE"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            vec![
                vec![
                    3.0.into(),
                    "Open".into(),
                    "POCreated".into(),
                    "R100".into(),
                    "E".into(),
                    "2026-04-01".into(),
                ],
                vec![
                    1.0.into(),
                    "In Stock".into(),
                    "Other".into(),
                    "D1".into(),
                    "F".into(),
                    EnumCellValue::None,
                ],
                vec![
                    2.0.into(),
                    "Open".into(),
                    "PurRequist".into(),
                    "D2".into(),
                    "E".into(),
                    "not a date".into(),
                ],
            ],
        )
        .unwrap()
    }

    #[derive(Debug, Clone, PartialEq)]
    enum EnumSinkCall {
        Create(String, usize, bool),
        Style(String, usize, usize, SpecCellFormat),
        Width(String, usize, usize),
        AutoFilter(String),
        Freeze(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        l_calls: Vec<EnumSinkCall>,
        c_fail_on: Option<&'static str>,
    }

    impl SpreadsheetSink for RecordingSink {
        fn create_sheet(
            &mut self,
            name: &str,
            rows: &[Vec<EnumCellValue>],
            header: Option<&[String]>,
        ) -> Result<(), String> {
            if self.c_fail_on == Some(name) {
                return Err(format!("refused {name}"));
            }
            self.l_calls
                .push(EnumSinkCall::Create(name.to_string(), rows.len(), header.is_some()));
            Ok(())
        }

        fn set_cell_style(
            &mut self,
            sheet: &str,
            row: usize,
            col: usize,
            format: &SpecCellFormat,
        ) -> Result<(), String> {
            self.l_calls.push(EnumSinkCall::Style(
                sheet.to_string(),
                row,
                col,
                format.clone(),
            ));
            Ok(())
        }

        fn set_column_width(
            &mut self,
            sheet: &str,
            col: usize,
            width: usize,
        ) -> Result<(), String> {
            self.l_calls
                .push(EnumSinkCall::Width(sheet.to_string(), col, width));
            Ok(())
        }

        fn enable_auto_filter(&mut self, sheet: &str) -> Result<(), String> {
            self.l_calls.push(EnumSinkCall::AutoFilter(sheet.to_string()));
            Ok(())
        }

        fn freeze_header_row(&mut self, sheet: &str) -> Result<(), String> {
            self.l_calls.push(EnumSinkCall::Freeze(sheet.to_string()));
            Ok(())
        }
    }

    fn derive_sheet_of(call: &EnumSinkCall) -> &str {
        match call {
            EnumSinkCall::Create(name, ..)
            | EnumSinkCall::Style(name, ..)
            | EnumSinkCall::Width(name, ..)
            | EnumSinkCall::AutoFilter(name)
            | EnumSinkCall::Freeze(name) => name,
        }
    }

    #[test]
    fn test_render_calls_sink_in_fixed_order() {
        let options = SpecReportOptions::default();
        let book = build_report(derive_raw(), &FixedClock(derive_now()), &options);
        let mut sink = RecordingSink::default();
        render_report(&book, &mut sink, style_registry(), &options).unwrap();

        let l_creates: Vec<EnumSinkCall> = sink.l_calls[..5].to_vec();
        assert_eq!(
            l_creates,
            vec![
                EnumSinkCall::Create("Overview".to_string(), book.overview.lines.len(), false),
                EnumSinkCall::Create("FullReport".to_string(), 3, true),
                EnumSinkCall::Create("RM".to_string(), 1, true),
                EnumSinkCall::Create("PO".to_string(), 1, true),
                EnumSinkCall::Create("Stock".to_string(), 1, true),
            ]
        );

        let l_tail: Vec<EnumSinkCall> = sink.l_calls[sink.l_calls.len() - 8..].to_vec();
        let mut l_expected_tail = Vec::new();
        for c_sheet in ["FullReport", "RM", "PO", "Stock"] {
            l_expected_tail.push(EnumSinkCall::AutoFilter(c_sheet.to_string()));
            l_expected_tail.push(EnumSinkCall::Freeze(c_sheet.to_string()));
        }
        assert_eq!(l_tail, l_expected_tail);

        // Styling runs sheet by sheet, in workbook order, between the two phases.
        let l_styled_sheets: Vec<&str> = sink.l_calls[5..sink.l_calls.len() - 8]
            .iter()
            .map(derive_sheet_of)
            .collect();
        let mut l_sheet_runs = l_styled_sheets.clone();
        l_sheet_runs.dedup();
        assert_eq!(l_sheet_runs, vec!["Overview", "FullReport", "RM", "PO", "Stock"]);
        assert!(!sink.l_calls.iter().any(|call| matches!(
            call,
            EnumSinkCall::AutoFilter(name) | EnumSinkCall::Freeze(name) if name == "Overview"
        )));

        // FullReport is sorted by Counter: row 1 is the in-stock item, row 3 is R100.
        let derive_fill = |row: usize| {
            sink.l_calls.iter().find_map(|call| match call {
                EnumSinkCall::Style(name, r, 0, fmt) if name == "FullReport" && *r == row => {
                    Some(fmt.bg_color.clone())
                }
                _ => None,
            })
        };
        assert_eq!(derive_fill(0), Some(Some(C_COLOR_HEADER_FILL.to_string())));
        assert_eq!(derive_fill(1), Some(Some(C_COLOR_IN_STOCK_FILL.to_string())));
        assert_eq!(derive_fill(3), Some(Some(C_COLOR_DEMAND_R_FILL.to_string())));
    }

    #[test]
    fn test_sink_failure_surfaces_with_marker() {
        let options = SpecReportOptions::default();
        let book = build_report(derive_raw(), &FixedClock(derive_now()), &options);
        let mut sink = RecordingSink {
            c_fail_on: Some("PO"),
            ..Default::default()
        };
        let err = render_report(&book, &mut sink, style_registry(), &options).unwrap_err();
        assert!(matches!(err, ReportError::Sink(_)));
        assert_eq!(
            ProcessingError::from(err).to_string(),
            "Processing error: Spreadsheet sink error: refused PO"
        );
    }

    #[test]
    fn test_process_dataset_counts_and_is_deterministic() {
        let clock = FixedClock(derive_now());
        let options = SpecReportOptions::default();
        let first = process_dataset(derive_raw(), &clock, &options).unwrap();
        let second = process_dataset(derive_raw(), &clock, &options).unwrap();

        assert_eq!(
            first.report.format("[REPORT]"),
            "[REPORT] full=3 rm=1 po=1 stock=1 warnings=0"
        );
        assert_eq!(first.report, second.report);
        assert_eq!(
            build_report(derive_raw(), &clock, &options),
            build_report(derive_raw(), &clock, &options)
        );
        assert!(!first.v_bytes.is_empty());
    }

    #[test]
    fn test_process_dataset_warns_on_missing_predicate_column() {
        let raw = SpecDataset::new(
            vec!["Status".to_string()],
            vec![vec!["In Stock".into()]],
        )
        .unwrap();
        let output =
            process_dataset(raw, &FixedClock(derive_now()), &SpecReportOptions::default())
                .unwrap();
        assert_eq!(output.report.cnt_stock, 1);
        assert_eq!(output.report.warnings.len(), 2);
        assert!(output.report.warnings[0].starts_with("RM: column STATUS_STYPE absent"));
    }

    #[test]
    fn test_process_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path_in = dir.path().join("plan.xlsx");
        let path_out = dir.path().join("out.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, c_name) in ["Counter", "Status", "STATUS_STYPE", "MATERIAL_NO"]
            .iter()
            .enumerate()
        {
            worksheet.write_string(0, col as u16, *c_name).unwrap();
        }
        worksheet.write_number(1, 0, 2.0).unwrap();
        worksheet.write_string(1, 1, "Open").unwrap();
        worksheet.write_string(1, 2, "POConfirm").unwrap();
        worksheet.write_string(1, 3, "M2").unwrap();
        worksheet.write_number(2, 0, 1.0).unwrap();
        worksheet.write_string(2, 1, "In Stock").unwrap();
        worksheet.write_string(2, 2, "Other").unwrap();
        worksheet.write_string(2, 3, "M1").unwrap();
        workbook.save(&path_in).unwrap();

        let report = process_file(
            &path_in,
            &path_out,
            &FixedClock(derive_now()),
            &SpecReportOptions::default(),
        )
        .unwrap();
        assert_eq!(report.cnt_full, 2);
        assert_eq!(report.cnt_po, 1);

        let v_bytes = std::fs::read(&path_out).unwrap();
        let mut workbook_out = open_workbook_auto_from_rs(Cursor::new(v_bytes)).unwrap();
        assert_eq!(
            workbook_out.sheet_names(),
            vec!["Overview", "FullReport", "RM", "PO", "Stock"]
        );

        let range = workbook_out.worksheet_range("Overview").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String(C_LABEL_TITLE.to_string()))
        );

        let range = workbook_out.worksheet_range("FullReport").unwrap();
        assert_eq!(range.get_value((1, 3)), Some(&Data::String("M1".to_string())));
        assert_eq!(range.get_value((2, 3)), Some(&Data::String("M2".to_string())));

        let range = workbook_out.worksheet_range("PO").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Status".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("Open".to_string())));
    }

    #[test]
    fn test_unreadable_input_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let path_in = dir.path().join("broken.xlsx");
        let path_out = dir.path().join("out.xlsx");
        std::fs::write(&path_in, b"garbage").unwrap();

        let err = process_file(
            &path_in,
            &path_out,
            &FixedClock(derive_now()),
            &SpecReportOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Processing error: "));
        assert!(!path_out.exists());
    }

    #[test]
    fn test_process_bytes_rejects_bad_ipc() {
        let err = process_bytes(
            b"nope".to_vec(),
            EnumInputFormat::ArrowIpc,
            &FixedClock(derive_now()),
            &SpecReportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err.cause(), ReportError::IpcRead(_)));
    }

    #[test]
    fn test_default_output_name_uses_clock_date() {
        assert_eq!(
            derive_default_output_name(&FixedClock(derive_now())),
            "20260310 - Rotina de planejamento.xlsx"
        );
    }
}
