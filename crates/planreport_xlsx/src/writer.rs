//! Sink adapter: the spreadsheet capability the pipeline writes through, and
//! its buffered `rust_xlsxwriter` implementation.

use std::collections::{BTreeMap, HashMap};

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::conf::{C_NUM_FORMAT_DATETIME, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{EnumCellValue, SpecCellFormat};
use crate::util::convert_datetime_to_excel_serial;

/// Minimal workbook capability consumed by the report pipeline.
///
/// Row indices count from the first written row, so on sheets created with
/// a header the header is row 0 and data rows start at 1.
pub trait SpreadsheetSink {
    /// Create sheet `name` holding `header` (if any) followed by `rows`.
    fn create_sheet(
        &mut self,
        name: &str,
        rows: &[Vec<EnumCellValue>],
        header: Option<&[String]>,
    ) -> Result<(), String>;

    fn set_cell_style(
        &mut self,
        sheet: &str,
        row: usize,
        col: usize,
        format: &SpecCellFormat,
    ) -> Result<(), String>;

    fn set_column_width(&mut self, sheet: &str, col: usize, width: usize) -> Result<(), String>;

    /// Filter buttons over the header row and the full data range.
    fn enable_auto_filter(&mut self, sheet: &str) -> Result<(), String>;

    fn freeze_header_row(&mut self, sheet: &str) -> Result<(), String>;
}

#[derive(Debug, Default)]
struct SheetBuffer {
    name: String,
    grid: Vec<Vec<EnumCellValue>>,
    n_width: usize,
    dict_formats: BTreeMap<(usize, usize), SpecCellFormat>,
    dict_widths: BTreeMap<usize, usize>,
    if_auto_filter: bool,
    if_freeze_header: bool,
}

/// Buffered XLSX sink.
///
/// Sheets are kept in memory; nothing is serialized until [`Self::finish`],
/// so a failure before that point leaves no partial workbook behind.
#[derive(Debug, Default)]
pub struct XlsxSink {
    l_sheets: Vec<SheetBuffer>,
}

impl XlsxSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet names in creation order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.l_sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    /// Serialize all sheets into an XLSX byte buffer.
    pub fn finish(self) -> Result<Vec<u8>, String> {
        let mut workbook = Workbook::new();
        let mut dict_format_cache: HashMap<SpecCellFormat, Format> = HashMap::new();

        for sheet in &self.l_sheets {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(sheet.name.as_str())
                .map_err(derive_xlsx_error_text)?;
            write_sheet_buffer(worksheet, sheet, &mut dict_format_cache)?;
            debug!(
                sheet = sheet.name.as_str(),
                rows = sheet.grid.len(),
                formats = sheet.dict_formats.len(),
                "sheet serialized"
            );
        }

        workbook.save_to_buffer().map_err(derive_xlsx_error_text)
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut SheetBuffer, String> {
        self.l_sheets
            .iter_mut()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| format!("Unknown sheet: {name:?}"))
    }
}

impl SpreadsheetSink for XlsxSink {
    fn create_sheet(
        &mut self,
        name: &str,
        rows: &[Vec<EnumCellValue>],
        header: Option<&[String]>,
    ) -> Result<(), String> {
        if self.l_sheets.iter().any(|sheet| sheet.name == name) {
            return Err(format!("Sheet already exists: {name:?}"));
        }

        let mut grid = Vec::with_capacity(rows.len() + 1);
        if let Some(l_names) = header {
            grid.push(
                l_names
                    .iter()
                    .map(|c_name| EnumCellValue::text(c_name.as_str()))
                    .collect(),
            );
        }
        grid.extend(rows.iter().cloned());

        let n_width = grid.iter().map(Vec::len).max().unwrap_or(0);
        if grid.len() > N_NROWS_EXCEL_MAX {
            return Err(format!(
                "Sheet {name:?} has {} rows; the limit is {N_NROWS_EXCEL_MAX}.",
                grid.len()
            ));
        }
        if n_width > N_NCOLS_EXCEL_MAX {
            return Err(format!(
                "Sheet {name:?} has {n_width} columns; the limit is {N_NCOLS_EXCEL_MAX}."
            ));
        }

        self.l_sheets.push(SheetBuffer {
            name: name.to_string(),
            grid,
            n_width,
            ..Default::default()
        });
        Ok(())
    }

    fn set_cell_style(
        &mut self,
        sheet: &str,
        row: usize,
        col: usize,
        format: &SpecCellFormat,
    ) -> Result<(), String> {
        let buffer = self.sheet_mut(sheet)?;
        if row >= buffer.grid.len() || col >= buffer.n_width {
            return Err(format!(
                "Cell ({row}, {col}) is outside sheet {sheet:?} ({} x {}).",
                buffer.grid.len(),
                buffer.n_width
            ));
        }
        buffer.dict_formats.insert((row, col), format.clone());
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &str, col: usize, width: usize) -> Result<(), String> {
        let buffer = self.sheet_mut(sheet)?;
        if col >= N_NCOLS_EXCEL_MAX {
            return Err(format!("column index overflow: {col}"));
        }
        buffer.dict_widths.insert(col, width);
        Ok(())
    }

    fn enable_auto_filter(&mut self, sheet: &str) -> Result<(), String> {
        self.sheet_mut(sheet)?.if_auto_filter = true;
        Ok(())
    }

    fn freeze_header_row(&mut self, sheet: &str) -> Result<(), String> {
        self.sheet_mut(sheet)?.if_freeze_header = true;
        Ok(())
    }
}

fn write_sheet_buffer(
    worksheet: &mut Worksheet,
    sheet: &SheetBuffer,
    dict_format_cache: &mut HashMap<SpecCellFormat, Format>,
) -> Result<(), String> {
    let fmt_default = SpecCellFormat::default();
    let fmt_datetime = SpecCellFormat {
        num_format: Some(C_NUM_FORMAT_DATETIME.to_string()),
        ..Default::default()
    };

    for (row_idx, row_values) in sheet.grid.iter().enumerate() {
        for col_idx in 0..sheet.n_width {
            let value = row_values.get(col_idx).unwrap_or(&EnumCellValue::None);
            let spec_style = sheet.dict_formats.get(&(row_idx, col_idx));

            if value.is_missing() && spec_style.is_none() {
                continue;
            }

            let spec_cell = match value {
                EnumCellValue::DateTime(_) => {
                    spec_style.unwrap_or(&fmt_default).merge(&fmt_datetime)
                }
                _ => spec_style.cloned().unwrap_or_default(),
            };
            let format = dict_format_cache
                .entry(spec_cell)
                .or_insert_with_key(derive_rust_xlsx_format);
            write_cell_with_format(worksheet, row_idx, col_idx, value, format)?;
        }
    }

    for (col_idx, width) in &sheet.dict_widths {
        worksheet
            .set_column_width(cast_col_num(*col_idx)?, *width as f64)
            .map_err(derive_xlsx_error_text)?;
    }

    if sheet.if_auto_filter && sheet.n_width > 0 {
        let n_row_last = sheet.grid.len().saturating_sub(1);
        worksheet
            .autofilter(
                0,
                0,
                cast_row_num(n_row_last)?,
                cast_col_num(sheet.n_width - 1)?,
            )
            .map_err(derive_xlsx_error_text)?;
    }
    if sheet.if_freeze_header {
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(derive_xlsx_error_text)?;
    }

    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let row_num = cast_row_num(row_idx)?;
    let col_num = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(row_num, col_num, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(row_num, col_num, val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(row_num, col_num, *val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::DateTime(dt) => {
            let serial = convert_datetime_to_excel_serial(dt)
                .ok_or_else(|| format!("date-time out of range: {dt}"))?;
            worksheet
                .write_number_with_format(row_num, col_num, serial, format)
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.is_bold() {
        format = format.set_bold();
    }
    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    format
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, open_workbook_auto_from_rs};
    use chrono::NaiveDate;

    use super::*;

    fn derive_header(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_finish_writes_sheets_in_creation_order_with_values() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();

        let mut sink = XlsxSink::new();
        sink.create_sheet(
            "Overview",
            &[vec!["Title".into()], vec![], vec!["Count".into(), 3.0.into()]],
            None,
        )
        .unwrap();
        sink.create_sheet(
            "FullReport",
            &[vec!["R1".into(), EnumCellValue::DateTime(dt), EnumCellValue::None]],
            Some(derive_header(&["DEMAND", "WHEN", "EMPTY"]).as_slice()),
        )
        .unwrap();
        sink.set_cell_style(
            "FullReport",
            1,
            2,
            &SpecCellFormat {
                bg_color: Some("#061569".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        sink.set_column_width("FullReport", 0, 8).unwrap();
        sink.enable_auto_filter("FullReport").unwrap();
        sink.freeze_header_row("FullReport").unwrap();
        assert_eq!(sink.sheet_names(), vec!["Overview", "FullReport"]);

        let v_bytes = sink.finish().unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(v_bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Overview", "FullReport"]);

        let range = workbook.worksheet_range("Overview").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Title".to_string())));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Float(3.0)));

        let range = workbook.worksheet_range("FullReport").unwrap();
        assert_eq!(range.get_value((0, 1)), Some(&Data::String("WHEN".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("R1".to_string())));
        match range.get_value((1, 1)) {
            Some(Data::DateTime(val)) => assert_eq!(val.as_datetime(), Some(dt)),
            other => panic!("expected a date-time cell, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_calls_are_rejected() {
        let mut sink = XlsxSink::new();
        sink.create_sheet("RM", &[], Some(derive_header(&["PO"]).as_slice()))
            .unwrap();

        assert!(sink.create_sheet("RM", &[], None).is_err());
        assert!(sink.enable_auto_filter("PO").is_err());
        assert!(sink
            .set_cell_style("RM", 1, 0, &SpecCellFormat::default())
            .is_err());
        assert!(sink
            .set_cell_style("RM", 0, 0, &SpecCellFormat::default())
            .is_ok());
    }

    #[test]
    fn test_empty_sheet_without_columns_serializes() {
        let mut sink = XlsxSink::new();
        sink.create_sheet("PO", &[], Some(Vec::<String>::new().as_slice())).unwrap();
        sink.enable_auto_filter("PO").unwrap();
        sink.freeze_header_row("PO").unwrap();
        assert!(sink.finish().is_ok());
    }

    #[test]
    fn test_format_mapping_covers_fill_font_and_bold() {
        let spec = SpecCellFormat {
            font_name: Some("Aptos Narrow".to_string()),
            font_size: Some(11),
            bold: Some(true),
            bg_color: Some("#8F8D8D".to_string()),
            font_color: Some("#000000".to_string()),
            num_format: None,
        };
        let expected = Format::new()
            .set_font_name("Aptos Narrow")
            .set_font_size(11.0)
            .set_bold()
            .set_background_color("#8F8D8D")
            .set_font_color("#000000");
        assert_eq!(derive_rust_xlsx_format(&spec), expected);
    }
}
