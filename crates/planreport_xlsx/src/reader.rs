//! Input adapter: first worksheet of a spreadsheet file, or an Arrow IPC frame.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use tracing::{debug, info};

use crate::error::ReportError;
use crate::spec::{EnumCellValue, SpecDataset};
use crate::util::{derive_unique_header_names, parse_date_text};

const TUP_EXT_SPREADSHEET: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const TUP_EXT_ARROW_IPC: [&str; 3] = ["arrow", "ipc", "feather"];

/// Supported input encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumInputFormat {
    /// Excel or OpenDocument workbook; the first worksheet is read.
    Spreadsheet,
    /// Arrow IPC file holding one data frame.
    ArrowIpc,
}

impl EnumInputFormat {
    /// Infer the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let c_ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if TUP_EXT_SPREADSHEET.contains(&c_ext.as_str()) {
            Ok(Self::Spreadsheet)
        } else if TUP_EXT_ARROW_IPC.contains(&c_ext.as_str()) {
            Ok(Self::ArrowIpc)
        } else {
            Err(ReportError::UnsupportedInput(format!(
                "{} (expected one of: {}, {})",
                path.display(),
                TUP_EXT_SPREADSHEET.join(", "),
                TUP_EXT_ARROW_IPC.join(", ")
            )))
        }
    }
}

/// Read the raw dataset stored at `path`.
pub fn read_dataset_from_path(path: &Path) -> Result<SpecDataset, ReportError> {
    let format = EnumInputFormat::from_path(path)?;
    let v_bytes = std::fs::read(path)?;
    info!(path = %path.display(), bytes = v_bytes.len(), ?format, "input loaded");
    read_dataset_from_bytes(v_bytes, format)
}

/// Decode an in-memory input file.
pub fn read_dataset_from_bytes(
    v_bytes: Vec<u8>,
    format: EnumInputFormat,
) -> Result<SpecDataset, ReportError> {
    match format {
        EnumInputFormat::Spreadsheet => read_spreadsheet(v_bytes),
        EnumInputFormat::ArrowIpc => {
            let df = IpcReader::new(Cursor::new(v_bytes.as_slice())).finish()?;
            derive_dataset_from_dataframe(&df)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Spreadsheet

fn read_spreadsheet(v_bytes: Vec<u8>) -> Result<SpecDataset, ReportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(v_bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::InvalidInput("workbook has no worksheet".to_string()))??;

    // The used range may start right of column A; keep absolute positions.
    let n_col_offset = range.start().map(|(_, n_col)| n_col as usize).unwrap_or(0);
    let mut it_rows = range.rows().map(|row| {
        let mut l_values = vec![EnumCellValue::None; n_col_offset];
        l_values.extend(row.iter().map(convert_calamine_data));
        l_values
    });

    let Some(l_header) = it_rows.next() else {
        debug!("first worksheet is empty");
        return Ok(SpecDataset::default());
    };
    let l_raw_names: Vec<String> = l_header.iter().map(EnumCellValue::to_text).collect();
    let columns = derive_unique_header_names(&l_raw_names);

    let mut n_skipped = 0usize;
    let rows: Vec<Vec<EnumCellValue>> = it_rows
        .filter(|row| {
            let if_empty = row.iter().all(EnumCellValue::is_missing);
            n_skipped += usize::from(if_empty);
            !if_empty
        })
        .collect();

    debug!(
        columns = columns.len(),
        rows = rows.len(),
        skipped_empty = n_skipped,
        "worksheet decoded"
    );
    SpecDataset::new(columns, rows).map_err(ReportError::InvalidInput)
}

fn convert_calamine_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty | Data::Error(_) => EnumCellValue::None,
        Data::String(val) if val.is_empty() => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::text(if *val { "True" } else { "False" }),
        Data::DateTime(val) => match val.as_datetime() {
            Some(dt) => EnumCellValue::DateTime(dt),
            None => EnumCellValue::Number(val.as_f64()),
        },
        Data::DateTimeIso(val) => match parse_date_text(val) {
            Some(dt) => EnumCellValue::DateTime(dt),
            None => EnumCellValue::String(val.clone()),
        },
        Data::DurationIso(val) => EnumCellValue::String(val.clone()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrame

/// Convert a polars frame into a dataset, column names kept verbatim.
pub fn derive_dataset_from_dataframe(df: &DataFrame) -> Result<SpecDataset, ReportError> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c_name| c_name.to_string())
        .collect();
    let l_cols = df.get_columns();

    let mut rows = vec![vec![EnumCellValue::None; df.width()]; df.height()];
    for (n_idx_row, row) in rows.iter_mut().enumerate() {
        for (n_idx_col, cell) in row.iter_mut().enumerate() {
            let value = l_cols[n_idx_col].get(n_idx_row)?;
            *cell = derive_cell_value_from_any_value(value);
        }
    }

    debug!(columns = columns.len(), rows = rows.len(), "data frame decoded");
    SpecDataset::new(columns, rows).map_err(ReportError::InvalidInput)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::text(if val { "True" } else { "False" }),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        // Temporal and nested values go through their display text;
        // the date normalizer parses the temporal ones back.
        _ => EnumCellValue::String(value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
