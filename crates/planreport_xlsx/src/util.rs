//! Stateless helper utilities shared by the report stages.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Render a number the way it reads in a cell: integral values without fraction.
pub fn format_number_text(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}

/// Text form of a cell value; empty for missing.
pub fn derive_cell_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Number(n) => format_number_text(*n),
        EnumCellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Coerce a cell to a finite number; anything unparsable becomes `None`.
pub fn coerce_numeric(value: &EnumCellValue) -> Option<f64> {
    let n_value = match value {
        EnumCellValue::Number(n) => *n,
        EnumCellValue::String(s) => s.trim().parse::<f64>().ok()?,
        EnumCellValue::None | EnumCellValue::DateTime(_) => return None,
    };
    n_value.is_finite().then_some(n_value)
}

/// Ascending order over optional numbers with missing values placed last.
pub fn compare_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Total order used for categorical axes: numbers, then date-times, then text.
pub fn compare_axis_values(a: &EnumCellValue, b: &EnumCellValue) -> Ordering {
    fn rank(value: &EnumCellValue) -> u8 {
        match value {
            EnumCellValue::Number(_) => 0,
            EnumCellValue::DateTime(_) => 1,
            EnumCellValue::String(_) => 2,
            EnumCellValue::None => 3,
        }
    }

    match (a, b) {
        (EnumCellValue::Number(x), EnumCellValue::Number(y)) => x.total_cmp(y),
        (EnumCellValue::DateTime(x), EnumCellValue::DateTime(y)) => x.cmp(y),
        (EnumCellValue::String(x), EnumCellValue::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DateParsing

const TUP_DATETIME_FORMATS: [&str; 13] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const TUP_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Excel serial day 0 (1900 date system, leap-year bug included).
fn derive_excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Convert an Excel serial date number to a date-time.
pub fn convert_excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial <= 0.0 || serial >= 2_958_466.0 {
        return None;
    }
    let n_millis = (serial * 86_400_000.0).round() as i64;
    derive_excel_epoch()?.checked_add_signed(TimeDelta::try_milliseconds(n_millis)?)
}

/// Convert a date-time to an Excel serial date number.
pub fn convert_datetime_to_excel_serial(dt: &NaiveDateTime) -> Option<f64> {
    let n_millis = (*dt - derive_excel_epoch()?).num_milliseconds();
    Some(n_millis as f64 / 86_400_000.0)
}

/// Parse free-form date text; month-first wins when both readings are valid.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let c_text = text.trim();
    if c_text.is_empty() {
        return None;
    }
    for c_fmt in TUP_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(c_text, c_fmt) {
            return Some(dt);
        }
    }
    for c_fmt in TUP_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(c_text, c_fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Permissive date coercion of one cell; failures become `None`.
pub fn parse_date_permissive(value: &EnumCellValue) -> Option<NaiveDateTime> {
    match value {
        EnumCellValue::None => None,
        EnumCellValue::DateTime(dt) => Some(*dt),
        EnumCellValue::Number(n) => convert_excel_serial_to_datetime(*n),
        EnumCellValue::String(s) => parse_date_text(s),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Make raw header cells usable as column names.
///
/// Blank names become `Unnamed: <idx>`; repeats get `.1`, `.2`, ... suffixes.
pub fn derive_unique_header_names(raw_names: &[String]) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    let mut l_names = Vec::with_capacity(raw_names.len());

    for (n_idx, c_raw) in raw_names.iter().enumerate() {
        let c_base = if c_raw.trim().is_empty() {
            format!("Unnamed: {n_idx}")
        } else {
            c_raw.clone()
        };

        let mut c_name = c_base.clone();
        let mut n_dup = 1usize;
        while set_seen.contains(&c_name) {
            c_name = format!("{c_base}.{n_dup}");
            n_dup += 1;
        }
        set_seen.insert(c_name.clone());
        l_names.push(c_name);
    }

    l_names
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Width

/// Displayed text length of one cell; blank, empty and zero cells count as 0.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::Number(n) if *n == 0.0 => 0,
        _ => derive_cell_text(value).chars().count(),
    }
}

/// `min(longest + padding, max)` per column over a possibly ragged grid.
pub fn derive_column_widths(
    grid: &[Vec<EnumCellValue>],
    width_cell_padding: usize,
    width_cell_max: usize,
) -> Vec<usize> {
    let n_width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let mut l_width_by_col = vec![0usize; n_width];

    for row in grid {
        for (n_idx_col, value) in row.iter().enumerate() {
            l_width_by_col[n_idx_col] =
                usize::max(l_width_by_col[n_idx_col], estimate_width_len(value));
        }
    }

    l_width_by_col
        .into_iter()
        .map(|n_len| usize::min(n_len + width_cell_padding, width_cell_max))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
