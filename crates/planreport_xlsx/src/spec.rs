//! Shared report models: cell values, datasets, views, overview lines and styles.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Local, NaiveDateTime};

use crate::conf::{
    C_SHEET_FULL_REPORT, C_SHEET_OVERVIEW, C_SHEET_PO, C_SHEET_RM, C_SHEET_STOCK,
};
use crate::util::{derive_cell_text, validate_unique_columns};

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Scalar cell value carried through the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Date-time value read from a date-typed input cell.
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    /// Build a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Borrow the text payload, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render the value the way it reads in a cell (empty for missing).
    pub fn to_text(&self) -> String {
        derive_cell_text(self)
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Dataset

/// Ordered rows over a fixed, named column set.
///
/// Rows are stored positionally; column access by name goes through
/// [`SpecDataset::column_index`], so every derivation can guard on
/// [`SpecDataset::has_column`] before touching a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDataset {
    columns: Vec<String>,
    rows: Vec<Vec<EnumCellValue>>,
    dict_col_idx: BTreeMap<String, usize>,
}

impl SpecDataset {
    /// Build a dataset; short rows are padded with missing values.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<EnumCellValue>>) -> Result<Self, String> {
        validate_unique_columns(&columns)?;

        let n_width = columns.len();
        let mut l_rows = Vec::with_capacity(rows.len());
        for (n_idx_row, mut row) in rows.into_iter().enumerate() {
            if row.len() > n_width {
                return Err(format!(
                    "Row {n_idx_row} has {} values but only {n_width} columns.",
                    row.len()
                ));
            }
            row.resize(n_width, EnumCellValue::None);
            l_rows.push(row);
        }

        let dict_col_idx = columns
            .iter()
            .enumerate()
            .map(|(n_idx, c_name)| (c_name.clone(), n_idx))
            .collect();

        Ok(Self {
            columns,
            rows: l_rows,
            dict_col_idx,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<EnumCellValue>> {
        &mut self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.dict_col_idx.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.dict_col_idx.get(name).copied()
    }

    /// Value of `name` in row `row_idx`; `None` when the column or row is absent.
    pub fn value(&self, row_idx: usize, name: &str) -> Option<&EnumCellValue> {
        let n_idx_col = self.column_index(name)?;
        self.rows.get(row_idx).map(|row| &row[n_idx_col])
    }

    /// Number of rows whose `column` holds text equal to one of `tags`.
    ///
    /// Zero when the column is absent.
    pub fn count_text_in(&self, column: &str, tags: &[&str]) -> usize {
        let Some(n_idx_col) = self.column_index(column) else {
            return 0;
        };
        self.rows
            .iter()
            .filter(|row| if_text_in(&row[n_idx_col], tags))
            .count()
    }
}

/// True when `value` is text exactly equal to one of `tags`.
pub fn if_text_in(value: &EnumCellValue, tags: &[&str]) -> bool {
    value.as_str().is_some_and(|s| tags.contains(&s))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Views

/// Named row sets emitted as data sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumViewKind {
    /// All rows and columns, in normalized order.
    FullReport,
    /// Purchase requisitions.
    Rm,
    /// Confirmed or created purchase orders.
    Po,
    /// Items in stock.
    Stock,
}

impl EnumViewKind {
    /// Sheet name this view is written to.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::FullReport => C_SHEET_FULL_REPORT,
            Self::Rm => C_SHEET_RM,
            Self::Po => C_SHEET_PO,
            Self::Stock => C_SHEET_STOCK,
        }
    }
}

/// Static definition of one filtered, projected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecViewDefinition {
    pub kind: EnumViewKind,
    /// Categorical column the predicate reads.
    pub predicate_column: &'static str,
    /// Accepted literal values of `predicate_column`.
    pub predicate_tags: &'static [&'static str],
    /// Preferred projection order; absent columns are dropped.
    pub columns: &'static [&'static str],
}

/// Independent, column-projected copy of dataset rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecView {
    pub kind: EnumViewKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<EnumCellValue>>,
}

impl SpecView {
    pub fn sheet_name(&self) -> &'static str {
        self.kind.sheet_name()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == name)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Overview

/// One line of the overview layout.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumOverviewLine {
    /// Section title or timestamp line.
    Title(String),
    /// Labeled counter.
    Stat { label: String, value: usize },
    /// Fixed column header row of a mini-table.
    TableHeader(Vec<String>),
    /// Data row of a mini-table.
    TableRow(Vec<EnumCellValue>),
    /// Explanation emitted instead of an empty table.
    Notice(String),
    /// Separator.
    Blank,
}

impl EnumOverviewLine {
    pub fn to_cells(&self) -> Vec<EnumCellValue> {
        match self {
            Self::Title(text) | Self::Notice(text) => vec![EnumCellValue::text(text.as_str())],
            Self::Stat { label, value } => vec![
                EnumCellValue::text(label.as_str()),
                EnumCellValue::Number(*value as f64),
            ],
            Self::TableHeader(l_names) => l_names
                .iter()
                .map(|c_name| EnumCellValue::text(c_name.as_str()))
                .collect(),
            Self::TableRow(l_values) => l_values.clone(),
            Self::Blank => vec![],
        }
    }
}

/// Heterogeneous overview sheet content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecOverviewDocument {
    pub lines: Vec<EnumOverviewLine>,
}

impl SpecOverviewDocument {
    pub fn push(&mut self, line: EnumOverviewLine) {
        self.lines.push(line);
    }

    /// Non-rectangular cell grid, one entry per line.
    pub fn to_grid(&self) -> Vec<Vec<EnumCellValue>> {
        self.lines.iter().map(EnumOverviewLine::to_cells).collect()
    }
}

/// Complete, sink-independent report content.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecReportBook {
    pub overview: SpecOverviewDocument,
    /// FullReport, RM, PO, Stock, in that order.
    pub views: Vec<SpecView>,
}

impl SpecReportBook {
    pub fn view(&self, kind: EnumViewKind) -> Option<&SpecView> {
        self.views.iter().find(|view| view.kind == kind)
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&'static str> {
        let mut l_names = vec![C_SHEET_OVERVIEW];
        l_names.extend(self.views.iter().map(SpecView::sheet_name));
        l_names
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormat

/// Cell format; `None` fields inherit from the layer below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }
}

/// Row predicate used by a style rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRowPredicate {
    /// Text cell exactly equal to `value`.
    TextEquals {
        column: &'static str,
        value: &'static str,
    },
    /// Cell text starting with `prefix`.
    TextStartsWith {
        column: &'static str,
        prefix: &'static str,
    },
}

impl EnumRowPredicate {
    pub fn column(&self) -> &'static str {
        match self {
            Self::TextEquals { column, .. } | Self::TextStartsWith { column, .. } => column,
        }
    }

    /// Evaluate against the cell of [`Self::column`].
    pub fn matches(&self, value: &EnumCellValue) -> bool {
        match self {
            Self::TextEquals { value: tag, .. } => value.as_str() == Some(*tag),
            Self::TextStartsWith { prefix, .. } => {
                !value.is_missing() && value.to_text().starts_with(prefix)
            }
        }
    }
}

/// Ranked row style; lower rank wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStyleRule {
    pub name: &'static str,
    pub rank: u8,
    pub predicate: EnumRowPredicate,
    /// Applied to every cell of a matching row.
    pub format: SpecCellFormat,
}

/// Read-only table of formats and row rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStyleRegistry {
    /// Font family/size layered onto every cell last.
    pub global_font: SpecCellFormat,
    /// Data sheet header row format.
    pub header: SpecCellFormat,
    /// Overview label format.
    pub overview_bold: SpecCellFormat,
    /// Row rules sorted by ascending rank.
    pub row_rules: Vec<SpecStyleRule>,
}

/// Per-cell formats plus column widths for one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetStyle {
    /// Same shape as the written grid (header row included for data sheets).
    pub cells: Vec<Vec<SpecCellFormat>>,
    /// Name of the rule applied to each data row, `None` for default styling.
    pub row_rules: Vec<Option<&'static str>>,
    /// Final width per column.
    pub widths: Vec<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Tunables of the overview and width policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportOptions {
    /// Rows kept in the delayed-items table.
    pub n_top_delayed: usize,
    /// Length of the assembly look-ahead window, in days.
    pub n_days_assembly_window: i64,
    /// Width padding added to the longest text of a column.
    pub width_cell_padding: usize,
    /// Maximum final column width.
    pub width_cell_max: usize,
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            n_top_delayed: 15,
            n_days_assembly_window: 90,
            width_cell_padding: 2,
            width_cell_max: 35,
        }
    }
}

/// Wall-clock source; injectable for reproducible output.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ProcessReport

/// Row counts of one processing run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecProcessReport {
    pub cnt_full: usize,
    pub cnt_rm: usize,
    pub cnt_po: usize,
    pub cnt_stock: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecProcessReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} full={} rm={} po={} stock={} warnings={}",
            self.cnt_full,
            self.cnt_rm,
            self.cnt_po,
            self.cnt_stock,
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecProcessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[REPORT]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
