//! Overview sheet builder: title, quick stats, cross-tab and two ranked mini-tables.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::conf::{
    C_COL_EQUIPMENT, C_COL_FLOAT_TODAY_OPENING, C_COL_MATERIAL_DESCRIPTION, C_COL_MATERIAL_NO,
    C_COL_OPENING_DATE, C_COL_PROCUREMENT_KEY, C_COL_STATUS, C_COL_STATUS_STYPE,
    C_DATE_FORMAT_CANONICAL, C_HEADER_EQUIPMENT, C_HEADER_FLOAT_TODAY_OPENING,
    C_HEADER_MATERIAL_DESCRIPTION, C_HEADER_MATERIAL_NO, C_HEADER_OPENING_DATE, C_HEADER_TOTAL,
    C_LABEL_ASSEMBLY, C_LABEL_CROSSTAB, C_LABEL_DELAYED, C_LABEL_GENERATED_AT, C_LABEL_IN_STOCK,
    C_LABEL_PO_CONFIRM, C_LABEL_PO_CREATED, C_LABEL_PUR_REQUIST, C_LABEL_QUICK_STATS,
    C_LABEL_TITLE, C_LABEL_TOTAL_ITEMS, C_NOTICE_ASSEMBLY_COLUMNS_MISSING,
    C_NOTICE_DELAY_COLUMNS_MISSING, C_NOTICE_NO_ASSEMBLY_IN_WINDOW, C_NOTICE_NO_ASSEMBLY_ITEMS,
    C_TAG_IN_STOCK, C_TAG_PO_CONFIRM, C_TAG_PO_CREATED, C_TAG_PROCUREMENT_E, C_TAG_PUR_REQUIST,
    C_TIMESTAMP_FORMAT,
};
use crate::spec::{
    Clock, EnumCellValue, EnumOverviewLine, SpecDataset, SpecOverviewDocument, SpecReportOptions,
    if_text_in,
};
use crate::util::{coerce_numeric, compare_axis_values, compare_missing_last};

////////////////////////////////////////////////////////////////////////////////
// #region Derivations

/// Contingency table with margins.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCrossTab {
    /// Distinct row-axis values, sorted.
    pub row_keys: Vec<EnumCellValue>,
    /// Distinct column-axis values, sorted.
    pub col_keys: Vec<EnumCellValue>,
    /// `counts[row][col]` co-occurrences.
    pub counts: Vec<Vec<usize>>,
}

impl SpecCrossTab {
    pub fn row_total(&self, n_idx_row: usize) -> usize {
        self.counts[n_idx_row].iter().sum()
    }

    pub fn col_total(&self, n_idx_col: usize) -> usize {
        self.counts.iter().map(|row| row[n_idx_col]).sum()
    }

    pub fn grand_total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Cross-tabulate `row_column` × `col_column`, skipping rows missing either value.
///
/// `None` when either column is absent.
pub fn derive_crosstab(
    dataset: &SpecDataset,
    row_column: &str,
    col_column: &str,
) -> Option<SpecCrossTab> {
    let n_idx_row_col = dataset.column_index(row_column)?;
    let n_idx_col_col = dataset.column_index(col_column)?;

    let l_pairs: Vec<(&EnumCellValue, &EnumCellValue)> = dataset
        .rows()
        .iter()
        .map(|row| (&row[n_idx_row_col], &row[n_idx_col_col]))
        .filter(|(a, b)| !a.is_missing() && !b.is_missing())
        .collect();

    let derive_keys = |l_values: Vec<&EnumCellValue>| {
        let mut l_keys: Vec<EnumCellValue> = l_values.into_iter().cloned().collect();
        l_keys.sort_by(compare_axis_values);
        l_keys.dedup_by(|a, b| compare_axis_values(a, b).is_eq());
        l_keys
    };
    let row_keys = derive_keys(l_pairs.iter().map(|(a, _)| *a).collect());
    let col_keys = derive_keys(l_pairs.iter().map(|(_, b)| *b).collect());

    let mut counts = vec![vec![0usize; col_keys.len()]; row_keys.len()];
    for (a, b) in &l_pairs {
        let Ok(n_idx_r) = row_keys.binary_search_by(|key| compare_axis_values(key, a)) else {
            continue;
        };
        let Ok(n_idx_c) = col_keys.binary_search_by(|key| compare_axis_values(key, b)) else {
            continue;
        };
        counts[n_idx_r][n_idx_c] += 1;
    }

    Some(SpecCrossTab {
        row_keys,
        col_keys,
        counts,
    })
}

/// Most overdue items: `(id, description, delay)` ascending by delay.
///
/// Rows whose delay does not parse are dropped; `None` when a column is absent.
pub fn select_top_delayed(
    dataset: &SpecDataset,
    n_top: usize,
) -> Option<Vec<(EnumCellValue, EnumCellValue, f64)>> {
    let n_idx_id = dataset.column_index(C_COL_MATERIAL_NO)?;
    let n_idx_desc = dataset.column_index(C_COL_MATERIAL_DESCRIPTION)?;
    let n_idx_delay = dataset.column_index(C_COL_FLOAT_TODAY_OPENING)?;

    let mut l_items: Vec<(EnumCellValue, EnumCellValue, f64)> = dataset
        .rows()
        .iter()
        .filter_map(|row| {
            coerce_numeric(&row[n_idx_delay])
                .map(|n_delay| (row[n_idx_id].clone(), row[n_idx_desc].clone(), n_delay))
        })
        .collect();

    l_items.sort_by(|a, b| compare_missing_last(Some(a.2), Some(b.2)));
    l_items.truncate(n_top);
    Some(l_items)
}

/// Outcome of the assembly look-ahead selection.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumAssemblyOutcome {
    /// A required column is absent.
    ColumnsMissing,
    /// No row carries the assembly procurement tag.
    NoTaggedRows,
    /// Tagged rows exist but none opens inside the window.
    NoneInWindow,
    /// `(id, description, date text)` sorted by date.
    Rows(Vec<(EnumCellValue, EnumCellValue, EnumCellValue)>),
}

/// Assembly items whose opening date falls in `[now, now + n_days]`.
pub fn select_assembly_window(
    dataset: &SpecDataset,
    now: NaiveDateTime,
    n_days: i64,
) -> EnumAssemblyOutcome {
    let (Some(n_idx_key), Some(n_idx_id), Some(n_idx_desc), Some(n_idx_date)) = (
        dataset.column_index(C_COL_PROCUREMENT_KEY),
        dataset.column_index(C_COL_MATERIAL_NO),
        dataset.column_index(C_COL_MATERIAL_DESCRIPTION),
        dataset.column_index(C_COL_OPENING_DATE),
    ) else {
        return EnumAssemblyOutcome::ColumnsMissing;
    };

    let l_tagged: Vec<&Vec<EnumCellValue>> = dataset
        .rows()
        .iter()
        .filter(|row| if_text_in(&row[n_idx_key], &[C_TAG_PROCUREMENT_E]))
        .collect();
    if l_tagged.is_empty() {
        return EnumAssemblyOutcome::NoTaggedRows;
    }

    let Some(dt_window_end) = TimeDelta::try_days(n_days).and_then(|d| now.checked_add_signed(d))
    else {
        return EnumAssemblyOutcome::NoneInWindow;
    };

    let mut l_dated: Vec<(NaiveDateTime, &Vec<EnumCellValue>)> = l_tagged
        .into_iter()
        .filter_map(|row| {
            let dt = row[n_idx_date]
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), C_DATE_FORMAT_CANONICAL).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))?;
            (dt >= now && dt <= dt_window_end).then_some((dt, row))
        })
        .collect();

    if l_dated.is_empty() {
        return EnumAssemblyOutcome::NoneInWindow;
    }

    l_dated.sort_by_key(|(dt, _)| *dt);
    EnumAssemblyOutcome::Rows(
        l_dated
            .into_iter()
            .map(|(_, row)| {
                (
                    row[n_idx_id].clone(),
                    row[n_idx_desc].clone(),
                    row[n_idx_date].clone(),
                )
            })
            .collect(),
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Builder

/// Build the overview document from a normalized dataset.
pub fn build_overview(
    dataset: &SpecDataset,
    clock: &dyn Clock,
    options: &SpecReportOptions,
) -> SpecOverviewDocument {
    let now = clock.now();
    let mut doc = SpecOverviewDocument::default();

    doc.push(EnumOverviewLine::Title(C_LABEL_TITLE.to_string()));
    doc.push(EnumOverviewLine::Blank);
    doc.push(EnumOverviewLine::Title(format!(
        "{C_LABEL_GENERATED_AT} {}",
        now.format(C_TIMESTAMP_FORMAT)
    )));
    doc.push(EnumOverviewLine::Blank);

    push_stats_section(&mut doc, dataset);
    push_crosstab_section(&mut doc, dataset);
    push_delay_section(&mut doc, dataset, options.n_top_delayed);
    push_assembly_section(&mut doc, dataset, now, options.n_days_assembly_window);

    debug!(lines = doc.lines.len(), "overview built");
    doc
}

fn push_stats_section(doc: &mut SpecOverviewDocument, dataset: &SpecDataset) {
    doc.push(EnumOverviewLine::Title(C_LABEL_QUICK_STATS.to_string()));
    doc.push(EnumOverviewLine::Blank);

    let l_stats = [
        (C_LABEL_TOTAL_ITEMS, dataset.height()),
        (
            C_LABEL_IN_STOCK,
            dataset.count_text_in(C_COL_STATUS, &[C_TAG_IN_STOCK]),
        ),
        (
            C_LABEL_PUR_REQUIST,
            dataset.count_text_in(C_COL_STATUS_STYPE, &[C_TAG_PUR_REQUIST]),
        ),
        (
            C_LABEL_PO_CONFIRM,
            dataset.count_text_in(C_COL_STATUS_STYPE, &[C_TAG_PO_CONFIRM]),
        ),
        (
            C_LABEL_PO_CREATED,
            dataset.count_text_in(C_COL_STATUS_STYPE, &[C_TAG_PO_CREATED]),
        ),
    ];
    for (c_label, n_value) in l_stats {
        doc.push(EnumOverviewLine::Stat {
            label: c_label.to_string(),
            value: n_value,
        });
    }
    doc.push(EnumOverviewLine::Blank);
    doc.push(EnumOverviewLine::Blank);
}

fn push_crosstab_section(doc: &mut SpecOverviewDocument, dataset: &SpecDataset) {
    let Some(crosstab) = derive_crosstab(dataset, C_COL_EQUIPMENT, C_COL_STATUS_STYPE) else {
        debug!("cross-tab columns absent; section skipped");
        return;
    };

    doc.push(EnumOverviewLine::Title(C_LABEL_CROSSTAB.to_string()));
    doc.push(EnumOverviewLine::Blank);

    let mut l_header = vec![C_HEADER_EQUIPMENT.to_string()];
    l_header.extend(crosstab.col_keys.iter().map(|key| key.to_text().to_uppercase()));
    l_header.push(C_HEADER_TOTAL.to_string());
    doc.push(EnumOverviewLine::TableHeader(l_header));

    for (n_idx_row, key) in crosstab.row_keys.iter().enumerate() {
        let mut l_cells = vec![key.clone()];
        l_cells.extend(
            crosstab.counts[n_idx_row]
                .iter()
                .map(|n| EnumCellValue::Number(*n as f64)),
        );
        l_cells.push(EnumCellValue::Number(crosstab.row_total(n_idx_row) as f64));
        doc.push(EnumOverviewLine::TableRow(l_cells));
    }

    let mut l_totals = vec![EnumCellValue::text(C_HEADER_TOTAL)];
    l_totals.extend(
        (0..crosstab.col_keys.len())
            .map(|n_idx| EnumCellValue::Number(crosstab.col_total(n_idx) as f64)),
    );
    l_totals.push(EnumCellValue::Number(crosstab.grand_total() as f64));
    doc.push(EnumOverviewLine::TableRow(l_totals));

    doc.push(EnumOverviewLine::Blank);
    doc.push(EnumOverviewLine::Blank);
}

fn push_delay_section(doc: &mut SpecOverviewDocument, dataset: &SpecDataset, n_top: usize) {
    doc.push(EnumOverviewLine::Title(C_LABEL_DELAYED.to_string()));
    doc.push(EnumOverviewLine::TableHeader(vec![
        C_HEADER_MATERIAL_NO.to_string(),
        C_HEADER_MATERIAL_DESCRIPTION.to_string(),
        C_HEADER_FLOAT_TODAY_OPENING.to_string(),
    ]));

    match select_top_delayed(dataset, n_top) {
        Some(l_items) => {
            for (id, desc, n_delay) in l_items {
                doc.push(EnumOverviewLine::TableRow(vec![
                    id,
                    desc,
                    EnumCellValue::Number(n_delay),
                ]));
            }
        }
        None => doc.push(EnumOverviewLine::Notice(
            C_NOTICE_DELAY_COLUMNS_MISSING.to_string(),
        )),
    }

    doc.push(EnumOverviewLine::Blank);
    doc.push(EnumOverviewLine::Blank);
}

fn push_assembly_section(
    doc: &mut SpecOverviewDocument,
    dataset: &SpecDataset,
    now: NaiveDateTime,
    n_days: i64,
) {
    doc.push(EnumOverviewLine::Title(C_LABEL_ASSEMBLY.to_string()));
    doc.push(EnumOverviewLine::TableHeader(vec![
        C_HEADER_MATERIAL_NO.to_string(),
        C_HEADER_MATERIAL_DESCRIPTION.to_string(),
        C_HEADER_OPENING_DATE.to_string(),
    ]));

    let c_notice = match select_assembly_window(dataset, now, n_days) {
        EnumAssemblyOutcome::Rows(l_rows) => {
            for (id, desc, date) in l_rows {
                doc.push(EnumOverviewLine::TableRow(vec![id, desc, date]));
            }
            return;
        }
        EnumAssemblyOutcome::ColumnsMissing => C_NOTICE_ASSEMBLY_COLUMNS_MISSING,
        EnumAssemblyOutcome::NoTaggedRows => C_NOTICE_NO_ASSEMBLY_ITEMS,
        EnumAssemblyOutcome::NoneInWindow => C_NOTICE_NO_ASSEMBLY_IN_WINDOW,
    };
    doc.push(EnumOverviewLine::Notice(c_notice.to_string()));
    doc.push(EnumOverviewLine::Blank);
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
