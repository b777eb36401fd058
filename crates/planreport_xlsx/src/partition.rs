//! View partitioning: full pass-through plus the RM/PO/Stock filtered projections.

use tracing::{debug, warn};

use crate::conf::TUP_VIEW_DEFINITIONS;
use crate::spec::{
    EnumCellValue, EnumViewKind, SpecDataset, SpecView, SpecViewDefinition, if_text_in,
};

/// Derive FullReport, RM, PO and Stock, in that order.
pub fn partition_views(dataset: &SpecDataset) -> Vec<SpecView> {
    let mut l_views = Vec::with_capacity(1 + TUP_VIEW_DEFINITIONS.len());
    l_views.push(derive_full_report_view(dataset));
    l_views.extend(TUP_VIEW_DEFINITIONS.iter().map(|def| derive_filtered_view(dataset, def)));
    l_views
}

/// All rows and columns, copied in dataset order.
pub fn derive_full_report_view(dataset: &SpecDataset) -> SpecView {
    SpecView {
        kind: EnumViewKind::FullReport,
        columns: dataset.columns().to_vec(),
        rows: dataset.rows().to_vec(),
    }
}

/// Rows matching `def`'s predicate, projected onto its present columns.
///
/// A missing predicate column yields an empty view without columns.
pub fn derive_filtered_view(dataset: &SpecDataset, def: &SpecViewDefinition) -> SpecView {
    let Some(n_idx_predicate) = dataset.column_index(def.predicate_column) else {
        warn!(
            sheet = def.kind.sheet_name(),
            column = def.predicate_column,
            "predicate column absent; view left empty"
        );
        return SpecView {
            kind: def.kind,
            columns: vec![],
            rows: vec![],
        };
    };

    let l_projection: Vec<(String, usize)> = def
        .columns
        .iter()
        .filter_map(|c_name| {
            dataset
                .column_index(c_name)
                .map(|n_idx| (c_name.to_string(), n_idx))
        })
        .collect();

    let rows: Vec<Vec<EnumCellValue>> = dataset
        .rows()
        .iter()
        .filter(|row| if_text_in(&row[n_idx_predicate], def.predicate_tags))
        .map(|row| {
            l_projection
                .iter()
                .map(|(_, n_idx)| row[*n_idx].clone())
                .collect()
        })
        .collect();

    debug!(
        sheet = def.kind.sheet_name(),
        rows = rows.len(),
        columns = l_projection.len(),
        "view partitioned"
    );

    SpecView {
        kind: def.kind,
        columns: l_projection.into_iter().map(|(c_name, _)| c_name).collect(),
        rows,
    }
}

/// Rows selected by more than one filtered view.
///
/// Exclusivity is assumed by the report layout but not guaranteed by the data.
pub fn count_overlapping_rows(dataset: &SpecDataset) -> usize {
    let l_predicates: Vec<(usize, &[&str])> = TUP_VIEW_DEFINITIONS
        .iter()
        .filter_map(|def| {
            dataset
                .column_index(def.predicate_column)
                .map(|n_idx| (n_idx, def.predicate_tags))
        })
        .collect();

    dataset
        .rows()
        .iter()
        .filter(|row| {
            l_predicates
                .iter()
                .filter(|(n_idx, tags)| if_text_in(&row[*n_idx], tags))
                .count()
                > 1
        })
        .count()
}
