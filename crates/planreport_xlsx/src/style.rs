//! Style resolution: header fill, ranked row rules, overview bold labels and widths.
//!
//! Every resolver returns a [`SpecSheetStyle`] shaped like the grid it styles;
//! the registry's global font is layered onto every cell as the last step.

use std::collections::BTreeMap;

use tracing::debug;

use crate::conf::{TUP_OVERVIEW_BOLD_HEADERS, TUP_OVERVIEW_BOLD_LABELS, TUP_OVERVIEW_BOLD_PREFIXES};
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecReportOptions, SpecSheetStyle, SpecStyleRegistry,
    SpecStyleRule,
};
use crate::util::derive_column_widths;

/// First matching row rule, in rank order; rules whose column is absent never match.
pub fn resolve_row_rule<'a>(
    row: &[EnumCellValue],
    dict_col_idx: &BTreeMap<&str, usize>,
    registry: &'a SpecStyleRegistry,
) -> Option<&'a SpecStyleRule> {
    registry.row_rules.iter().find(|rule| {
        dict_col_idx
            .get(rule.predicate.column())
            .and_then(|n_idx| row.get(*n_idx))
            .is_some_and(|value| rule.predicate.matches(value))
    })
}

/// Styles for a data sheet: header row plus one rule (or none) per row.
pub fn resolve_data_sheet_style(
    header: &[String],
    rows: &[Vec<EnumCellValue>],
    registry: &SpecStyleRegistry,
    options: &SpecReportOptions,
) -> SpecSheetStyle {
    let dict_col_idx: BTreeMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(n_idx, c_name)| (c_name.as_str(), n_idx))
        .collect();

    let n_width = header.len();
    let mut cells = Vec::with_capacity(rows.len() + 1);
    cells.push(vec![registry.header.clone(); n_width]);

    let mut row_rules = Vec::with_capacity(rows.len());
    for row in rows {
        let rule = resolve_row_rule(row, &dict_col_idx, registry);
        let fmt_row = rule.map(|r| r.format.clone()).unwrap_or_default();
        cells.push(vec![fmt_row; n_width]);
        row_rules.push(rule.map(|r| r.name));
    }

    apply_global_font(&mut cells, registry);

    let mut grid: Vec<Vec<EnumCellValue>> = Vec::with_capacity(rows.len() + 1);
    grid.push(
        header
            .iter()
            .map(|c_name| EnumCellValue::text(c_name.as_str()))
            .collect(),
    );
    grid.extend(rows.iter().cloned());
    let widths = derive_column_widths(&grid, options.width_cell_padding, options.width_cell_max);

    debug!(
        rows = rows.len(),
        styled = row_rules.iter().filter(|r| r.is_some()).count(),
        "data sheet styles resolved"
    );

    SpecSheetStyle {
        cells,
        row_rules,
        widths,
    }
}

/// True when an overview cell is a section title, counter label or table header.
pub fn if_overview_label(value: &EnumCellValue) -> bool {
    let Some(c_text) = value.as_str() else {
        return false;
    };
    TUP_OVERVIEW_BOLD_LABELS.contains(&c_text)
        || TUP_OVERVIEW_BOLD_HEADERS.contains(&c_text)
        || TUP_OVERVIEW_BOLD_PREFIXES
            .iter()
            .any(|c_prefix| c_text.starts_with(c_prefix))
}

/// Styles for the overview grid: bold on literal label membership, nothing else.
pub fn resolve_overview_style(
    grid: &[Vec<EnumCellValue>],
    registry: &SpecStyleRegistry,
    options: &SpecReportOptions,
) -> SpecSheetStyle {
    let mut cells: Vec<Vec<SpecCellFormat>> = grid
        .iter()
        .map(|row| {
            row.iter()
                .map(|value| {
                    if if_overview_label(value) {
                        registry.overview_bold.clone()
                    } else {
                        SpecCellFormat::default()
                    }
                })
                .collect()
        })
        .collect();

    apply_global_font(&mut cells, registry);

    SpecSheetStyle {
        cells,
        row_rules: vec![None; grid.len()],
        widths: derive_column_widths(grid, options.width_cell_padding, options.width_cell_max),
    }
}

/// Overwrite font family/size on every cell, keeping bold and color.
fn apply_global_font(cells: &mut [Vec<SpecCellFormat>], registry: &SpecStyleRegistry) {
    for fmt in cells.iter_mut().flatten() {
        *fmt = fmt.merge(&registry.global_font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{
        C_COLOR_DEMAND_R_FILL, C_COLOR_DEMAND_R_FONT, C_COLOR_HEADER_FILL, C_COLOR_IN_STOCK_FILL,
        C_COLOR_PROCUREMENT_E_FILL, C_FONT_NAME, derive_default_style_registry,
    };

    fn derive_header(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_priority_scenario_in_stock_then_demand_then_procurement() {
        let registry = derive_default_style_registry();
        let header = derive_header(&["Status", "DEMAND", "PROCUREMENT_KEY"]);
        let rows = vec![
            vec!["In Stock".into(), "R9".into(), "E".into()],
            vec!["Open".into(), "R100".into(), "E".into()],
            vec![EnumCellValue::None, EnumCellValue::None, "E".into()],
            vec!["Open".into(), "D1".into(), "F".into()],
        ];

        let style = resolve_data_sheet_style(&header, &rows, &registry, &SpecReportOptions::default());
        assert_eq!(
            style.row_rules,
            vec![Some("in_stock"), Some("demand_r"), Some("procurement_e"), None]
        );

        assert_eq!(style.cells.len(), 5);
        assert!(style.cells[0].iter().all(|fmt| fmt.is_bold()
            && fmt.bg_color.as_deref() == Some(C_COLOR_HEADER_FILL)));

        let fmt_in_stock = &style.cells[1][2];
        assert_eq!(fmt_in_stock.bg_color.as_deref(), Some(C_COLOR_IN_STOCK_FILL));
        assert_eq!(fmt_in_stock.font_color, None);

        let fmt_demand = &style.cells[2][0];
        assert_eq!(fmt_demand.bg_color.as_deref(), Some(C_COLOR_DEMAND_R_FILL));
        assert_eq!(fmt_demand.font_color.as_deref(), Some(C_COLOR_DEMAND_R_FONT));
        assert!(!fmt_demand.is_bold());

        assert_eq!(
            style.cells[3][1].bg_color.as_deref(),
            Some(C_COLOR_PROCUREMENT_E_FILL)
        );
        assert_eq!(style.cells[4][0].bg_color, None);

        assert!(style
            .cells
            .iter()
            .flatten()
            .all(|fmt| fmt.font_name.as_deref() == Some(C_FONT_NAME) && fmt.font_size == Some(11)));
    }

    #[test]
    fn test_absent_key_columns_disable_rules() {
        let registry = derive_default_style_registry();
        let header = derive_header(&["PROCUREMENT_KEY"]);
        let rows = vec![vec!["E".into()], vec!["In Stock".into()]];
        let style = resolve_data_sheet_style(&header, &rows, &registry, &SpecReportOptions::default());
        assert_eq!(style.row_rules, vec![Some("procurement_e"), None]);
    }

    #[test]
    fn test_data_sheet_widths_include_header() {
        let registry = derive_default_style_registry();
        let header = derive_header(&["PO", "MATERIAL_DESCRIPTION"]);
        let rows = vec![vec!["4500001234".into(), "x".repeat(60).as_str().into()]];
        let style = resolve_data_sheet_style(&header, &rows, &registry, &SpecReportOptions::default());
        assert_eq!(style.widths, vec![12, 35]);
    }

    #[test]
    fn test_overview_bold_is_literal_membership() {
        let registry = derive_default_style_registry();
        let grid = vec![
            vec!["RELATÓRIO DE PLANEJAMENTO - VISÃO GERAL".into()],
            vec!["Relatório gerado em: 01/01/2026 10:00".into()],
            vec!["TOTAL DE ITENS NO RELATÓRIO:".into(), 3.0.into()],
            vec!["EQUIPMENT".into(), "POCREATED".into(), "TOTAL".into()],
            vec!["EQ1".into(), 1.0.into(), 1.0.into()],
            vec!["ESTATÍSTICAS RÁPIDAS (extra)".into()],
            vec![],
        ];
        let style = resolve_overview_style(&grid, &registry, &SpecReportOptions::default());

        let l_bold: Vec<Vec<bool>> = style
            .cells
            .iter()
            .map(|row| row.iter().map(SpecCellFormat::is_bold).collect())
            .collect();
        assert_eq!(
            l_bold,
            vec![
                vec![true],
                vec![true],
                vec![true, false],
                vec![true, false, true],
                vec![false, false, false],
                vec![false],
                vec![],
            ]
        );
        assert!(style.cells.iter().flatten().all(|fmt| fmt.bg_color.is_none()));
        assert_eq!(style.widths.len(), 3);
    }
}
