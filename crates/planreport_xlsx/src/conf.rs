//! Report constants and default preset factories.

use std::sync::LazyLock;

use crate::spec::{
    EnumRowPredicate, EnumViewKind, SpecCellFormat, SpecReportOptions, SpecStyleRegistry,
    SpecStyleRule, SpecViewDefinition,
};

////////////////////////////////////////////////////////////////////////////////
// #region SheetLayout

/// Overview sheet name (always first in the workbook).
pub const C_SHEET_OVERVIEW: &str = "Overview";
/// Full dataset sheet name.
pub const C_SHEET_FULL_REPORT: &str = "FullReport";
/// Purchase-requisition sheet name.
pub const C_SHEET_RM: &str = "RM";
/// Purchase-order sheet name.
pub const C_SHEET_PO: &str = "PO";
/// In-stock sheet name.
pub const C_SHEET_STOCK: &str = "Stock";

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;

/// Number format used for date-time cells that reach the sink unformatted.
pub const C_NUM_FORMAT_DATETIME: &str = "yyyy-mm-dd hh:mm:ss";

/// Date prefix format of the default output file name.
pub const C_OUTPUT_DATE_FORMAT: &str = "%Y%m%d";
/// Suffix of the default output file name.
pub const C_OUTPUT_NAME_SUFFIX: &str = " - Rotina de planejamento.xlsx";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region InputColumns

/// Columns holding dates that are rewritten as `DD/MM/YYYY` text.
pub const TUP_DATE_COLUMNS: [&str; 9] = [
    "Data de necessidade",
    "Sup Date or Log Date",
    "OPENING_DATE",
    "Opening_Calculada",
    "PURCHASING_DOC_DATE",
    "DELIVERY_DATE",
    "SUPPLY_DATE",
    "REQUIRED_DATE",
    "Data_Atual",
];

/// Canonical date text format written by normalization.
pub const C_DATE_FORMAT_CANONICAL: &str = "%d/%m/%Y";
/// Overview timestamp format.
pub const C_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

pub const C_COL_COUNTER: &str = "Counter";
pub const C_COL_STATUS: &str = "Status";
pub const C_COL_STATUS_STYPE: &str = "STATUS_STYPE";
pub const C_COL_EQUIPMENT: &str = "Equipment";
pub const C_COL_DEMAND: &str = "DEMAND";
pub const C_COL_PROCUREMENT_KEY: &str = "PROCUREMENT_KEY";
pub const C_COL_MATERIAL_NO: &str = "MATERIAL_NO";
pub const C_COL_MATERIAL_DESCRIPTION: &str = "MATERIAL_DESCRIPTION";
pub const C_COL_FLOAT_TODAY_OPENING: &str = "Float(Today-Opening)";
pub const C_COL_OPENING_DATE: &str = "OPENING_DATE";

pub const C_TAG_IN_STOCK: &str = "In Stock";
pub const C_TAG_PUR_REQUIST: &str = "PurRequist";
pub const C_TAG_PO_CONFIRM: &str = "POConfirm";
pub const C_TAG_PO_CREATED: &str = "POCreated";
pub const C_TAG_PROCUREMENT_E: &str = "E";
pub const C_PREFIX_DEMAND_R: &str = "R";

/// Projection kept on the `RM` sheet, in output order.
pub const TUP_COLUMNS_RM: [&str; 25] = [
    "RESPONSIBLE",
    "Escopo",
    "Equipment",
    "Prazo",
    "Status",
    "XP_STATUS",
    "MATERIAL_NO",
    "MATERIAL_DESCRIPTION",
    "STATUS_STYPE",
    "PRREQRELSTAT",
    "PO",
    "DOC PGR",
    "BUYER_NAME",
    "OPENING_DATE",
    "Float(Today-Opening)",
    "DELIVERY_DATE",
    "SUPPLY_DATE",
    "REQUIRED_DATE",
    "FLOAT",
    "PLANNED_DELIVERY_TIME_MM",
    "IN_HOUSE_PROD_TIME",
    "GRP_TIME_MM",
    "WBS",
    "EXCEPTION_MESSAGE",
    "Comentários SAP Planner",
];

/// Projection kept on the `PO` sheet, in output order.
pub const TUP_COLUMNS_PO: [&str; 21] = [
    "RESPONSIBLE",
    "Escopo",
    "Equipment",
    "Prazo",
    "Status",
    "XP_STATUS",
    "MATERIAL_NO",
    "MATERIAL_DESCRIPTION",
    "STATUS_STYPE",
    "PO",
    "DOC PGR",
    "BUYER_NAME",
    "DELIVERY_DATE",
    "SUPPLY_DATE",
    "REQUIRED_DATE",
    "FLOAT",
    "VENDOR_NAME",
    "WBS",
    "EXCEPTION_MESSAGE",
    "Comentários SAP Planner",
    "Comentario LogPlan",
];

/// Projection kept on the `Stock` sheet, in output order.
pub const TUP_COLUMNS_STOCK: [&str; 21] = [
    "RESPONSIBLE",
    "Equipment",
    "Prazo",
    "Status",
    "XP_STATUS",
    "DEMAND",
    "MATERIAL_NO",
    "MATERIAL_DESCRIPTION",
    "STATUS_STYPE",
    "PO",
    "REQUIRED_DATE",
    "WBS",
    "EXCEPTION_MESSAGE",
    "QN_NUMBER",
    "QN_COORDINATOR",
    "TYPE_310_",
    "TYPE_321_",
    "TYPE_999_",
    "ECN1",
    "ABRG_",
    "Comentários SAP Planner",
];

/// Filtered view definitions, in workbook order.
pub const TUP_VIEW_DEFINITIONS: [SpecViewDefinition; 3] = [
    SpecViewDefinition {
        kind: EnumViewKind::Rm,
        predicate_column: C_COL_STATUS_STYPE,
        predicate_tags: &[C_TAG_PUR_REQUIST],
        columns: &TUP_COLUMNS_RM,
    },
    SpecViewDefinition {
        kind: EnumViewKind::Po,
        predicate_column: C_COL_STATUS_STYPE,
        predicate_tags: &[C_TAG_PO_CONFIRM, C_TAG_PO_CREATED],
        columns: &TUP_COLUMNS_PO,
    },
    SpecViewDefinition {
        kind: EnumViewKind::Stock,
        predicate_column: C_COL_STATUS,
        predicate_tags: &[C_TAG_IN_STOCK],
        columns: &TUP_COLUMNS_STOCK,
    },
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OverviewLabels

pub const C_LABEL_TITLE: &str = "RELATÓRIO DE PLANEJAMENTO - VISÃO GERAL";
pub const C_LABEL_GENERATED_AT: &str = "Relatório gerado em:";
pub const C_LABEL_QUICK_STATS: &str = "ESTATÍSTICAS RÁPIDAS";
pub const C_LABEL_TOTAL_ITEMS: &str = "TOTAL DE ITENS NO RELATÓRIO:";
pub const C_LABEL_IN_STOCK: &str = "ITENS EM ESTOQUE (IN STOCK):";
pub const C_LABEL_PUR_REQUIST: &str = "REQUISIÇÕES DE COMPRA (PURREQUIST):";
pub const C_LABEL_PO_CONFIRM: &str = "ORDENS CONFIRMADAS (POCONFIRM):";
pub const C_LABEL_PO_CREATED: &str = "ORDENS CRIADAS (POCREATED):";
pub const C_LABEL_CROSSTAB: &str = "CONTAGEM CRUZADA - STATUS_STYPE POR EQUIPAMENTO";
pub const C_LABEL_DELAYED: &str = "ITENS COM ATRASO - TOP 15";
pub const C_LABEL_ASSEMBLY: &str = "ITENS DE MONTAGEM (E) - PRÓXIMOS 3 MESES";

pub const C_HEADER_EQUIPMENT: &str = "EQUIPMENT";
pub const C_HEADER_TOTAL: &str = "TOTAL";
pub const C_HEADER_MATERIAL_NO: &str = "MATERIAL_NO";
pub const C_HEADER_MATERIAL_DESCRIPTION: &str = "MATERIAL_DESCRIPTION";
pub const C_HEADER_FLOAT_TODAY_OPENING: &str = "FLOAT(TODAY-OPENING)";
pub const C_HEADER_OPENING_DATE: &str = "OPENING_DATE";

pub const C_NOTICE_DELAY_COLUMNS_MISSING: &str =
    "COLUNAS NECESSÁRIAS PARA ANÁLISE DE ATRASO NÃO ENCONTRADAS";
pub const C_NOTICE_ASSEMBLY_COLUMNS_MISSING: &str =
    "COLUNAS NECESSÁRIAS PARA ANÁLISE DE MONTAGEM NÃO ENCONTRADAS";
pub const C_NOTICE_NO_ASSEMBLY_ITEMS: &str =
    "NÃO HÁ ITENS DE MONTAGEM (PROCUREMENT_KEY = 'E') NO ARQUIVO";
pub const C_NOTICE_NO_ASSEMBLY_IN_WINDOW: &str =
    "NÃO HÁ MONTAGENS PREVISTAS PARA O PERÍODO DE 90 DIAS";

/// Overview labels rendered bold on exact match.
pub const TUP_OVERVIEW_BOLD_LABELS: [&str; 10] = [
    C_LABEL_TITLE,
    C_LABEL_QUICK_STATS,
    C_LABEL_CROSSTAB,
    C_LABEL_DELAYED,
    C_LABEL_ASSEMBLY,
    C_LABEL_TOTAL_ITEMS,
    C_LABEL_IN_STOCK,
    C_LABEL_PUR_REQUIST,
    C_LABEL_PO_CONFIRM,
    C_LABEL_PO_CREATED,
];

/// Overview table headers rendered bold on exact match.
pub const TUP_OVERVIEW_BOLD_HEADERS: [&str; 6] = [
    C_HEADER_EQUIPMENT,
    C_HEADER_MATERIAL_NO,
    C_HEADER_MATERIAL_DESCRIPTION,
    C_HEADER_FLOAT_TODAY_OPENING,
    C_HEADER_OPENING_DATE,
    C_HEADER_TOTAL,
];

/// Overview prefixes rendered bold (lines embedding run-time values).
pub const TUP_OVERVIEW_BOLD_PREFIXES: [&str; 1] = [C_LABEL_GENERATED_AT];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Colors

pub const C_FONT_NAME: &str = "Aptos Narrow";
pub const N_FONT_SIZE: i64 = 11;

pub const C_COLOR_HEADER_FILL: &str = "#8F8D8D";
pub const C_COLOR_HEADER_FONT: &str = "#000000";
pub const C_COLOR_IN_STOCK_FILL: &str = "#38F58A";
pub const C_COLOR_DEMAND_R_FILL: &str = "#061569";
pub const C_COLOR_DEMAND_R_FONT: &str = "#FFFFFF";
pub const C_COLOR_PROCUREMENT_E_FILL: &str = "#4AAFBD";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Presets

static STYLE_REGISTRY: LazyLock<SpecStyleRegistry> = LazyLock::new(derive_default_style_registry);

/// Process-wide read-only style registry.
pub fn style_registry() -> &'static SpecStyleRegistry {
    &STYLE_REGISTRY
}

/// Build the default style registry: header/global fonts plus ranked row rules.
pub fn derive_default_style_registry() -> SpecStyleRegistry {
    let cfg_global_font = SpecCellFormat {
        font_name: Some(C_FONT_NAME.to_string()),
        font_size: Some(N_FONT_SIZE),
        ..Default::default()
    };

    let fmt_header = cfg_global_font.with_(SpecCellFormat {
        bold: Some(true),
        bg_color: Some(C_COLOR_HEADER_FILL.to_string()),
        font_color: Some(C_COLOR_HEADER_FONT.to_string()),
        ..Default::default()
    });

    let fmt_overview_bold = cfg_global_font.with_(SpecCellFormat {
        bold: Some(true),
        ..Default::default()
    });

    let mut l_row_rules = vec![
        SpecStyleRule {
            name: "procurement_e",
            rank: 3,
            predicate: EnumRowPredicate::TextEquals {
                column: C_COL_PROCUREMENT_KEY,
                value: C_TAG_PROCUREMENT_E,
            },
            format: SpecCellFormat {
                bg_color: Some(C_COLOR_PROCUREMENT_E_FILL.to_string()),
                ..Default::default()
            },
        },
        SpecStyleRule {
            name: "in_stock",
            rank: 1,
            predicate: EnumRowPredicate::TextEquals {
                column: C_COL_STATUS,
                value: C_TAG_IN_STOCK,
            },
            format: SpecCellFormat {
                bg_color: Some(C_COLOR_IN_STOCK_FILL.to_string()),
                ..Default::default()
            },
        },
        SpecStyleRule {
            name: "demand_r",
            rank: 2,
            predicate: EnumRowPredicate::TextStartsWith {
                column: C_COL_DEMAND,
                prefix: C_PREFIX_DEMAND_R,
            },
            format: SpecCellFormat {
                bg_color: Some(C_COLOR_DEMAND_R_FILL.to_string()),
                font_color: Some(C_COLOR_DEMAND_R_FONT.to_string()),
                ..Default::default()
            },
        },
    ];
    l_row_rules.sort_by_key(|rule| rule.rank);

    SpecStyleRegistry {
        global_font: cfg_global_font,
        header: fmt_header,
        overview_bold: fmt_overview_bold,
        row_rules: l_row_rules,
    }
}

/// Build default report options.
pub fn derive_default_report_options() -> SpecReportOptions {
    SpecReportOptions::default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
