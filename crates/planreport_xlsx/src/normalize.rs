//! Schema normalization: canonical date text and ordering-key sort.

use tracing::{debug, warn};

use crate::conf::{C_COL_COUNTER, C_DATE_FORMAT_CANONICAL, TUP_DATE_COLUMNS};
use crate::spec::{EnumCellValue, SpecDataset};
use crate::util::{coerce_numeric, compare_missing_last, parse_date_permissive};

/// Normalize a raw dataset; row count and column set are preserved.
pub fn normalize_dataset(mut dataset: SpecDataset) -> SpecDataset {
    normalize_date_columns(&mut dataset);
    sort_by_ordering_key(&mut dataset, C_COL_COUNTER);
    dataset
}

/// Rewrite every known date column present as `DD/MM/YYYY` text.
///
/// Unparsable values become missing, not the original text.
pub fn normalize_date_columns(dataset: &mut SpecDataset) {
    for c_col in TUP_DATE_COLUMNS {
        let Some(n_idx_col) = dataset.column_index(c_col) else {
            continue;
        };

        let mut n_unparsed = 0usize;
        for row in dataset.rows_mut().iter_mut() {
            let value = &mut row[n_idx_col];
            let value_new = match parse_date_permissive(value) {
                Some(dt) => {
                    EnumCellValue::String(dt.format(C_DATE_FORMAT_CANONICAL).to_string())
                }
                None => {
                    if !value.is_missing() {
                        n_unparsed += 1;
                    }
                    EnumCellValue::None
                }
            };
            *value = value_new;
        }

        if n_unparsed > 0 {
            warn!(column = c_col, count = n_unparsed, "unparsable dates set to missing");
        } else {
            debug!(column = c_col, "date column normalized");
        }
    }
}

/// Coerce `column` to numbers and stable-sort rows ascending, missing last.
///
/// No-op when the column is absent.
pub fn sort_by_ordering_key(dataset: &mut SpecDataset, column: &str) {
    let Some(n_idx_col) = dataset.column_index(column) else {
        debug!(column, "ordering key absent; keeping input order");
        return;
    };

    let rows = dataset.rows_mut();
    for row in rows.iter_mut() {
        row[n_idx_col] = match coerce_numeric(&row[n_idx_col]) {
            Some(n) => EnumCellValue::Number(n),
            None => EnumCellValue::None,
        };
    }

    rows.sort_by(|a, b| {
        compare_missing_last(coerce_numeric(&a[n_idx_col]), coerce_numeric(&b[n_idx_col]))
    });
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn derive_dataset(columns: &[&str], rows: Vec<Vec<EnumCellValue>>) -> SpecDataset {
        SpecDataset::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_dates_become_canonical_text_and_failures_missing() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 9)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let dataset = normalize_dataset(derive_dataset(
            &["OPENING_DATE", "Other"],
            vec![
                vec![EnumCellValue::DateTime(dt), "2024-02-09".into()],
                vec!["2024-12-31".into(), "x".into()],
                vec!["garbage".into(), "y".into()],
                vec![EnumCellValue::None, "z".into()],
            ],
        ));

        let l_dates: Vec<EnumCellValue> =
            dataset.rows().iter().map(|row| row[0].clone()).collect();
        assert_eq!(
            l_dates,
            vec![
                EnumCellValue::text("09/02/2024"),
                EnumCellValue::text("31/12/2024"),
                EnumCellValue::None,
                EnumCellValue::None,
            ]
        );
        // Columns outside the date list are untouched.
        assert_eq!(dataset.rows()[0][1], EnumCellValue::text("2024-02-09"));
    }

    #[test]
    fn test_counter_sort_is_stable_with_missing_last() {
        let dataset = normalize_dataset(derive_dataset(
            &["Counter", "id"],
            vec![
                vec!["3".into(), "a".into()],
                vec!["n/a".into(), "b".into()],
                vec![1.0.into(), "c".into()],
                vec![3.0.into(), "d".into()],
                vec![EnumCellValue::None, "e".into()],
                vec!["2".into(), "f".into()],
            ],
        ));

        let l_ids: Vec<String> = dataset.rows().iter().map(|row| row[1].to_text()).collect();
        assert_eq!(l_ids, vec!["c", "f", "a", "d", "b", "e"]);
        assert_eq!(dataset.rows()[0][0], EnumCellValue::Number(1.0));
        assert_eq!(dataset.rows()[4][0], EnumCellValue::None);
    }

    #[test]
    fn test_missing_columns_are_tolerated() {
        let raw = derive_dataset(&["id"], vec![vec!["b".into()], vec!["a".into()]]);
        let dataset = normalize_dataset(raw.clone());
        assert_eq!(dataset, raw);
    }
}
