//! Row aggregation for the three report templates.

use std::collections::{BTreeMap, HashMap};

use aiadminka_io_xlsx::{EnumCellValue, SpecRawSheet, derive_cell_text};

use crate::conf::{
    C_STATUS_OK, C_STATUS_REFUSED, FIELD_PLAYER_ID, FIELD_STATUS_1, FIELD_STATUS_2,
};
use crate::header::{ensure_no_missing, resolve_fields, resolve_required_fields};
use crate::spec::{EnumMatchCountRule, ReportError, SpecActiveUsersMetrics, SpecBtagMetrics};

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn derive_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Trimmed cell text, `None` when blank.
fn derive_key(row: &[EnumCellValue], idx: usize) -> Option<String> {
    let c_text = derive_cell_text(row, idx);
    let c_key = c_text.trim();
    if c_key.is_empty() {
        None
    } else {
        Some(c_key.to_string())
    }
}

fn ensure_has_data(sheet: &SpecRawSheet, dataset: &str) -> Result<(), ReportError> {
    if sheet.is_empty_data() {
        return Err(ReportError::EmptyInput(format!(
            "dataset `{dataset}` has no data rows"
        )));
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// #region ActiveUsers

/// Compare player ids of two periods.
///
/// Headers of both sheets are resolved before any row is read.
pub fn aggregate_active_users(
    sheet_prev: &SpecRawSheet,
    sheet_current: &SpecRawSheet,
    dataset_prev: &str,
    dataset_current: &str,
    rule_match_count: EnumMatchCountRule,
) -> Result<SpecActiveUsersMetrics, ReportError> {
    ensure_has_data(sheet_prev, dataset_prev)?;
    ensure_has_data(sheet_current, dataset_current)?;

    // Both periods are checked first so one error names every miss.
    let mut l_missing = Vec::new();
    resolve_fields(sheet_prev, dataset_prev, &[FIELD_PLAYER_ID], &mut l_missing);
    resolve_fields(sheet_current, dataset_current, &[FIELD_PLAYER_ID], &mut l_missing);
    ensure_no_missing(l_missing)?;
    let idx_prev = resolve_required_fields(sheet_prev, dataset_prev, &[FIELD_PLAYER_ID])?[0];
    let idx_current =
        resolve_required_fields(sheet_current, dataset_current, &[FIELD_PLAYER_ID])?[0];

    let mut dict_prev_counts: HashMap<String, i64> = HashMap::new();
    for row in sheet_prev.data_rows() {
        if let Some(c_id) = derive_key(row, idx_prev) {
            *dict_prev_counts.entry(c_id).or_insert(0) += 1;
        }
    }
    let n_prev: i64 = dict_prev_counts.values().sum();

    let mut n_current = 0i64;
    let mut n_matches = 0i64;
    for row in sheet_current.data_rows() {
        let Some(c_id) = derive_key(row, idx_current) else {
            continue;
        };
        n_current += 1;
        if let Some(n_prev_occurrences) = dict_prev_counts.get(&c_id) {
            n_matches += match rule_match_count {
                EnumMatchCountRule::PreviousOccurrences => *n_prev_occurrences,
                EnumMatchCountRule::CurrentRows => 1,
            };
        }
    }

    let n_new = n_current - n_matches;
    let n_churn = n_prev - n_matches;

    let metrics = SpecActiveUsersMetrics {
        count_prev: n_prev,
        count_current: n_current,
        count_matches: n_matches,
        count_new: n_new,
        count_churn: n_churn,
        ratio_growth: derive_ratio((n_current - n_prev) as f64, n_prev as f64),
        ratio_match: derive_ratio(n_matches as f64, n_current as f64),
        ratio_new: derive_ratio(n_new as f64, n_current as f64),
        ratio_churn: derive_ratio(n_churn as f64, n_prev as f64),
        n_rows_scanned: sheet_prev.height_data() + sheet_current.height_data(),
    };
    tracing::debug!(?metrics, rule = rule_match_count.as_str(), "active users aggregated");
    Ok(metrics)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Btag

/// Tally ОК/Отказ statuses and their transitions.
pub fn aggregate_btag(sheet: &SpecRawSheet, dataset: &str) -> Result<SpecBtagMetrics, ReportError> {
    ensure_has_data(sheet, dataset)?;
    let l_idx = resolve_required_fields(
        sheet,
        dataset,
        &[FIELD_PLAYER_ID, FIELD_STATUS_1, FIELD_STATUS_2],
    )?;
    let (idx_id, idx_status_1, idx_status_2) = (l_idx[0], l_idx[1], l_idx[2]);

    let mut metrics = SpecBtagMetrics {
        n_rows_scanned: sheet.height_data(),
        ..Default::default()
    };

    for row in sheet.data_rows() {
        if derive_key(row, idx_id).is_none() {
            continue;
        }
        metrics.value_count += 1;

        let c_status_1 = derive_cell_text(row, idx_status_1);
        let c_status_2 = derive_cell_text(row, idx_status_2);
        match (c_status_1.trim(), c_status_2.trim()) {
            (C_STATUS_OK, C_STATUS_OK) => metrics.ok_ok_count += 1,
            (C_STATUS_OK, C_STATUS_REFUSED) => metrics.ok_refused_count += 1,
            (C_STATUS_REFUSED, C_STATUS_OK) => metrics.refused_ok_count += 1,
            (C_STATUS_REFUSED, C_STATUS_REFUSED) => metrics.refused_refused_count += 1,
            _ => {}
        }
        match c_status_1.trim() {
            C_STATUS_OK => metrics.ok_count += 1,
            C_STATUS_REFUSED => metrics.refused_count += 1,
            _ => {}
        }
    }

    metrics.ratio_ok = derive_ratio(metrics.ok_count as f64, metrics.value_count as f64);
    metrics.ratio_refused = derive_ratio(metrics.refused_count as f64, metrics.value_count as f64);
    metrics.ratio_ok_refused =
        derive_ratio(metrics.ok_refused_count as f64, metrics.ok_count as f64);
    metrics.ratio_refused_ok =
        derive_ratio(metrics.refused_ok_count as f64, metrics.refused_count as f64);

    tracing::debug!(?metrics, "b-tag aggregated");
    Ok(metrics)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeFiles

/// Concatenate sheets over the union of their headers.
///
/// Union columns keep first-appearance order; blank header cells are not
/// columns. Within one sheet the first occurrence of a header wins.
pub fn aggregate_merge_files(sheets: &[SpecRawSheet]) -> Result<SpecRawSheet, ReportError> {
    if sheets.is_empty() {
        return Err(ReportError::EmptyInput("no sheet to merge".to_string()));
    }
    if sheets.iter().all(SpecRawSheet::is_empty_data) {
        return Err(ReportError::EmptyInput(
            "none of the sheets has a data row".to_string(),
        ));
    }

    let mut l_headers_union: Vec<String> = Vec::new();
    let mut dict_union_idx: HashMap<String, usize> = HashMap::new();
    let mut l_maps_by_sheet: Vec<BTreeMap<usize, usize>> = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        // union column -> source column
        let mut dict_src_by_union: BTreeMap<usize, usize> = BTreeMap::new();
        for (idx_src, cell) in sheet.header().iter().enumerate() {
            let c_header = cell.to_text();
            if c_header.trim().is_empty() {
                continue;
            }
            let idx_union = *dict_union_idx.entry(c_header.clone()).or_insert_with(|| {
                l_headers_union.push(c_header);
                l_headers_union.len() - 1
            });
            dict_src_by_union.entry(idx_union).or_insert(idx_src);
        }
        l_maps_by_sheet.push(dict_src_by_union);
    }

    let n_width = l_headers_union.len();
    let n_rows_total: usize = sheets.iter().map(SpecRawSheet::height_data).sum();
    let mut l_rows: Vec<Vec<EnumCellValue>> = Vec::with_capacity(n_rows_total + 1);
    l_rows.push(
        l_headers_union
            .into_iter()
            .map(EnumCellValue::String)
            .collect(),
    );

    for (sheet, dict_src_by_union) in sheets.iter().zip(&l_maps_by_sheet) {
        for row in sheet.data_rows() {
            let mut v_row = vec![EnumCellValue::String(String::new()); n_width];
            for (idx_union, idx_src) in dict_src_by_union {
                match row.get(*idx_src) {
                    Some(EnumCellValue::None) | None => {}
                    Some(value) => v_row[*idx_union] = value.clone(),
                }
            }
            l_rows.push(v_row);
        }
    }

    tracing::debug!(
        sheets = sheets.len(),
        columns = n_width,
        rows = n_rows_total,
        "files merged"
    );
    Ok(SpecRawSheet::new(l_rows))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> SpecRawSheet {
        SpecRawSheet::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|v| {
                            if v.is_empty() {
                                EnumCellValue::None
                            } else {
                                EnumCellValue::from(*v)
                            }
                        })
                        .collect()
                })
                .collect(),
        )
    }

    fn ids(header: &str, values: &[&str]) -> SpecRawSheet {
        let mut rows: Vec<&[&str]> = Vec::new();
        let header_row = [header];
        rows.push(&header_row);
        let l_value_rows: Vec<[&str; 1]> = values.iter().map(|v| [*v]).collect();
        for row in &l_value_rows {
            rows.push(row);
        }
        sheet(&rows)
    }

    #[test]
    fn active_users_current_rows_rule_matches_worked_example() {
        let prev = ids("ID игрока", &["A", "A", "B"]);
        let current = ids(" id игрока ", &["A", "B", "B", "C"]);

        let metrics =
            aggregate_active_users(&prev, &current, "prev", "cur", EnumMatchCountRule::CurrentRows)
                .unwrap();
        assert_eq!(metrics.count_prev, 3);
        assert_eq!(metrics.count_current, 4);
        assert_eq!(metrics.count_matches, 3);
        assert_eq!(metrics.count_new, 1);
        assert_eq!(metrics.count_churn, 0);
        assert!((metrics.ratio_growth - 1.0 / 3.0).abs() < 1e-12);
        assert!((metrics.ratio_match - 0.75).abs() < 1e-12);
        assert!((metrics.ratio_new - 0.25).abs() < 1e-12);
        assert_eq!(metrics.ratio_churn, 0.0);
        assert_eq!(metrics.n_rows_scanned, 7);
    }

    #[test]
    fn active_users_previous_occurrences_rule_inflates_matches() {
        // Duplicated previous ids add their full count per matched current
        // row, so churn goes negative here.
        let prev = ids("ID игрока", &["A", "A", "B"]);
        let current = ids("ID игрока", &["A", "B", "B", "C"]);

        let metrics = aggregate_active_users(
            &prev,
            &current,
            "prev",
            "cur",
            EnumMatchCountRule::PreviousOccurrences,
        )
        .unwrap();
        assert_eq!(metrics.count_matches, 4);
        assert_eq!(metrics.count_new, 0);
        assert_eq!(metrics.count_churn, -1);
        assert!((metrics.ratio_churn + 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn active_users_skips_blank_ids_and_matches_numeric_ids_as_text() {
        let prev = SpecRawSheet::new(vec![
            vec!["ID".into()],
            vec![EnumCellValue::Number(123.0)],
            vec![EnumCellValue::None],
        ]);
        let current = SpecRawSheet::new(vec![
            vec!["ID".into()],
            vec!["123".into()],
            vec!["   ".into()],
        ]);

        let metrics = aggregate_active_users(
            &prev,
            &current,
            "prev",
            "cur",
            EnumMatchCountRule::default(),
        )
        .unwrap();
        assert_eq!(metrics.count_prev, 1);
        assert_eq!(metrics.count_current, 1);
        assert_eq!(metrics.count_matches, 1);
        assert_eq!(metrics.n_rows_scanned, 4);
    }

    #[test]
    fn active_users_missing_column_in_both_periods_is_one_error() {
        let prev = ids("Игрок", &["A"]);
        let current = ids("Логин", &["A"]);

        let err =
            aggregate_active_users(&prev, &current, "prev", "cur", EnumMatchCountRule::default())
                .unwrap_err();
        let ReportError::MissingColumn(l_missing) = err else {
            panic!("expected MissingColumn");
        };
        assert_eq!(l_missing.len(), 2);
        assert_eq!(l_missing[0].dataset, "prev");
        assert_eq!(l_missing[1].dataset, "cur");
    }

    #[test]
    fn active_users_missing_column_in_one_period_names_it_with_synonyms() {
        let prev = ids("ID игрока", &["A"]);
        let current = ids("Логин", &["A"]);

        let err =
            aggregate_active_users(&prev, &current, "prev", "cur", EnumMatchCountRule::default())
                .unwrap_err();
        let ReportError::MissingColumn(l_missing) = &err else {
            panic!("expected MissingColumn");
        };
        assert_eq!(l_missing.len(), 1);
        assert_eq!(l_missing[0].dataset, "cur");
        assert_eq!(l_missing[0].field, "playerId");
        assert!(l_missing[0].synonyms.iter().any(|s| s == "ID игрока"));
        assert!(err.to_string().contains("`playerId` in cur"));
    }

    #[test]
    fn active_users_empty_period_is_empty_input() {
        let prev = ids("ID", &[]);
        let current = ids("ID", &["A"]);
        assert!(matches!(
            aggregate_active_users(&prev, &current, "prev", "cur", EnumMatchCountRule::default()),
            Err(ReportError::EmptyInput(_))
        ));
    }

    #[test]
    fn btag_tallies_worked_example() {
        let data = sheet(&[
            &["ID игрока", "Статус 1", "Статус 2"],
            &["1", "ОК", "ОК"],
            &["2", "ОК", "Отказ"],
            &["3", "Отказ", "Отказ"],
            &["4", "Отказ", "ОК"],
            &["5", " ОК ", "ОК"],
        ]);

        let metrics = aggregate_btag(&data, "B-TAG").unwrap();
        assert_eq!(metrics.value_count, 5);
        assert_eq!(metrics.ok_count, 3);
        assert_eq!(metrics.refused_count, 2);
        assert_eq!(metrics.ok_refused_count, 1);
        assert_eq!(metrics.refused_ok_count, 1);
        assert_eq!(metrics.ok_ok_count, 2);
        assert_eq!(metrics.refused_refused_count, 1);
        assert!((metrics.ratio_ok - 0.6).abs() < 1e-12);
        assert!((metrics.ratio_refused - 0.4).abs() < 1e-12);
        assert!((metrics.ratio_ok_refused - 1.0 / 3.0).abs() < 1e-12);
        assert!((metrics.ratio_refused_ok - 0.5).abs() < 1e-12);
    }

    #[test]
    fn btag_rows_without_id_are_ignored_and_ratios_guard_zero() {
        let data = sheet(&[
            &["ID", "Статус 1", "Статус 2"],
            &["", "ОК", "ОК"],
            &["7", "Ждет", ""],
        ]);

        let metrics = aggregate_btag(&data, "B-TAG").unwrap();
        assert_eq!(metrics.value_count, 1);
        assert_eq!(metrics.ok_count, 0);
        assert_eq!(metrics.ratio_ok, 0.0);
        assert_eq!(metrics.ratio_ok_refused, 0.0);
        assert_eq!(metrics.ratio_refused_ok, 0.0);
        assert_eq!(metrics.n_rows_scanned, 2);
    }

    #[test]
    fn btag_missing_status_column_fails_before_scanning() {
        let data = sheet(&[&["ID", "Статус 1"], &["1", "ОК"]]);
        let err = aggregate_btag(&data, "B-TAG").unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(ref l) if l.len() == 1));
    }

    #[test]
    fn merge_files_unions_headers_in_first_appearance_order() {
        let sheet_a = sheet(&[&["X", "Y"], &["x1", "y0"]]);
        let sheet_b = sheet(&[&["Y", "Z"], &["y1", "z1"]]);

        let merged = aggregate_merge_files(&[sheet_a, sheet_b]).unwrap();
        let l_header: Vec<String> = merged.header().iter().map(|c| c.to_text()).collect();
        assert_eq!(l_header, vec!["X", "Y", "Z"]);

        let l_row_b: Vec<String> = merged.data_rows()[1].iter().map(|c| c.to_text()).collect();
        assert_eq!(l_row_b, vec!["", "y1", "z1"]);
        let l_row_a: Vec<String> = merged.data_rows()[0].iter().map(|c| c.to_text()).collect();
        assert_eq!(l_row_a, vec!["x1", "y0", ""]);
    }

    #[test]
    fn merge_files_same_file_twice_doubles_rows() {
        let data = sheet(&[&["X", "Y"], &["1", "2"], &["3", ""]]);
        let merged = aggregate_merge_files(&[data.clone(), data.clone()]).unwrap();

        assert_eq!(merged.header(), data.header());
        assert_eq!(merged.height_data(), 2 * data.height_data());
        assert_eq!(merged.data_rows()[3][1], EnumCellValue::String(String::new()));
    }

    #[test]
    fn merge_files_first_duplicate_header_wins_within_sheet() {
        let data = sheet(&[&["X", "X", ""], &["first", "second", "orphan"]]);
        let merged = aggregate_merge_files(&[data]).unwrap();

        assert_eq!(merged.header().len(), 1);
        assert_eq!(merged.data_rows()[0][0].to_text(), "first");
    }

    #[test]
    fn merge_files_needs_some_data() {
        assert!(matches!(
            aggregate_merge_files(&[]),
            Err(ReportError::EmptyInput(_))
        ));
        let header_only = sheet(&[&["X"]]);
        assert!(matches!(
            aggregate_merge_files(&[header_only]),
            Err(ReportError::EmptyInput(_))
        ));
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero() {
        assert_eq!(derive_ratio(5.0, 0.0), 0.0);
        assert_eq!(derive_ratio(0.0, 0.0), 0.0);
        assert_eq!(derive_ratio(1.0, 4.0), 0.25);
    }
}
