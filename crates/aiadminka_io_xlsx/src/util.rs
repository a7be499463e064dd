//! Stateless helpers: sheet names, A1 addresses, header merge planning.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::conf::{
    C_FILE_OUT_EXTENSION, C_FILE_OUT_PREFIX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, SpecHeaderMerge, XlsxIoError};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Output file name `report_<ISO8601 without ':' and '.'>.xlsx`.
pub fn derive_output_file_name(dt_now: DateTime<Utc>) -> String {
    let c_stamp: String = dt_now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .chars()
        .filter(|chr| *chr != ':' && *chr != '.')
        .collect();
    format!("{C_FILE_OUT_PREFIX}{c_stamp}.{C_FILE_OUT_EXTENSION}")
}

/// Text of cell `idx` in `row`; missing cells read as empty.
pub fn derive_cell_text(row: &[EnumCellValue], idx: usize) -> String {
    row.get(idx).map(EnumCellValue::to_text).unwrap_or_default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellAddress

/// Zero-based column index to letters (`0 -> A`, `26 -> AA`).
pub fn derive_column_name(col_idx: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_rest = col_idx + 1;
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Zero-based `(row, col)` to A1 address.
pub fn derive_cell_address(row_idx: usize, col_idx: usize) -> String {
    format!("{}{}", derive_column_name(col_idx), row_idx + 1)
}

/// Zero-based inclusive corners to `"A1:B2"`.
pub fn derive_range_address(
    row_idx_start: usize,
    col_idx_start: usize,
    row_idx_end: usize,
    col_idx_end: usize,
) -> String {
    format!(
        "{}:{}",
        derive_cell_address(row_idx_start, col_idx_start),
        derive_cell_address(row_idx_end, col_idx_end)
    )
}

/// Parse `"B3"` into zero-based `(row, col)`.
pub fn parse_cell_address(address: &str) -> Result<(usize, usize), XlsxIoError> {
    let c_address = address.trim().to_ascii_uppercase();
    let n_split = c_address
        .find(|chr: char| chr.is_ascii_digit())
        .ok_or_else(|| XlsxIoError::InvalidAddress(address.to_string()))?;
    let (c_col, c_row) = c_address.split_at(n_split);

    if c_col.is_empty() || !c_col.chars().all(|chr| chr.is_ascii_uppercase()) {
        return Err(XlsxIoError::InvalidAddress(address.to_string()));
    }
    if !c_row.chars().all(|chr| chr.is_ascii_digit()) {
        return Err(XlsxIoError::InvalidAddress(address.to_string()));
    }

    let n_row = c_row
        .parse::<usize>()
        .map_err(|_| XlsxIoError::InvalidAddress(address.to_string()))?;
    if n_row == 0 || n_row > N_NROWS_EXCEL_MAX {
        return Err(XlsxIoError::InvalidAddress(address.to_string()));
    }

    let mut n_col = 0usize;
    for chr in c_col.chars() {
        n_col = n_col * 26 + (chr as usize - 'A' as usize + 1);
        if n_col > N_NCOLS_EXCEL_MAX {
            return Err(XlsxIoError::InvalidAddress(address.to_string()));
        }
    }

    Ok((n_row - 1, n_col - 1))
}

/// Parse `"A1:B2"` into zero-based `(row_start, col_start, row_end, col_end)`.
pub fn parse_range_address(range: &str) -> Result<(usize, usize, usize, usize), XlsxIoError> {
    let l_parts: Vec<&str> = range.split(':').collect();
    if l_parts.len() != 2 {
        return Err(XlsxIoError::InvalidAddress(range.to_string()));
    }
    let (n_row_start, n_col_start) = parse_cell_address(l_parts[0])?;
    let (n_row_end, n_col_end) = parse_cell_address(l_parts[1])?;
    if n_row_end < n_row_start || n_col_end < n_col_start {
        return Err(XlsxIoError::InvalidAddress(range.to_string()));
    }
    Ok((n_row_start, n_col_start, n_row_end, n_col_end))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderMergeUtils

/// Generate contiguous vertical runs `(col, row_start, row_end, text)`.
fn generate_vertical_runs(header_grid: &[Vec<String>]) -> Vec<(usize, usize, usize, String)> {
    let mut v_run_collection = Vec::new();
    let Some(v_header_row_0) = header_grid.first() else {
        return v_run_collection;
    };

    let n_rows = header_grid.len();
    let n_cols = v_header_row_0.len();

    debug_assert!(
        header_grid.iter().all(|_row| _row.len() == n_cols),
        "All rows must have the same number of columns."
    );

    for _idx_col in 0..n_cols {
        let mut n_row_idx_start = 0;
        while n_row_idx_start < n_rows {
            let c_val_cell_current = &header_grid[n_row_idx_start][_idx_col];
            if c_val_cell_current.is_empty() {
                n_row_idx_start += 1;
                continue;
            }

            let mut n_row_idx_next = n_row_idx_start + 1;
            while n_row_idx_next < n_rows
                && header_grid[n_row_idx_next][_idx_col] == *c_val_cell_current
            {
                n_row_idx_next += 1;
            }

            if n_row_idx_next - n_row_idx_start > 1 {
                v_run_collection.push((
                    _idx_col,
                    n_row_idx_start,
                    n_row_idx_next - 1,
                    c_val_cell_current.clone(),
                ));
            }

            n_row_idx_start = n_row_idx_next;
        }
    }

    v_run_collection
}

/// Plan merges for repeated non-empty header text.
///
/// Vertical runs are taken first; horizontal runs are then collected per row
/// over the cells no vertical run covers.
pub fn plan_header_merges(header_grid: &[Vec<String>]) -> Vec<SpecHeaderMerge> {
    let mut l_merges = Vec::new();
    let mut set_covered: BTreeSet<(usize, usize)> = BTreeSet::new();

    for (col_idx, row_start, row_end, text) in generate_vertical_runs(header_grid) {
        for row_idx in row_start..=row_end {
            set_covered.insert((row_idx, col_idx));
        }
        l_merges.push(SpecHeaderMerge {
            row_idx_start: row_start,
            col_idx_start: col_idx,
            row_idx_end: row_end,
            col_idx_end: col_idx,
            text,
        });
    }

    for (row_idx, v_row) in header_grid.iter().enumerate() {
        let n_cols = v_row.len();
        let mut n_col_idx = 0;

        while n_col_idx < n_cols {
            let c_cell_val = &v_row[n_col_idx];
            if c_cell_val.is_empty() || set_covered.contains(&(row_idx, n_col_idx)) {
                n_col_idx += 1;
                continue;
            }

            let mut n_col_idx_end = n_col_idx + 1;
            while n_col_idx_end < n_cols
                && v_row[n_col_idx_end] == *c_cell_val
                && !set_covered.contains(&(row_idx, n_col_idx_end))
            {
                n_col_idx_end += 1;
            }

            if n_col_idx_end - n_col_idx > 1 {
                l_merges.push(SpecHeaderMerge {
                    row_idx_start: row_idx,
                    col_idx_start: n_col_idx,
                    row_idx_end: row_idx,
                    col_idx_end: n_col_idx_end - 1,
                    text: c_cell_val.clone(),
                });
            }
            n_col_idx = n_col_idx_end;
        }
    }

    l_merges.sort();
    l_merges
}

/// Clear cells covered by a merge, keeping only the anchor text.
pub fn apply_merge_text_blankout(header_grid: &mut [Vec<String>], merges: &[SpecHeaderMerge]) {
    for merge in merges {
        for row_idx in merge.row_idx_start..=merge.row_idx_end {
            for col_idx in merge.col_idx_start..=merge.col_idx_end {
                if (row_idx, col_idx) == (merge.row_idx_start, merge.col_idx_start) {
                    continue;
                }
                if let Some(c_cell) = header_grid
                    .get_mut(row_idx)
                    .and_then(|_row| _row.get_mut(col_idx))
                {
                    c_cell.clear();
                }
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_generate_vertical_runs_detects_only_contiguous_non_empty_runs() {
        let grid = grid(&[
            &["A", "X"],
            &["A", ""],
            &["A", "X"],
            &["", "X"],
            &["B", "X"],
            &["B", "Y"],
        ]);

        assert_eq!(
            generate_vertical_runs(&grid),
            vec![
                (0, 0, 2, "A".to_string()),
                (0, 4, 5, "B".to_string()),
                (1, 2, 4, "X".to_string())
            ]
        );
    }

    #[test]
    fn test_plan_header_merges_vertical_then_horizontal() {
        let grid = grid(&[
            &["Prev", "Cur", "", "Match", "Match"],
            &["Prev", "Cur", "", "Count", "%"],
        ]);

        let l_merges = plan_header_merges(&grid);
        let l_ranges: Vec<String> = l_merges
            .iter()
            .map(|m| {
                derive_range_address(
                    m.row_idx_start,
                    m.col_idx_start,
                    m.row_idx_end,
                    m.col_idx_end,
                )
            })
            .collect();
        assert_eq!(l_ranges, vec!["A1:A2", "B1:B2", "D1:E1"]);
        assert_eq!(l_merges[2].text, "Match");
    }

    #[test]
    fn test_plan_header_merges_horizontal_stops_at_vertical_cover() {
        let grid = grid(&[&["G", "G", "G"], &["a", "b", "G"]]);
        let l_merges = plan_header_merges(&grid);

        assert_eq!(l_merges.len(), 2);
        assert_eq!(
            (l_merges[0].row_idx_start, l_merges[0].col_idx_start, l_merges[0].col_idx_end),
            (0, 0, 1)
        );
        assert_eq!(
            (l_merges[1].row_idx_start, l_merges[1].row_idx_end, l_merges[1].col_idx_start),
            (0, 1, 2)
        );
    }

    #[test]
    fn test_apply_merge_text_blankout() {
        let mut grid = grid(&[&["A", "G", "G"], &["A", "x", "y"]]);
        let l_merges = plan_header_merges(&grid);
        apply_merge_text_blankout(&mut grid, &l_merges);

        assert_eq!(grid[0], vec!["A", "G", ""]);
        assert_eq!(grid[1], vec!["", "x", "y"]);
    }

    #[test]
    fn test_column_names_and_addresses() {
        assert_eq!(derive_column_name(0), "A");
        assert_eq!(derive_column_name(25), "Z");
        assert_eq!(derive_column_name(26), "AA");
        assert_eq!(derive_column_name(27), "AB");
        assert_eq!(derive_column_name(701), "ZZ");
        assert_eq!(derive_column_name(702), "AAA");
        assert_eq!(derive_cell_address(2, 11), "L3");
        assert_eq!(derive_range_address(0, 0, 1, 0), "A1:A2");
    }

    #[test]
    fn test_parse_addresses() {
        assert_eq!(parse_cell_address("A1").unwrap(), (0, 0));
        assert_eq!(parse_cell_address("l3").unwrap(), (2, 11));
        assert_eq!(parse_cell_address("AA10").unwrap(), (9, 26));
        assert_eq!(parse_range_address("E1:F1").unwrap(), (0, 4, 0, 5));

        assert!(parse_cell_address("").is_err());
        assert!(parse_cell_address("A0").is_err());
        assert!(parse_cell_address("11").is_err());
        assert!(parse_cell_address("A1B").is_err());
        assert!(parse_range_address("A1").is_err());
        assert!(parse_range_address("B2:A1").is_err());
    }

    #[test]
    fn test_address_round_trip_for_wide_columns() {
        for col_idx in [0usize, 25, 26, 51, 52, 701, 702, 16_383] {
            let c_address = derive_cell_address(4, col_idx);
            assert_eq!(parse_cell_address(&c_address).unwrap(), (4, col_idx));
        }
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_output_file_name_strips_colons_and_dots() {
        let dt = Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 30).unwrap();
        assert_eq!(
            derive_output_file_name(dt),
            "report_2026-10-19T081530000Z.xlsx"
        );
    }

    #[test]
    fn test_cell_text_reads_missing_as_empty() {
        let row = vec![EnumCellValue::from("a"), EnumCellValue::Number(7.0)];
        assert_eq!(derive_cell_text(&row, 1), "7");
        assert_eq!(derive_cell_text(&row, 5), "");
    }
}
