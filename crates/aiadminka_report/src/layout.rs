//! Declarative sheet layouts for the metric templates.

use aiadminka_io_xlsx::conf::{N_HEIGHT_HEADER_ROW, N_WIDTH_SEPARATOR};
use aiadminka_io_xlsx::{
    EnumCellValue, EnumFmtKey, SpecSheetLayout, apply_merge_text_blankout, derive_cell_address,
    derive_range_address, derive_report_format, plan_header_merges,
};

use crate::conf::{C_HEADER_COUNT, C_HEADER_PERCENT, N_WIDTH_DATA, N_WIDTH_SUB};
use crate::spec::{SpecActiveUsersMetrics, SpecBtagMetrics};

/// Kind of a layout column; drives its data style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColumnKind {
    /// Count rendered as an integer.
    Integer,
    /// Ratio rendered as `0.00%`.
    Percent,
    /// Narrow filled spacer.
    Separator,
}

/// One column of a two-row header band plus its data value.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnPlan {
    /// Header text on row 1.
    pub header_top: String,
    /// Header text on row 2; equal to `header_top` for single-level headers.
    pub header_bottom: String,
    /// Column kind.
    pub kind: EnumColumnKind,
    /// Column width.
    pub width: f64,
    /// Data row value.
    pub value: EnumCellValue,
}

impl SpecColumnPlan {
    /// Single-level column spanning both header rows.
    pub fn single(header: &str, kind: EnumColumnKind, value: EnumCellValue) -> Self {
        Self {
            header_top: header.to_string(),
            header_bottom: header.to_string(),
            kind,
            width: N_WIDTH_DATA,
            value,
        }
    }

    /// Spacer column.
    pub fn separator() -> Self {
        Self {
            header_top: String::new(),
            header_bottom: String::new(),
            kind: EnumColumnKind::Separator,
            width: N_WIDTH_SEPARATOR,
            value: EnumCellValue::None,
        }
    }

    /// Count and percent sub-columns under one group header.
    pub fn group(header: &str, count: f64, ratio: f64) -> [Self; 2] {
        [
            Self {
                header_top: header.to_string(),
                header_bottom: C_HEADER_COUNT.to_string(),
                kind: EnumColumnKind::Integer,
                width: N_WIDTH_SUB,
                value: EnumCellValue::Number(count),
            },
            Self {
                header_top: header.to_string(),
                header_bottom: C_HEADER_PERCENT.to_string(),
                kind: EnumColumnKind::Percent,
                width: N_WIDTH_SUB,
                value: EnumCellValue::Number(ratio),
            },
        ]
    }
}

/// Build a header band (rows 1-2) plus one data row (row 3).
///
/// Repeated header text is merged; separators are filled on every row.
pub fn build_sheet_layout(l_cols: &[SpecColumnPlan]) -> SpecSheetLayout {
    let mut l_header_grid: Vec<Vec<String>> = vec![
        l_cols.iter().map(|c| c.header_top.clone()).collect(),
        l_cols.iter().map(|c| c.header_bottom.clone()).collect(),
    ];
    let l_merges = plan_header_merges(&l_header_grid);
    apply_merge_text_blankout(&mut l_header_grid, &l_merges);

    let mut layout = SpecSheetLayout {
        column_widths: l_cols.iter().map(|c| c.width).collect(),
        ..Default::default()
    };

    for v_header_row in &l_header_grid {
        layout.rows.push(
            v_header_row
                .iter()
                .map(|text| {
                    if text.is_empty() {
                        EnumCellValue::None
                    } else {
                        EnumCellValue::String(text.clone())
                    }
                })
                .collect(),
        );
    }
    layout
        .rows
        .push(l_cols.iter().map(|c| c.value.clone()).collect());

    layout.merges = l_merges
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

    let fmt_header = derive_report_format(EnumFmtKey::Header);
    let fmt_separator = derive_report_format(EnumFmtKey::Separator);
    let fmt_integer = derive_report_format(EnumFmtKey::Integer);
    let fmt_percent = derive_report_format(EnumFmtKey::Percent);

    let n_rows_header = l_header_grid.len();
    for (col_idx, col) in l_cols.iter().enumerate() {
        for row_idx in 0..layout.rows.len() {
            let fmt = match (col.kind, row_idx < n_rows_header) {
                (EnumColumnKind::Separator, _) => &fmt_separator,
                (_, true) => &fmt_header,
                (EnumColumnKind::Integer, false) => &fmt_integer,
                (EnumColumnKind::Percent, false) => &fmt_percent,
            };
            layout
                .cell_styles
                .push((derive_cell_address(row_idx, col_idx), fmt.clone()));
        }
    }

    for row_idx in 0..n_rows_header {
        layout.row_heights.insert(row_idx, N_HEIGHT_HEADER_ROW);
    }

    layout
}

/// Active-Users sheet: `A:C` totals, then match/new/churn groups.
pub fn build_active_users_layout(metrics: &SpecActiveUsersMetrics) -> SpecSheetLayout {
    let mut l_cols = vec![
        SpecColumnPlan::single(
            "Прошлый период",
            EnumColumnKind::Integer,
            EnumCellValue::Number(metrics.count_prev as f64),
        ),
        SpecColumnPlan::single(
            "Текущий период",
            EnumColumnKind::Integer,
            EnumCellValue::Number(metrics.count_current as f64),
        ),
        SpecColumnPlan::single(
            "Рост %",
            EnumColumnKind::Percent,
            EnumCellValue::Number(metrics.ratio_growth),
        ),
        SpecColumnPlan::separator(),
    ];
    l_cols.extend(SpecColumnPlan::group(
        "Совпадения",
        metrics.count_matches as f64,
        metrics.ratio_match,
    ));
    l_cols.push(SpecColumnPlan::separator());
    l_cols.extend(SpecColumnPlan::group(
        "Новые",
        metrics.count_new as f64,
        metrics.ratio_new,
    ));
    l_cols.push(SpecColumnPlan::separator());
    l_cols.extend(SpecColumnPlan::group(
        "Отток",
        metrics.count_churn as f64,
        metrics.ratio_churn,
    ));

    build_sheet_layout(&l_cols)
}

/// B-TAG sheet: total, status groups, then transition groups.
pub fn build_btag_layout(metrics: &SpecBtagMetrics) -> SpecSheetLayout {
    let mut l_cols = vec![
        SpecColumnPlan::single(
            "Всего ID",
            EnumColumnKind::Integer,
            EnumCellValue::Number(metrics.value_count as f64),
        ),
        SpecColumnPlan::separator(),
    ];
    l_cols.extend(SpecColumnPlan::group(
        "ОК",
        metrics.ok_count as f64,
        metrics.ratio_ok,
    ));
    l_cols.extend(SpecColumnPlan::group(
        "Отказ",
        metrics.refused_count as f64,
        metrics.ratio_refused,
    ));
    l_cols.push(SpecColumnPlan::separator());
    l_cols.extend(SpecColumnPlan::group(
        "ОК → Отказ",
        metrics.ok_refused_count as f64,
        metrics.ratio_ok_refused,
    ));
    l_cols.extend(SpecColumnPlan::group(
        "Отказ → ОК",
        metrics.refused_ok_count as f64,
        metrics.ratio_refused_ok,
    ));

    build_sheet_layout(&l_cols)
}
