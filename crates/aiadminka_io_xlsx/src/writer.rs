//! XLSX writer kernel that serializes report layouts into one workbook.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{C_SHEET_NAME_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{
    EnumCellValue, EnumReportResult, SpecCellFormat, SpecRawSheet, SpecSheetLayout,
    SpecXlsxReport, XlsxIoError,
};
use crate::util::{parse_cell_address, parse_range_address, sanitize_sheet_name};

/// Stateful workbook writer.
///
/// Sheets are buffered in memory; nothing touches the disk until
/// [`Self::close`], so a failed run never leaves a partial file behind.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecXlsxReport,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path.
    pub fn new(path_file_out: PathBuf) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecXlsxReport::default(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return snapshot of the write report.
    pub fn report(&self) -> SpecXlsxReport {
        self.report.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        tracing::info!(
            file_out = %self.path_file_out.display(),
            sheets = self.report.sheets.len(),
            "workbook saved"
        );
        Ok(())
    }

    /// Write every sheet of a report result, in result order.
    ///
    /// Unnamed results land on a sheet called [`C_SHEET_NAME_DEFAULT`].
    pub fn write_report_result(&mut self, result: &EnumReportResult) -> Result<(), XlsxIoError> {
        tracing::debug!(sheets = result.n_sheets(), "writing report result");
        match result {
            EnumReportResult::Layout(layout) => {
                self.write_layout(layout, C_SHEET_NAME_DEFAULT)?;
            }
            EnumReportResult::Sheets(l_sheets) => {
                for (sheet_name, layout) in l_sheets {
                    self.write_layout(layout, sheet_name)?;
                }
            }
            EnumReportResult::Table(table) => {
                self.write_table(table, C_SHEET_NAME_DEFAULT)?;
            }
        }
        Ok(())
    }

    /// Write one styled sheet; returns the sheet name actually used.
    pub fn write_layout(
        &mut self,
        layout: &SpecSheetLayout,
        sheet_name: &str,
    ) -> Result<String, XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::WriterClosed);
        }
        if layout.rows.len() > N_NROWS_EXCEL_MAX {
            return Err(XlsxIoError::IndexOverflow(format!(
                "layout has {} rows; Excel allows {N_NROWS_EXCEL_MAX}",
                layout.rows.len()
            )));
        }

        let dict_fmt_by_cell = derive_format_by_cell(layout)?;
        let l_merges = layout
            .merges
            .iter()
            .map(|range| parse_range_address(range))
            .collect::<Result<Vec<_>, _>>()?;

        let sheet_name_unique = self.derive_sheet_name(sheet_name);
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        for (col_idx, width) in layout.column_widths.iter().enumerate() {
            worksheet.set_column_width(cast_col_num(col_idx)?, *width)?;
        }
        for (row_idx, height) in &layout.row_heights {
            worksheet.set_row_height(cast_row_num(*row_idx)?, *height)?;
        }

        let mut set_cells: BTreeSet<(usize, usize)> = dict_fmt_by_cell.keys().copied().collect();
        for (row_idx, row_values) in layout.rows.iter().enumerate() {
            for col_idx in 0..row_values.len() {
                set_cells.insert((row_idx, col_idx));
            }
        }

        for (row_idx, col_idx) in set_cells {
            let value = derive_layout_value(layout, row_idx, col_idx);
            match dict_fmt_by_cell.get(&(row_idx, col_idx)) {
                Some(fmt_spec) => write_cell_with_format(
                    worksheet,
                    row_idx,
                    col_idx,
                    &value,
                    &derive_rust_xlsx_format(fmt_spec),
                )?,
                None => write_cell(worksheet, row_idx, col_idx, &value)?,
            }
        }

        for (row_idx_start, col_idx_start, row_idx_end, col_idx_end) in l_merges {
            if (row_idx_start, col_idx_start) == (row_idx_end, col_idx_end) {
                continue;
            }
            let fmt_anchor = dict_fmt_by_cell
                .get(&(row_idx_start, col_idx_start))
                .map(derive_rust_xlsx_format)
                .unwrap_or_else(Format::new);
            worksheet.merge_range(
                cast_row_num(row_idx_start)?,
                cast_col_num(col_idx_start)?,
                cast_row_num(row_idx_end)?,
                cast_col_num(col_idx_end)?,
                "",
                &fmt_anchor,
            )?;
            // merge_range only takes text; rewrite the anchor with its typed value.
            let value_anchor = derive_layout_value(layout, row_idx_start, col_idx_start);
            write_cell_with_format(
                worksheet,
                row_idx_start,
                col_idx_start,
                &value_anchor,
                &fmt_anchor,
            )?;
        }

        self.report.sheets.push(sheet_name_unique.clone());
        tracing::debug!(
            sheet = %sheet_name_unique,
            rows = layout.rows.len(),
            merges = layout.merges.len(),
            "layout sheet written"
        );
        Ok(sheet_name_unique)
    }

    /// Write one plain grid without styling; returns the sheet name used.
    pub fn write_table(
        &mut self,
        table: &SpecRawSheet,
        sheet_name: &str,
    ) -> Result<String, XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::WriterClosed);
        }
        if table.rows.len() > N_NROWS_EXCEL_MAX {
            return Err(XlsxIoError::IndexOverflow(format!(
                "table has {} rows; Excel allows {N_NROWS_EXCEL_MAX}",
                table.rows.len()
            )));
        }

        let sheet_name_unique = self.derive_sheet_name(sheet_name);
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        for (row_idx, row_values) in table.rows.iter().enumerate() {
            for (col_idx, value) in row_values.iter().enumerate() {
                write_cell(worksheet, row_idx, col_idx, value)?;
            }
        }

        self.report.sheets.push(sheet_name_unique.clone());
        tracing::debug!(
            sheet = %sheet_name_unique,
            rows = table.rows.len(),
            "table sheet written"
        );
        Ok(sheet_name_unique)
    }

    fn derive_sheet_name(&mut self, name: &str) -> String {
        let c_name_clean = sanitize_sheet_name(name, "_");
        if c_name_clean != name {
            self.report
                .warn(format!("Sheet name `{name}` normalized to `{c_name_clean}`."));
        }
        self.derive_unique_sheet_name(&c_name_clean)
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Overlay every style record onto its cell, in declaration order.
fn derive_format_by_cell(
    layout: &SpecSheetLayout,
) -> Result<BTreeMap<(usize, usize), SpecCellFormat>, XlsxIoError> {
    let mut dict_fmt_by_cell: BTreeMap<(usize, usize), SpecCellFormat> = BTreeMap::new();
    for (address, fmt_spec) in &layout.cell_styles {
        let key = parse_cell_address(address)?;
        let fmt_merged = match dict_fmt_by_cell.get(&key) {
            Some(fmt_prev) => fmt_prev.merge(fmt_spec),
            None => fmt_spec.clone(),
        };
        dict_fmt_by_cell.insert(key, fmt_merged);
    }
    Ok(dict_fmt_by_cell)
}

fn derive_layout_value(layout: &SpecSheetLayout, row_idx: usize, col_idx: usize) -> EnumCellValue {
    layout
        .rows
        .get(row_idx)
        .and_then(|row| row.get(col_idx))
        .cloned()
        .unwrap_or_default()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
) -> Result<(), XlsxIoError> {
    match value {
        EnumCellValue::None => {}
        EnumCellValue::String(val) if val.is_empty() => {}
        EnumCellValue::String(val) => {
            worksheet.write_string(cast_row_num(row_idx)?, cast_col_num(col_idx)?, val)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number(cast_row_num(row_idx)?, cast_col_num(col_idx)?, *val)?;
        }
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxIoError> {
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                val,
                format,
            )?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                *val,
                format,
            )?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value)
        .map_err(|_| XlsxIoError::IndexOverflow(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value)
        .map_err(|_| XlsxIoError::IndexOverflow(format!("column index overflow: {value}")))
}
