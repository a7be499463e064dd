//! Spreadsheet ingestion into [`SpecRawSheet`] grids.
//!
//! Workbooks go through `calamine` (first worksheet only), `.csv` through
//! `csv`, in-memory tables through Polars IPC.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::spec::{EnumCellValue, SpecRawSheet, XlsxIoError};

/// Input container recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumInputFormat {
    /// Excel/ODS workbook decoded by calamine.
    Workbook,
    /// Comma-separated text.
    Csv,
}

impl EnumInputFormat {
    /// Map a lower-cased extension to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Detect the input format of `path` from its extension.
pub fn derive_input_format(path: &Path) -> Result<EnumInputFormat, XlsxIoError> {
    let c_extension = path
        .extension()
        .and_then(|val| val.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    EnumInputFormat::from_extension(&c_extension).ok_or_else(|| XlsxIoError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: c_extension,
    })
}

/// Read the first worksheet (or the CSV table) at `path`.
///
/// Fully blank rows are dropped; the first remaining row is the header.
pub fn read_raw_sheet(path: &Path) -> Result<SpecRawSheet, XlsxIoError> {
    if !path.is_file() {
        return Err(XlsxIoError::FileNotFound(path.to_path_buf()));
    }

    let l_rows = match derive_input_format(path)? {
        EnumInputFormat::Workbook => read_workbook_rows(path)?,
        EnumInputFormat::Csv => read_csv_rows(path)?,
    };

    tracing::debug!(
        path = %path.display(),
        rows = l_rows.len(),
        "input sheet decoded"
    );
    Ok(SpecRawSheet::new(l_rows))
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<EnumCellValue>>, XlsxIoError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| XlsxIoError::WorkbookOpen {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| XlsxIoError::NoSheet(path.to_path_buf()))?
        .map_err(|err| XlsxIoError::WorkbookOpen {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    // Ranges start at the first used cell; pad back to A1.
    let (n_row_offset, n_col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut l_rows: Vec<Vec<EnumCellValue>> = Vec::with_capacity(range.height() + n_row_offset);
    for _ in 0..n_row_offset {
        l_rows.push(Vec::new());
    }
    for row in range.rows() {
        let mut v_row = vec![EnumCellValue::None; n_col_offset];
        v_row.extend(row.iter().map(derive_cell_value_from_calamine));
        l_rows.push(v_row);
    }

    Ok(drop_blank_rows(l_rows))
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<EnumCellValue>>, XlsxIoError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| XlsxIoError::Csv {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let mut l_rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|err| XlsxIoError::Csv {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let v_row: Vec<EnumCellValue> = record
            .iter()
            .map(|val| {
                let c_val = val.trim_start_matches('\u{feff}');
                if c_val.is_empty() {
                    EnumCellValue::None
                } else {
                    EnumCellValue::String(c_val.to_string())
                }
            })
            .collect();
        l_rows.push(v_row);
    }

    Ok(drop_blank_rows(l_rows))
}

fn drop_blank_rows(l_rows: Vec<Vec<EnumCellValue>>) -> Vec<Vec<EnumCellValue>> {
    l_rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_blank()))
        .collect()
}

/// Map one calamine cell to [`EnumCellValue`].
pub fn derive_cell_value_from_calamine(cell: &Data) -> EnumCellValue {
    match cell {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::String(if *val { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(val) => EnumCellValue::Number(val.as_f64()),
        Data::DateTimeIso(val) | Data::DurationIso(val) => EnumCellValue::String(val.clone()),
        Data::Error(err) => EnumCellValue::String(format!("#{err:?}")),
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region PolarsInput

/// Decode a Polars IPC payload into a DataFrame.
pub fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, XlsxIoError> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| XlsxIoError::Ipc(err.to_string()))
}

/// Convert a DataFrame to a raw grid; column names become row 0.
pub fn derive_raw_sheet_from_dataframe(df: &DataFrame) -> Result<SpecRawSheet, XlsxIoError> {
    let l_cols = df.get_columns();
    let mut l_rows = Vec::with_capacity(df.height() + 1);

    l_rows.push(
        df.get_column_names_str()
            .into_iter()
            .map(|name| EnumCellValue::String(name.to_string()))
            .collect::<Vec<_>>(),
    );

    for n_idx_row in 0..df.height() {
        let mut v_row = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            let value = col
                .get(n_idx_row)
                .map_err(|err| XlsxIoError::Ipc(format!("Failed to access cell value: {err}")))?;
            v_row.push(derive_cell_value_from_any_value(value));
        }
        l_rows.push(v_row);
    }

    Ok(SpecRawSheet::new(l_rows))
}

/// Decode IPC bytes straight into a raw grid.
pub fn derive_raw_sheet_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<SpecRawSheet, XlsxIoError> {
    let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
    derive_raw_sheet_from_dataframe(&df)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "TRUE" } else { "FALSE" }.to_string())
        }
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
