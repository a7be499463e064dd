//! Shared XLSX models and IO errors.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Declarative cell style.
///
/// Fill, font, border, alignment and number format in one flat record; any
/// `None` field leaves the serializer default in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Untyped cell value as read from, or written to, a worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Text form used for header matching and identifier keys.
    ///
    /// Integral numbers print without a fractional part, so `123.0` and
    /// `"123"` produce the same key.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
        }
    }

    /// `true` for absent cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RawSheet

/// Header-plus-data grid read from one input file.
///
/// Row 0 is the header row; rows may be ragged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRawSheet {
    /// Cell rows, header first.
    pub rows: Vec<Vec<EnumCellValue>>,
}

impl SpecRawSheet {
    /// Wrap a row grid.
    pub fn new(rows: Vec<Vec<EnumCellValue>>) -> Self {
        Self { rows }
    }

    /// Header row, or an empty slice for an empty sheet.
    pub fn header(&self) -> &[EnumCellValue] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<EnumCellValue>] {
        if self.rows.len() <= 1 {
            return &[];
        }
        &self.rows[1..]
    }

    /// Number of data rows.
    pub fn height_data(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// `true` when the sheet has no data row.
    pub fn is_empty_data(&self) -> bool {
        self.height_data() == 0
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetLayoutSpecification

/// Declarative description of one styled worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetLayout {
    /// Column widths, column `A` first.
    pub column_widths: Vec<f64>,
    /// Cell values row by row.
    pub rows: Vec<Vec<EnumCellValue>>,
    /// Merge ranges in A1 notation (`"A1:B2"`).
    pub merges: BTreeSet<String>,
    /// Styles by A1 cell address; later entries overlay earlier ones.
    pub cell_styles: Vec<(String, SpecCellFormat)>,
    /// Row heights keyed by zero-based row index.
    pub row_heights: BTreeMap<usize, f64>,
}

/// Result of one report template run.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumReportResult {
    /// One unnamed styled sheet.
    Layout(SpecSheetLayout),
    /// Named styled sheets in workbook order.
    Sheets(Vec<(String, SpecSheetLayout)>),
    /// One unnamed plain grid.
    Table(SpecRawSheet),
}

impl EnumReportResult {
    /// Number of worksheets the result expands to.
    pub fn n_sheets(&self) -> usize {
        match self {
            Self::Layout(_) | Self::Table(_) => 1,
            Self::Sheets(l_sheets) => l_sheets.len(),
        }
    }
}

/// Merge plan item for a header grid (zero-based, inclusive).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecHeaderMerge {
    /// First row.
    pub row_idx_start: usize,
    /// First column.
    pub col_idx_start: usize,
    /// Last row.
    pub row_idx_end: usize,
    /// Last column.
    pub col_idx_end: usize,
    /// Merge display text.
    pub text: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// Per-workbook write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet names written, in workbook order.
    pub sheets: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Spreadsheet ingestion and serialization failures.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Input path does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input extension is not a known spreadsheet format.
    #[error("Unsupported file format `{extension}`: {}", path.display())]
    UnsupportedFormat {
        /// Input path.
        path: PathBuf,
        /// Lower-cased extension (may be empty).
        extension: String,
    },

    /// Workbook could not be opened or decoded.
    #[error("Failed to open workbook {}: {message}", path.display())]
    WorkbookOpen {
        /// Input path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// Workbook has no worksheet.
    #[error("Workbook has no sheets: {}", .0.display())]
    NoSheet(PathBuf),

    /// CSV decoding failed.
    #[error("Failed to read CSV {}: {message}", path.display())]
    Csv {
        /// Input path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// Polars IPC payload could not be decoded.
    #[error("Failed to read IPC DataFrame bytes: {0}")]
    Ipc(String),

    /// Malformed A1 cell or range address.
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row/column index beyond Excel limits.
    #[error("{0}")]
    IndexOverflow(String),

    /// Serializer failure.
    #[error("xlsx write error: {0}")]
    Write(String),

    /// Write attempted after `close()`.
    #[error("Cannot write after close().")]
    WriterClosed,
}

impl From<rust_xlsxwriter::XlsxError> for XlsxIoError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        XlsxIoError::Write(err.to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
