//! XLSX constants and default style presets.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Sheet name used when a report produces one unnamed sheet.
pub const C_SHEET_NAME_DEFAULT: &str = "Результат";
/// Output file name prefix.
pub const C_FILE_OUT_PREFIX: &str = "report_";
/// Output file extension.
pub const C_FILE_OUT_EXTENSION: &str = "xlsx";

/// Number format attached to ratio cells.
pub const C_NUM_FORMAT_PERCENT: &str = "0.00%";
/// Number format attached to count cells.
pub const C_NUM_FORMAT_INTEGER: &str = "0";

/// Report font family.
pub const C_FONT_NAME: &str = "Calibri";
/// Report font size in points.
pub const N_FONT_SIZE: i64 = 11;
/// Header band fill.
pub const C_COLOR_HEADER_FILL: &str = "#D9E1F2";
/// Header band font color.
pub const C_COLOR_HEADER_FONT: &str = "#1F3864";
/// Separator column fill.
pub const C_COLOR_SEPARATOR_FILL: &str = "#808080";
/// Width of a separator column.
pub const N_WIDTH_SEPARATOR: f64 = 2.0;
/// Height of each header band row.
pub const N_HEIGHT_HEADER_ROW: f64 = 30.0;

/// Thin border style id (see `derive_format_border` in the writer).
pub const N_BORDER_THIN: i64 = 1;

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumFmtKey {
    /// Header band cell.
    Header,
    /// Count cell.
    Integer,
    /// Ratio cell rendered as percent.
    Percent,
    /// Spacer column cell.
    Separator,
}

impl EnumFmtKey {
    /// Preset name used as key in [`derive_default_report_formats`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Integer => "integer",
            Self::Percent => "percent",
            Self::Separator => "separator",
        }
    }
}

/// Build default named format presets used by the layout builders.
pub fn derive_default_report_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some(C_FONT_NAME.to_string()),
        font_size: Some(N_FONT_SIZE),
        border: Some(N_BORDER_THIN),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            text_wrap: Some(true),
            bg_color: Some(C_COLOR_HEADER_FILL.to_string()),
            font_color: Some(C_COLOR_HEADER_FONT.to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Integer.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_INTEGER.to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Percent.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_PERCENT.to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Separator.as_str().to_string(),
        SpecCellFormat {
            bg_color: Some(C_COLOR_SEPARATOR_FILL.to_string()),
            ..Default::default()
        },
    );

    dict_fmt
}

/// Resolve one preset by key.
pub fn derive_report_format(key: EnumFmtKey) -> SpecCellFormat {
    derive_default_report_formats()
        .remove(key.as_str())
        .unwrap_or_default()
}
