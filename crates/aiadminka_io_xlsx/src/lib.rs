//! `aiadminka_io_xlsx` v1:
//! Spreadsheet IO kernel for the report engine.
//!
//! - `conf`   : Excel limits, naming constants and style presets
//! - `spec`   : raw grids, layouts, formats, errors
//! - `util`   : A1 addresses, sheet names, header merge planning
//! - `reader` : calamine / csv / Polars IPC ingestion
//! - `writer` : rust_xlsxwriter serializer
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_NAME_DEFAULT, EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, derive_default_report_formats, derive_report_format,
};
pub use reader::{
    EnumInputFormat, derive_input_format, derive_raw_sheet_from_dataframe,
    derive_raw_sheet_from_ipc_bytes, read_raw_sheet,
};
pub use spec::{
    EnumCellValue, EnumReportResult, SpecCellFormat, SpecHeaderMerge, SpecRawSheet,
    SpecSheetLayout, SpecXlsxReport, XlsxIoError,
};
pub use util::{
    apply_merge_text_blankout, derive_cell_address, derive_cell_text, derive_column_name,
    derive_output_file_name, derive_range_address, parse_cell_address, parse_range_address,
    plan_header_merges, sanitize_sheet_name,
};
pub use writer::XlsxWriter;
