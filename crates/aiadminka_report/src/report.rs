//! Report run summary and mutable builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::EnumTemplateId;

/// Counters and diagnostics for one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRun {
    /// Template that produced the workbook.
    pub template_id: EnumTemplateId,
    /// Inputs parsed successfully, both steps.
    pub cnt_files_loaded: u64,
    /// Inputs skipped after a parse failure.
    pub cnt_files_failed: u64,
    /// Data rows walked by the aggregator.
    pub cnt_rows_scanned: u64,
    /// Worksheets in the output workbook.
    pub cnt_sheets_written: u64,
    /// Non-fatal warnings (parse failures, sheet renames, pool fallback).
    pub warnings: Vec<String>,
    /// Output workbook path.
    pub file_out: String,
    /// Template metrics (empty for Merge-Files).
    ///
    /// Active-Users counts depend on [`crate::spec::EnumMatchCountRule`].
    pub metrics: BTreeMap<String, f64>,
}

impl ReportRun {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_files_loaded".to_string(), self.cnt_files_loaded);
        dict_counts.insert("cnt_files_failed".to_string(), self.cnt_files_failed);
        dict_counts.insert("cnt_rows_scanned".to_string(), self.cnt_rows_scanned);
        dict_counts.insert("cnt_sheets_written".to_string(), self.cnt_sheets_written);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} template={} loaded={} failed={} rows={} sheets={} warnings={} file_out={}",
            self.template_id,
            dict_counts["cnt_files_loaded"],
            dict_counts["cnt_files_failed"],
            dict_counts["cnt_rows_scanned"],
            dict_counts["cnt_sheets_written"],
            dict_counts["cnt_warnings"],
            self.file_out
        )
    }
}

impl fmt::Display for ReportRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[REPORT]"))
    }
}

/// Mutable accumulator for run statistics.
#[derive(Debug, Clone)]
pub struct ReportRunBuilder {
    /// See [`ReportRun::template_id`].
    pub template_id: EnumTemplateId,
    /// See [`ReportRun::cnt_files_loaded`].
    pub cnt_files_loaded: u64,
    /// See [`ReportRun::cnt_files_failed`].
    pub cnt_files_failed: u64,
    /// See [`ReportRun::cnt_rows_scanned`].
    pub cnt_rows_scanned: u64,
    /// See [`ReportRun::cnt_sheets_written`].
    pub cnt_sheets_written: u64,
    /// See [`ReportRun::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportRun::metrics`].
    pub metrics: BTreeMap<String, f64>,
}

impl ReportRunBuilder {
    /// Empty builder for one template.
    pub fn new(template_id: EnumTemplateId) -> Self {
        Self {
            template_id,
            cnt_files_loaded: 0,
            cnt_files_failed: 0,
            cnt_rows_scanned: 0,
            cnt_sheets_written: 0,
            warnings: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Increment one or more named counters by `value`.
    ///
    /// Unknown names are ignored.
    pub fn add_counts(&mut self, field_names: &[&str], value: u64) {
        for field_name in field_names {
            match *field_name {
                "cnt_files_loaded" => self.cnt_files_loaded += value,
                "cnt_files_failed" => self.cnt_files_failed += value,
                "cnt_rows_scanned" => self.cnt_rows_scanned += value,
                "cnt_sheets_written" => self.cnt_sheets_written += value,
                _ => {}
            }
        }
    }

    /// Add warning messages.
    pub fn add_warnings<I: IntoIterator<Item = String>>(&mut self, warnings: I) {
        self.warnings.extend(warnings);
    }

    /// Finalize builder into immutable report.
    pub fn build(self, file_out: String) -> ReportRun {
        ReportRun {
            template_id: self.template_id,
            cnt_files_loaded: self.cnt_files_loaded,
            cnt_files_failed: self.cnt_files_failed,
            cnt_rows_scanned: self.cnt_rows_scanned,
            cnt_sheets_written: self.cnt_sheets_written,
            warnings: self.warnings,
            file_out,
            metrics: self.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_run_to_dict_and_format() {
        let mut builder = ReportRunBuilder::new(EnumTemplateId::Btag);
        builder.add_counts(&["cnt_files_loaded"], 2);
        builder.add_counts(&["cnt_files_failed", "cnt_sheets_written"], 1);
        builder.add_counts(&["cnt_rows_scanned"], 5);
        builder.add_counts(&["cnt_unknown"], 9);
        builder.add_warnings(["Skipped x.csv: bad".to_string()]);
        let report = builder.build("out/report.xlsx".to_string());

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_files_loaded"], 2);
        assert_eq!(dict_counts["cnt_files_failed"], 1);
        assert_eq!(dict_counts["cnt_rows_scanned"], 5);
        assert_eq!(dict_counts["cnt_sheets_written"], 1);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[REPORT]");
        assert_eq!(
            txt,
            "[REPORT] template=btag loaded=2 failed=1 rows=5 sheets=1 warnings=1 \
             file_out=out/report.xlsx"
        );
        assert_eq!(report.to_string(), txt);
    }
}
