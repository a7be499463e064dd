//! Report engine models, options and the top-level error type.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use aiadminka_io_xlsx::{EnumReportResult, XlsxIoError};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Report template identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumTemplateId {
    /// Two-period player comparison.
    ActiveUsers,
    /// Status tallies over one sheet.
    Btag,
    /// Header-union concatenation of N sheets.
    MergeFiles,
}

impl EnumTemplateId {
    /// Every template, in registry order.
    pub const ALL: [EnumTemplateId; 3] = [Self::ActiveUsers, Self::Btag, Self::MergeFiles];

    /// Stable string id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveUsers => "active_users",
            Self::Btag => "btag",
            Self::MergeFiles => "merge_files",
        }
    }
}

impl fmt::Display for EnumTemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumTemplateId {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active_users" => Ok(Self::ActiveUsers),
            "btag" | "b-tag" | "b_tag" => Ok(Self::Btag),
            "merge_files" => Ok(Self::MergeFiles),
            _ => Err(ReportError::UnknownTemplate(s.to_string())),
        }
    }
}

/// How Active-Users counts matches between periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnumMatchCountRule {
    /// Each matched current row adds the id's previous occurrence count.
    ///
    /// Duplicated previous ids inflate the match count, so new/churn counts
    /// can go negative. Previous `[A, A, B]` against current `[A, B, B, C]`
    /// gives 4 matches here, against 3 under [`Self::CurrentRows`].
    #[default]
    PreviousOccurrences,
    /// Each matched current row adds one.
    CurrentRows,
}

impl EnumMatchCountRule {
    /// Stable string id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreviousOccurrences => "previous_occurrences",
            Self::CurrentRows => "current_rows",
        }
    }
}

impl FromStr for EnumMatchCountRule {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "previous_occurrences" => Ok(Self::PreviousOccurrences),
            "current_rows" => Ok(Self::CurrentRows),
            _ => Err(ReportError::InvalidOption(format!(
                "Invalid `rule_match_count`: {s}. Expected: previous_occurrences|current_rows."
            ))),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TemplateRegistryModels

/// Canonical column name plus its accepted header texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecLogicalField {
    /// Logical field name.
    pub name: &'static str,
    /// Accepted header texts, compared trimmed and lower-cased.
    pub synonyms: &'static [&'static str],
}

/// One upload step of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFileSlot {
    /// Dataset label shown to the user.
    pub name: &'static str,
    /// Whether the step accepts several files.
    pub multiple: bool,
}

/// Upload steps of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFilesConfig {
    /// First upload step.
    pub step1: SpecFileSlot,
    /// Optional second upload step.
    pub step2: Option<SpecFileSlot>,
}

/// Registry entry describing one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecTemplateInfo {
    /// Template id.
    pub id: EnumTemplateId,
    /// Display name.
    pub name: &'static str,
    /// Display description.
    pub description: &'static str,
    /// Upload steps.
    pub files_config: SpecFilesConfig,
}

/// Handler output: the result to serialize plus bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTemplateOutput {
    /// Sheets to write.
    pub result: EnumReportResult,
    /// Data rows the aggregator walked.
    pub n_rows_scanned: usize,
    /// Scalar metrics (empty for Merge-Files).
    pub metrics: BTreeMap<String, f64>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Options of one report run.
#[derive(Debug, Clone)]
pub struct SpecReportOptions {
    /// Directory receiving the output workbook.
    pub dir_out: PathBuf,
    /// Maximum parse workers; `None` means available parallelism.
    pub num_workers_max: Option<usize>,
    /// Active-Users match counting rule.
    ///
    /// The default keeps duplicate inflation; use
    /// [`EnumMatchCountRule::CurrentRows`] to count each matched current row once.
    pub rule_match_count: EnumMatchCountRule,
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            dir_out: PathBuf::from("."),
            num_workers_max: None,
            rule_match_count: EnumMatchCountRule::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Metrics

/// Active-Users aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpecActiveUsersMetrics {
    pub count_prev: i64,
    pub count_current: i64,
    pub count_matches: i64,
    pub count_new: i64,
    pub count_churn: i64,
    pub ratio_growth: f64,
    pub ratio_match: f64,
    pub ratio_new: f64,
    pub ratio_churn: f64,
    /// Data rows walked in both periods.
    pub n_rows_scanned: usize,
}

impl SpecActiveUsersMetrics {
    /// Metric map keyed by metric name.
    pub fn to_dict(&self) -> BTreeMap<String, f64> {
        let mut dict_metrics = BTreeMap::new();
        dict_metrics.insert("count_prev".to_string(), self.count_prev as f64);
        dict_metrics.insert("count_current".to_string(), self.count_current as f64);
        dict_metrics.insert("count_matches".to_string(), self.count_matches as f64);
        dict_metrics.insert("count_new".to_string(), self.count_new as f64);
        dict_metrics.insert("count_churn".to_string(), self.count_churn as f64);
        dict_metrics.insert("ratio_growth".to_string(), self.ratio_growth);
        dict_metrics.insert("ratio_match".to_string(), self.ratio_match);
        dict_metrics.insert("ratio_new".to_string(), self.ratio_new);
        dict_metrics.insert("ratio_churn".to_string(), self.ratio_churn);
        dict_metrics
    }
}

/// B-TAG aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpecBtagMetrics {
    pub value_count: u64,
    pub ok_count: u64,
    pub refused_count: u64,
    pub ok_ok_count: u64,
    pub ok_refused_count: u64,
    pub refused_ok_count: u64,
    pub refused_refused_count: u64,
    pub ratio_ok: f64,
    pub ratio_refused: f64,
    pub ratio_ok_refused: f64,
    pub ratio_refused_ok: f64,
    /// Data rows walked.
    pub n_rows_scanned: usize,
}

impl SpecBtagMetrics {
    /// Metric map keyed by metric name.
    pub fn to_dict(&self) -> BTreeMap<String, f64> {
        let mut dict_metrics = BTreeMap::new();
        dict_metrics.insert("value_count".to_string(), self.value_count as f64);
        dict_metrics.insert("ok_count".to_string(), self.ok_count as f64);
        dict_metrics.insert("refused_count".to_string(), self.refused_count as f64);
        dict_metrics.insert("ok_ok_count".to_string(), self.ok_ok_count as f64);
        dict_metrics.insert("ok_refused_count".to_string(), self.ok_refused_count as f64);
        dict_metrics.insert("refused_ok_count".to_string(), self.refused_ok_count as f64);
        dict_metrics.insert(
            "refused_refused_count".to_string(),
            self.refused_refused_count as f64,
        );
        dict_metrics.insert("ratio_ok".to_string(), self.ratio_ok);
        dict_metrics.insert("ratio_refused".to_string(), self.ratio_refused);
        dict_metrics.insert("ratio_ok_refused".to_string(), self.ratio_ok_refused);
        dict_metrics.insert("ratio_refused_ok".to_string(), self.ratio_refused_ok);
        dict_metrics
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// One unresolved logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMissingColumn {
    /// Dataset label the field was looked up in.
    pub dataset: String,
    /// Logical field name.
    pub field: String,
    /// Accepted header texts.
    pub synonyms: Vec<String>,
}

impl fmt::Display for SpecMissingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` in {} (accepted headers: {})",
            self.field,
            self.dataset,
            self.synonyms.join(", ")
        )
    }
}

fn join_missing(l_missing: &[SpecMissingColumn]) -> String {
    l_missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Report run failure. Every variant is terminal for the run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required dataset is absent or has no data row.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Required headers could not be resolved.
    #[error("Missing required columns: {}", join_missing(.0))]
    MissingColumn(Vec<SpecMissingColumn>),

    /// An input file could not be decoded.
    #[error("Failed to parse {}: {message}", path.display())]
    ParseFailure {
        /// Input path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// The workbook could not be written.
    #[error("Failed to export report: {0}")]
    SerializationFailure(String),

    /// Wizard action not allowed in the current step.
    #[error("Cannot {action} from step `{step}`: {reason}")]
    InvalidTransition {
        /// Current step.
        step: &'static str,
        /// Attempted action.
        action: &'static str,
        /// Unmet precondition.
        reason: String,
    },

    /// Unknown template id.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Invalid option value.
    #[error("{0}")]
    InvalidOption(String),

    /// Global logger could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl From<XlsxIoError> for ReportError {
    fn from(err: XlsxIoError) -> Self {
        Self::SerializationFailure(err.to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
