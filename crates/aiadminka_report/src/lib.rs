//! `aiadminka_report` v1:
//! Template-driven report engine over uploaded spreadsheets.
//!
//! - `conf`         : logical fields, status literals, registry text
//! - `spec`         : template ids, options, metrics, errors
//! - `header`       : tolerant header resolution
//! - `aggregate`    : Active-Users / B-TAG / Merge-Files aggregation
//! - `layout`       : styled sheet layouts for the aggregates
//! - `template`     : template registry and dispatch
//! - `ingest`       : parallel parsing of one upload batch
//! - `orchestrator` : wizard state machine and headless runs
//! - `report`       : run-time report model
//! - `logging`      : tracing subscriber setup

pub mod aggregate;
pub mod conf;
pub mod header;
pub mod ingest;
pub mod layout;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod spec;
pub mod template;

pub use ingest::{
    SpecIngestBatch, SpecLoadedFile, SpecParseFailure, calculate_worker_limit, ingest_files,
    ingest_ipc_payloads,
};
pub use logging::{LogConfig, LogFormat, init_logging, init_logging_with_writer};
pub use orchestrator::{
    EnumWizardStep, ResultWizard, SpecWizardRejection, SpecWizardState, run_report,
    run_report_from_batches, run_report_from_ipc,
};
pub use report::{ReportRun, ReportRunBuilder};
pub use spec::{
    EnumMatchCountRule, EnumTemplateId, ReportError, SpecActiveUsersMetrics, SpecBtagMetrics,
    SpecFileSlot, SpecFilesConfig, SpecLogicalField, SpecMissingColumn, SpecReportOptions,
    SpecTemplateInfo, SpecTemplateOutput,
};
pub use template::{
    ReportTemplate, TemplateActiveUsers, TemplateBtag, TemplateMergeFiles, derive_template_info,
    list_templates, run_template,
};
