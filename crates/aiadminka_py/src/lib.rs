use std::collections::BTreeMap;
use std::path::PathBuf;

use aiadminka_report::{
    EnumMatchCountRule, EnumTemplateId, LogConfig, ReportError, ReportRun, SpecReportOptions,
    SpecTemplateInfo, init_logging, list_templates, run_report, run_report_from_ipc,
};
use pyo3::exceptions::{PyOSError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "aiadminka.report.run_report.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "TemplateInfo")]
#[derive(Debug, Clone)]
struct PyTemplateInfo {
    #[pyo3(get)]
    id: String,
    #[pyo3(get)]
    name: String,
    #[pyo3(get)]
    description: String,
    #[pyo3(get)]
    step1_name: String,
    #[pyo3(get)]
    step1_multiple: bool,
    #[pyo3(get)]
    step2_name: Option<String>,
    #[pyo3(get)]
    step2_multiple: Option<bool>,
}

impl From<SpecTemplateInfo> for PyTemplateInfo {
    fn from(info: SpecTemplateInfo) -> Self {
        let step2 = info.files_config.step2;
        Self {
            id: info.id.as_str().to_string(),
            name: info.name.to_string(),
            description: info.description.to_string(),
            step1_name: info.files_config.step1.name.to_string(),
            step1_multiple: info.files_config.step1.multiple,
            step2_name: step2.map(|s| s.name.to_string()),
            step2_multiple: step2.map(|s| s.multiple),
        }
    }
}

#[pymethods]
impl PyTemplateInfo {
    fn __repr__(&self) -> String {
        format!("TemplateInfo(id={:?}, name={:?})", self.id, self.name)
    }
}

#[pyclass(name = "ReportRun")]
#[derive(Debug, Clone)]
struct PyReportRun {
    #[pyo3(get)]
    template_id: String,
    #[pyo3(get)]
    cnt_files_loaded: u64,
    #[pyo3(get)]
    cnt_files_failed: u64,
    #[pyo3(get)]
    cnt_rows_scanned: u64,
    #[pyo3(get)]
    cnt_sheets_written: u64,
    #[pyo3(get)]
    warnings: Vec<String>,
    #[pyo3(get)]
    file_out: String,
    #[pyo3(get)]
    metrics: BTreeMap<String, f64>,
    report: ReportRun,
}

impl From<ReportRun> for PyReportRun {
    fn from(report: ReportRun) -> Self {
        Self {
            template_id: report.template_id.as_str().to_string(),
            cnt_files_loaded: report.cnt_files_loaded,
            cnt_files_failed: report.cnt_files_failed,
            cnt_rows_scanned: report.cnt_rows_scanned,
            cnt_sheets_written: report.cnt_sheets_written,
            warnings: report.warnings.clone(),
            file_out: report.file_out.clone(),
            metrics: report.metrics.clone(),
            report,
        }
    }
}

#[pymethods]
impl PyReportRun {
    #[getter]
    fn warning_count(&self) -> usize {
        self.report.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report.to_dict()
    }

    #[pyo3(signature = (prefix = "[REPORT]"))]
    fn format(&self, prefix: &str) -> String {
        self.report.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report.to_string()
    }
}

fn parse_rule_template(value: &str) -> PyResult<EnumTemplateId> {
    value.parse().map_err(|_| {
        PyValueError::new_err(format!(
            "Invalid template: `{value}`. Expected one of: ['active_users', 'btag', 'merge_files']"
        ))
    })
}

fn parse_rule_match_count(value: &str) -> PyResult<EnumMatchCountRule> {
    value.parse().map_err(|_| {
        PyValueError::new_err(format!(
            "Invalid match count rule: `{value}`. \
             Expected one of: ['previous_occurrences', 'current_rows']"
        ))
    })
}

fn map_report_error(exception: ReportError) -> PyErr {
    match exception {
        ReportError::SerializationFailure(_) => PyOSError::new_err(exception.to_string()),
        ReportError::Logging(_) => PyRuntimeError::new_err(exception.to_string()),
        ReportError::EmptyInput(_)
        | ReportError::MissingColumn(_)
        | ReportError::ParseFailure { .. }
        | ReportError::InvalidTransition { .. }
        | ReportError::UnknownTemplate(_)
        | ReportError::InvalidOption(_) => PyValueError::new_err(exception.to_string()),
    }
}

fn derive_report_options(
    dir_out: &str,
    num_workers_max: Option<usize>,
    rule_match_count: &str,
) -> PyResult<SpecReportOptions> {
    Ok(SpecReportOptions {
        dir_out: PathBuf::from(dir_out),
        num_workers_max,
        rule_match_count: parse_rule_match_count(rule_match_count)?,
    })
}

#[pyfunction(name = "list_templates")]
fn list_templates_py() -> Vec<PyTemplateInfo> {
    list_templates().into_iter().map(PyTemplateInfo::from).collect()
}

/// Run one report over input files and write `report_<timestamp>.xlsx` into `dir_out`.
///
/// `rule_match_count="previous_occurrences"` (default) sums previous-period
/// occurrences per matched row, so duplicated ids inflate matches;
/// `"current_rows"` counts each matched current row once.
#[pyfunction(name = "run_report")]
#[pyo3(signature = (
    template_id,
    files_step1,
    files_step2 = None,
    dir_out = ".",
    num_workers_max = None,
    rule_match_count = "previous_occurrences"
))]
fn run_report_py(
    py: Python<'_>,
    template_id: &str,
    files_step1: Vec<String>,
    files_step2: Option<Vec<String>>,
    dir_out: &str,
    num_workers_max: Option<usize>,
    rule_match_count: &str,
) -> PyResult<PyReportRun> {
    let template_id = parse_rule_template(template_id)?;
    let spec_options = derive_report_options(dir_out, num_workers_max, rule_match_count)?;
    let l_files_step1: Vec<PathBuf> = files_step1.into_iter().map(PathBuf::from).collect();
    let l_files_step2: Option<Vec<PathBuf>> =
        files_step2.map(|files| files.into_iter().map(PathBuf::from).collect());

    let report = py.allow_threads(|| {
        run_report(
            template_id,
            &l_files_step1,
            l_files_step2.as_deref(),
            &spec_options,
        )
    });
    let report = report.map_err(map_report_error)?;
    Ok(PyReportRun::from(report))
}

/// Same as `run_report`, over Polars IPC payloads instead of files.
#[pyfunction(name = "run_report_from_ipc")]
#[pyo3(signature = (
    template_id,
    payloads_step1,
    payloads_step2 = None,
    dir_out = ".",
    num_workers_max = None,
    rule_match_count = "previous_occurrences"
))]
fn run_report_from_ipc_py(
    py: Python<'_>,
    template_id: &str,
    payloads_step1: Vec<Vec<u8>>,
    payloads_step2: Option<Vec<Vec<u8>>>,
    dir_out: &str,
    num_workers_max: Option<usize>,
    rule_match_count: &str,
) -> PyResult<PyReportRun> {
    let template_id = parse_rule_template(template_id)?;
    let spec_options = derive_report_options(dir_out, num_workers_max, rule_match_count)?;

    let report = py.allow_threads(|| {
        run_report_from_ipc(
            template_id,
            &payloads_step1,
            payloads_step2.as_deref(),
            &spec_options,
        )
    });
    let report = report.map_err(map_report_error)?;
    Ok(PyReportRun::from(report))
}

#[pyfunction(name = "init_logging")]
#[pyo3(signature = (level = "info", format = "compact", log_file = None, if_with_target = false))]
fn init_logging_py(
    level: &str,
    format: &str,
    log_file: Option<String>,
    if_with_target: bool,
) -> PyResult<()> {
    let config = LogConfig::from_names(level, format)
        .map_err(map_report_error)?
        .with_log_file(log_file.map(PathBuf::from))
        .with_target(if_with_target);
    init_logging(&config).map_err(map_report_error)
}

#[pymodule]
fn _aiadminka_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyTemplateInfo>()?;
    module.add_class::<PyReportRun>()?;
    module.add_function(wrap_pyfunction!(list_templates_py, module)?)?;
    module.add_function(wrap_pyfunction!(run_report_py, module)?)?;
    module.add_function(wrap_pyfunction!(run_report_from_ipc_py, module)?)?;
    module.add_function(wrap_pyfunction!(init_logging_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
