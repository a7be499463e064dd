//! Report wizard state machine and headless run orchestration.
//!
//! ```text
//! template-selection -> step1-upload -> [step2-upload] -> process -> export
//! ```
//!
//! Every transition consumes the state and returns the next one. A rejected
//! transition hands the unchanged state back inside [`SpecWizardRejection`].

use std::fs;
use std::path::{Path, PathBuf};

use aiadminka_io_xlsx::{XlsxWriter, derive_output_file_name};
use chrono::{DateTime, Utc};

use crate::ingest::{SpecIngestBatch, ingest_files, ingest_ipc_payloads};
use crate::report::{ReportRun, ReportRunBuilder};
use crate::spec::{
    EnumTemplateId, ReportError, SpecFileSlot, SpecReportOptions, SpecTemplateOutput,
};
use crate::template::{derive_template_info, run_template};

////////////////////////////////////////////////////////////////////////////////
// #region WizardState

/// Wizard step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnumWizardStep {
    #[default]
    TemplateSelection,
    Step1Upload,
    Step2Upload,
    Process,
    Export,
}

impl EnumWizardStep {
    /// Stable string id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TemplateSelection => "template-selection",
            Self::Step1Upload => "step1-upload",
            Self::Step2Upload => "step2-upload",
            Self::Process => "process",
            Self::Export => "export",
        }
    }
}

/// A refused transition: the state it was attempted on, plus why.
#[derive(Debug)]
pub struct SpecWizardRejection {
    /// Unchanged state.
    pub state: Box<SpecWizardState>,
    /// Failure.
    pub error: ReportError,
}

impl From<SpecWizardRejection> for ReportError {
    fn from(rejection: SpecWizardRejection) -> Self {
        rejection.error
    }
}

/// Transition result.
pub type ResultWizard = Result<SpecWizardState, SpecWizardRejection>;

/// Explicit wizard state.
#[derive(Debug, Clone, Default)]
pub struct SpecWizardState {
    step: EnumWizardStep,
    template_id: Option<EnumTemplateId>,
    batch_step1: SpecIngestBatch,
    batch_step2: SpecIngestBatch,
    output: Option<SpecTemplateOutput>,
    warnings: Vec<String>,
}

impl SpecWizardState {
    /// Fresh state at template selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step.
    pub fn step(&self) -> EnumWizardStep {
        self.step
    }

    /// Chosen template.
    pub fn template_id(&self) -> Option<EnumTemplateId> {
        self.template_id
    }

    /// Handler output, once processed.
    pub fn output(&self) -> Option<&SpecTemplateOutput> {
        self.output.as_ref()
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn reject(self, action: &'static str, reason: impl Into<String>) -> ResultWizard {
        let error = ReportError::InvalidTransition {
            step: self.step.as_str(),
            action,
            reason: reason.into(),
        };
        self.fail(error)
    }

    fn fail(self, error: ReportError) -> ResultWizard {
        Err(SpecWizardRejection {
            state: Box::new(self),
            error,
        })
    }

    fn derive_slot(&self, step: EnumWizardStep) -> Option<SpecFileSlot> {
        let files_config = derive_template_info(self.template_id?).files_config;
        match step {
            EnumWizardStep::Step1Upload => Some(files_config.step1),
            EnumWizardStep::Step2Upload => files_config.step2,
            _ => None,
        }
    }

    fn has_step2(&self) -> bool {
        self.derive_slot(EnumWizardStep::Step2Upload).is_some()
    }

    /// Choose (or change) the template. Changing it drops loaded files.
    pub fn select_template(mut self, id: EnumTemplateId) -> ResultWizard {
        if self.step != EnumWizardStep::TemplateSelection {
            return self.reject("select a template", "templates are chosen on the first step");
        }
        if self.template_id != Some(id) {
            self.batch_step1 = SpecIngestBatch::default();
            self.batch_step2 = SpecIngestBatch::default();
            self.warnings.clear();
        }
        self.template_id = Some(id);
        Ok(self)
    }

    /// Attach a parsed batch to the current upload step.
    ///
    /// Single-file steps keep the first parsed file.
    pub fn load_batch(mut self, mut batch: SpecIngestBatch) -> ResultWizard {
        let Some(slot) = self.derive_slot(self.step) else {
            return self.reject("load files", "not an upload step");
        };

        if !slot.multiple && batch.loaded.len() > 1 {
            let n_ignored = batch.loaded.len() - 1;
            batch.loaded.truncate(1);
            batch.warnings.push(format!(
                "Step `{}` takes one file; using {} and ignoring {n_ignored} more.",
                slot.name,
                batch.loaded[0].path.display()
            ));
        }

        self.warnings.extend(batch.warnings.iter().cloned());
        if self.step == EnumWizardStep::Step1Upload {
            self.batch_step1 = batch;
        } else {
            self.batch_step2 = batch;
        }
        Ok(self)
    }

    fn ensure_batch_parsed(self, batch: &SpecIngestBatch, slot_name: &str) -> ResultWizard {
        if !batch.loaded.is_empty() {
            return Ok(self);
        }
        let error = match batch.failures.first() {
            Some(failure) => ReportError::ParseFailure {
                path: failure.path.clone(),
                message: failure.message.clone(),
            },
            None => ReportError::EmptyInput(format!("step `{slot_name}` has no file")),
        };
        self.fail(error)
    }

    /// Move forward once the current step's precondition holds.
    pub fn next(mut self) -> ResultWizard {
        match self.step {
            EnumWizardStep::TemplateSelection => {
                if self.template_id.is_none() {
                    return self.reject("go next", "no template selected");
                }
                self.step = EnumWizardStep::Step1Upload;
            }
            EnumWizardStep::Step1Upload => {
                let batch = std::mem::take(&mut self.batch_step1);
                let c_slot = self
                    .derive_slot(EnumWizardStep::Step1Upload)
                    .map(|s| s.name)
                    .unwrap_or_default();
                let res_state = self.ensure_batch_parsed(&batch, c_slot);
                let mut state = restore_batch(res_state, batch, EnumWizardStep::Step1Upload)?;
                state.step = if state.has_step2() {
                    EnumWizardStep::Step2Upload
                } else {
                    EnumWizardStep::Process
                };
                return Ok(state);
            }
            EnumWizardStep::Step2Upload => {
                let batch = std::mem::take(&mut self.batch_step2);
                let c_slot = self
                    .derive_slot(EnumWizardStep::Step2Upload)
                    .map(|s| s.name)
                    .unwrap_or_default();
                let res_state = self.ensure_batch_parsed(&batch, c_slot);
                let mut state = restore_batch(res_state, batch, EnumWizardStep::Step2Upload)?;
                state.step = EnumWizardStep::Process;
                return Ok(state);
            }
            EnumWizardStep::Process => {
                if self.output.is_none() {
                    return self.reject("go next", "report not processed yet");
                }
                self.step = EnumWizardStep::Export;
            }
            EnumWizardStep::Export => {
                return self.reject("go next", "export is the last step");
            }
        }
        Ok(self)
    }

    /// Move to the immediately preceding step.
    pub fn back(mut self) -> ResultWizard {
        self.step = match self.step {
            EnumWizardStep::TemplateSelection => {
                return self.reject("go back", "already on the first step");
            }
            EnumWizardStep::Step1Upload => EnumWizardStep::TemplateSelection,
            EnumWizardStep::Step2Upload => EnumWizardStep::Step1Upload,
            EnumWizardStep::Process => {
                self.output = None;
                if self.has_step2() {
                    EnumWizardStep::Step2Upload
                } else {
                    EnumWizardStep::Step1Upload
                }
            }
            EnumWizardStep::Export => EnumWizardStep::Process,
        };
        Ok(self)
    }

    /// Run the selected template over the loaded datasets.
    ///
    /// Stays on the process step; [`Self::next`] then moves to export.
    pub fn process(mut self, options: &SpecReportOptions) -> ResultWizard {
        if self.step != EnumWizardStep::Process {
            return self.reject("process", "datasets are processed on the process step");
        }
        let Some(template_id) = self.template_id else {
            return self.reject("process", "no template selected");
        };

        let res_output = run_template(
            template_id,
            options,
            &self.batch_step1.sheets(),
            &self.batch_step2.sheets(),
        );
        match res_output {
            Ok(output) => {
                self.output = Some(output);
                Ok(self)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Serialize the processed result into `dir_out`.
    ///
    /// The workbook is built in memory and saved once; on failure no file
    /// is produced.
    pub fn export(&self, dir_out: &Path, dt_now: DateTime<Utc>) -> Result<ReportRun, ReportError> {
        let (EnumWizardStep::Export, Some(template_id), Some(output)) =
            (self.step, self.template_id, self.output.as_ref())
        else {
            return Err(ReportError::InvalidTransition {
                step: self.step.as_str(),
                action: "export",
                reason: "report not processed yet".to_string(),
            });
        };

        fs::create_dir_all(dir_out).map_err(|err| {
            ReportError::SerializationFailure(format!(
                "cannot create output directory {}: {err}",
                dir_out.display()
            ))
        })?;
        let path_file_out = dir_out.join(derive_output_file_name(dt_now));

        let mut writer = XlsxWriter::new(path_file_out);
        writer.write_report_result(&output.result)?;
        writer.close()?;
        let report_xlsx = writer.report();

        let mut builder = ReportRunBuilder::new(template_id);
        builder.add_counts(
            &["cnt_files_loaded"],
            (self.batch_step1.loaded.len() + self.batch_step2.loaded.len()) as u64,
        );
        builder.add_counts(
            &["cnt_files_failed"],
            (self.batch_step1.failures.len() + self.batch_step2.failures.len()) as u64,
        );
        builder.add_counts(&["cnt_rows_scanned"], output.n_rows_scanned as u64);
        builder.add_counts(&["cnt_sheets_written"], report_xlsx.sheets.len() as u64);
        builder.add_warnings(self.warnings.iter().cloned());
        builder.add_warnings(report_xlsx.warnings);
        builder.metrics = output.metrics.clone();

        let report = builder.build(writer.file_out());
        tracing::info!("{report}");
        Ok(report)
    }
}

/// Put a taken batch back into whichever state came out of a check.
fn restore_batch(
    res_state: ResultWizard,
    batch: SpecIngestBatch,
    step: EnumWizardStep,
) -> ResultWizard {
    let put = |state: &mut SpecWizardState| {
        if step == EnumWizardStep::Step1Upload {
            state.batch_step1 = batch;
        } else {
            state.batch_step2 = batch;
        }
    };
    match res_state {
        Ok(mut state) => {
            put(&mut state);
            Ok(state)
        }
        Err(mut rejection) => {
            put(&mut rejection.state);
            Err(rejection)
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeadlessRun

/// Drive the wizard end to end over already-parsed batches.
pub fn run_report_from_batches(
    template_id: EnumTemplateId,
    batch_step1: SpecIngestBatch,
    batch_step2: Option<SpecIngestBatch>,
    options: &SpecReportOptions,
) -> Result<ReportRun, ReportError> {
    let span = tracing::info_span!("report_run", template = template_id.as_str());
    let _guard = span.enter();

    let mut state = SpecWizardState::new()
        .select_template(template_id)?
        .next()?
        .load_batch(batch_step1)?
        .next()?;

    match (state.step(), batch_step2) {
        (EnumWizardStep::Step2Upload, Some(batch)) => {
            state = state.load_batch(batch)?.next()?;
        }
        (EnumWizardStep::Step2Upload, None) => {
            let slot_name = state
                .derive_slot(EnumWizardStep::Step2Upload)
                .map(|s| s.name)
                .unwrap_or_default();
            return Err(ReportError::EmptyInput(format!(
                "step `{slot_name}` has no file"
            )));
        }
        (_, Some(batch)) if !batch.loaded.is_empty() || !batch.failures.is_empty() => {
            state.warnings.push(format!(
                "Template `{template_id}` has no second upload step; {} extra input(s) ignored.",
                batch.loaded.len() + batch.failures.len()
            ));
        }
        _ => {}
    }

    let state = state.process(options)?.next()?;
    state.export(&options.dir_out, Utc::now())
}

/// Parse files and run one report.
pub fn run_report(
    template_id: EnumTemplateId,
    files_step1: &[PathBuf],
    files_step2: Option<&[PathBuf]>,
    options: &SpecReportOptions,
) -> Result<ReportRun, ReportError> {
    let batch_step1 = ingest_files(files_step1, options.num_workers_max);
    let batch_step2 = files_step2.map(|paths| ingest_files(paths, options.num_workers_max));
    run_report_from_batches(template_id, batch_step1, batch_step2, options)
}

/// Decode Polars IPC payloads and run one report.
pub fn run_report_from_ipc(
    template_id: EnumTemplateId,
    payloads_step1: &[Vec<u8>],
    payloads_step2: Option<&[Vec<u8>]>,
    options: &SpecReportOptions,
) -> Result<ReportRun, ReportError> {
    let batch_step1 = ingest_ipc_payloads(payloads_step1, options.num_workers_max);
    let batch_step2 =
        payloads_step2.map(|payloads| ingest_ipc_payloads(payloads, options.num_workers_max));
    run_report_from_batches(template_id, batch_step1, batch_step2, options)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use aiadminka_io_xlsx::{C_SHEET_NAME_DEFAULT, EnumCellValue, read_raw_sheet};
    use calamine::{Reader, open_workbook_auto};
    use polars::df;
    use polars::prelude::{IpcWriter, SerWriter};
    use tempfile::tempdir;

    use super::*;
    use crate::spec::EnumMatchCountRule;

    fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
    }

    const C_BTAG_CSV: &str = "ID игрока,Статус 1,Статус 2\n\
                              1,ОК,ОК\n\
                              2,ОК,Отказ\n\
                              3,Отказ,Отказ\n\
                              4,Отказ,ОК\n\
                              5,ОК,ОК\n";

    #[test]
    fn wizard_walks_forward_for_single_step_template() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "btag.csv", C_BTAG_CSV);

        let state = SpecWizardState::new()
            .select_template(EnumTemplateId::Btag)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(state.step(), EnumWizardStep::Step1Upload);

        let state = state
            .load_batch(ingest_files(&[path], Some(1)))
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(state.step(), EnumWizardStep::Process);

        let state = state.process(&SpecReportOptions::default()).unwrap();
        assert_eq!(state.output().unwrap().metrics["ok_refused_count"], 1.0);
        let state = state.next().unwrap();
        assert_eq!(state.step(), EnumWizardStep::Export);

        let dir_out = dir.path().join("out");
        let report = state.export(&dir_out, Utc::now()).unwrap();
        assert_eq!(report.cnt_files_loaded, 1);
        assert_eq!(report.cnt_rows_scanned, 5);
        assert_eq!(report.cnt_sheets_written, 1);

        let sheet = read_raw_sheet(Path::new(&report.file_out)).unwrap();
        assert_eq!(sheet.rows[0][0].to_text(), "Всего ID");
        assert_eq!(sheet.rows[0][2].to_text(), "ОК");
        assert_eq!(sheet.rows[1][2].to_text(), "Кол-во");
        assert_eq!(sheet.rows[2][0], EnumCellValue::Number(5.0));
        assert_eq!(sheet.rows[2][2], EnumCellValue::Number(3.0));
        assert_eq!(sheet.rows[2][3], EnumCellValue::Number(0.6));
    }

    #[test]
    fn wizard_backward_transitions_step_once() {
        let state = SpecWizardState::new()
            .select_template(EnumTemplateId::ActiveUsers)
            .unwrap()
            .next()
            .unwrap();

        let state = state.back().unwrap();
        assert_eq!(state.step(), EnumWizardStep::TemplateSelection);

        let rejection = state.back().unwrap_err();
        assert!(matches!(
            rejection.error,
            ReportError::InvalidTransition { step: "template-selection", .. }
        ));
        assert_eq!(rejection.state.template_id(), Some(EnumTemplateId::ActiveUsers));
    }

    #[test]
    fn wizard_requires_template_and_parsed_files() {
        let rejection = SpecWizardState::new().next().unwrap_err();
        assert!(matches!(
            rejection.error,
            ReportError::InvalidTransition { .. }
        ));

        let dir = tempdir().unwrap();
        let state = SpecWizardState::new()
            .select_template(EnumTemplateId::Btag)
            .unwrap()
            .next()
            .unwrap();

        let rejection = state.clone().next().unwrap_err();
        assert!(matches!(rejection.error, ReportError::EmptyInput(_)));

        let batch = ingest_files(&[dir.path().join("absent.xlsx")], Some(1));
        let rejection = state.load_batch(batch).unwrap().next().unwrap_err();
        assert!(matches!(rejection.error, ReportError::ParseFailure { .. }));
        assert_eq!(rejection.state.step(), EnumWizardStep::Step1Upload);
        assert_eq!(rejection.state.warnings().len(), 1);
    }

    #[test]
    fn single_file_step_keeps_first_file() {
        let dir = tempdir().unwrap();
        let path_a = write_file(dir.path(), "a.csv", C_BTAG_CSV);
        let path_b = write_file(dir.path(), "b.csv", C_BTAG_CSV);

        let state = SpecWizardState::new()
            .select_template(EnumTemplateId::Btag)
            .unwrap()
            .next()
            .unwrap()
            .load_batch(ingest_files(&[path_a, path_b], Some(1)))
            .unwrap();
        assert_eq!(state.warnings().len(), 1);

        let state = state.next().unwrap().process(&SpecReportOptions::default()).unwrap();
        assert_eq!(state.output().unwrap().n_rows_scanned, 5);
    }

    #[test]
    fn run_report_active_users_end_to_end() {
        let dir = tempdir().unwrap();
        let path_prev = write_file(dir.path(), "prev.csv", "ID игрока\nA\nA\nB\n");
        let path_current = write_file(dir.path(), "cur.csv", " id игрока \nA\nB\nB\nC\n");

        let options = SpecReportOptions {
            dir_out: dir.path().join("out"),
            num_workers_max: Some(2),
            rule_match_count: EnumMatchCountRule::CurrentRows,
        };
        let report = run_report(
            EnumTemplateId::ActiveUsers,
            &[path_prev],
            Some(&[path_current]),
            &options,
        )
        .unwrap();

        assert_eq!(report.cnt_files_loaded, 2);
        assert_eq!(report.cnt_rows_scanned, 7);
        assert_eq!(report.metrics["count_new"], 1.0);
        let c_name = Path::new(&report.file_out)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert!(c_name.starts_with("report_") && c_name.ends_with("Z.xlsx"));
        assert!(!c_name.contains(':'));

        let sheet = read_raw_sheet(Path::new(&report.file_out)).unwrap();
        assert_eq!(sheet.rows[0][4].to_text(), "Совпадения");
        assert_eq!(sheet.rows[2][0], EnumCellValue::Number(3.0));
        assert_eq!(sheet.rows[2][1], EnumCellValue::Number(4.0));
        assert_eq!(sheet.rows[2][4], EnumCellValue::Number(3.0));
        assert_eq!(sheet.rows[2][7], EnumCellValue::Number(1.0));
        assert_eq!(sheet.rows[2][10], EnumCellValue::Number(0.0));
    }

    #[test]
    fn missing_column_aborts_without_output_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "btag.csv", "ID игрока,Статус\n1,ОК\n");
        let dir_out = dir.path().join("out");

        let err = run_report(
            EnumTemplateId::Btag,
            &[path],
            None,
            &SpecReportOptions {
                dir_out: dir_out.clone(),
                ..Default::default()
            },
        )
        .unwrap_err();

        let ReportError::MissingColumn(l_missing) = err else {
            panic!("expected MissingColumn");
        };
        assert_eq!(l_missing.len(), 2);
        assert_eq!(count_files(&dir_out), 0);
    }

    #[test]
    fn missing_column_rejects_process_without_metrics() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "btag.csv",
            "ID игрока,Статус\n1\n2,ОК,лишнее\n3,Отказ\n",
        );

        let state = SpecWizardState::new()
            .select_template(EnumTemplateId::Btag)
            .unwrap()
            .next()
            .unwrap()
            .load_batch(ingest_files(&[path], Some(1)))
            .unwrap()
            .next()
            .unwrap();

        let rejection = state.process(&SpecReportOptions::default()).unwrap_err();
        assert!(matches!(rejection.error, ReportError::MissingColumn(_)));
        assert_eq!(rejection.state.step(), EnumWizardStep::Process);
        assert!(rejection.state.output().is_none());

        let rejection = (*rejection.state).next().unwrap_err();
        assert!(matches!(
            rejection.error,
            ReportError::InvalidTransition { step: "process", .. }
        ));
    }

    #[test]
    fn export_failure_is_serialization_failure_without_report_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "btag.csv", C_BTAG_CSV);
        let path_blocker = write_file(dir.path(), "blocker", "occupied");

        let err = run_report(
            EnumTemplateId::Btag,
            &[path.clone()],
            None,
            &SpecReportOptions {
                dir_out: path_blocker.clone(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::SerializationFailure(_)));

        let state = SpecWizardState::new()
            .select_template(EnumTemplateId::Btag)
            .unwrap()
            .next()
            .unwrap()
            .load_batch(ingest_files(&[path], Some(1)))
            .unwrap()
            .next()
            .unwrap()
            .process(&SpecReportOptions::default())
            .unwrap()
            .next()
            .unwrap();
        let err = state.export(&path_blocker, Utc::now()).unwrap_err();
        assert!(matches!(err, ReportError::SerializationFailure(_)));
        assert_eq!(state.step(), EnumWizardStep::Export);

        let l_reports: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with("report_") && name.ends_with(".xlsx"))
            .collect();
        assert!(l_reports.is_empty());
        assert_eq!(fs::read_to_string(&path_blocker).unwrap(), "occupied");
    }

    #[test]
    fn merge_files_run_skips_broken_input_with_warning() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a.csv", "X,Y\n1,2\n3,4\n");
        let path_bad = write_file(dir.path(), "bad.xlsx", "not a workbook");

        let report = run_report(
            EnumTemplateId::MergeFiles,
            &[path.clone(), path_bad, path],
            None,
            &SpecReportOptions {
                dir_out: dir.path().join("out"),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(report.cnt_files_loaded, 2);
        assert_eq!(report.cnt_files_failed, 1);
        assert_eq!(report.cnt_rows_scanned, 4);
        assert_eq!(report.warning_count(), 1);

        let sheet = read_raw_sheet(Path::new(&report.file_out)).unwrap();
        assert_eq!(sheet.height_data(), 4);
        assert_eq!(sheet.header()[1].to_text(), "Y");
    }

    #[test]
    fn second_step_is_required_when_declared() {
        let dir = tempdir().unwrap();
        let path_prev = write_file(dir.path(), "prev.csv", "ID\nA\n");
        let err = run_report(
            EnumTemplateId::ActiveUsers,
            &[path_prev],
            None,
            &SpecReportOptions {
                dir_out: dir.path().join("out"),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::EmptyInput(_)));
    }

    #[test]
    fn unnamed_result_lands_on_default_sheet() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "btag.csv", C_BTAG_CSV);
        let report = run_report(
            EnumTemplateId::Btag,
            &[path],
            None,
            &SpecReportOptions {
                dir_out: dir.path().join("out"),
                ..Default::default()
            },
        )
        .unwrap();

        let workbook = open_workbook_auto(&report.file_out).unwrap();
        assert_eq!(workbook.sheet_names(), vec![C_SHEET_NAME_DEFAULT.to_string()]);
    }

    #[test]
    fn ipc_payloads_drive_the_same_pipeline() {
        let mut df = df!(
            "ID игрока" => ["1", "2", "3"],
            "Статус 1" => ["ОК", "Отказ", "ОК"],
            "Статус 2" => ["Отказ", "ОК", "ОК"],
        )
        .unwrap();
        let mut v_ipc: Vec<u8> = Vec::new();
        IpcWriter::new(&mut v_ipc).finish(&mut df).unwrap();

        let dir = tempdir().unwrap();
        let report = run_report_from_ipc(
            EnumTemplateId::Btag,
            &[v_ipc],
            None,
            &SpecReportOptions {
                dir_out: dir.path().to_path_buf(),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(report.cnt_rows_scanned, 3);
        assert_eq!(report.metrics["ok_count"], 2.0);
        assert_eq!(report.metrics["ok_refused_count"], 1.0);
        assert_eq!(report.metrics["refused_ok_count"], 1.0);
    }
}
