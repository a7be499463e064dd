//! Template registry and static dispatch to the three handlers.

use aiadminka_io_xlsx::{EnumReportResult, SpecRawSheet};

use crate::aggregate::{aggregate_active_users, aggregate_btag, aggregate_merge_files};
use crate::conf::{
    C_DESC_ACTIVE_USERS, C_DESC_BTAG, C_DESC_MERGE_FILES, C_NAME_ACTIVE_USERS, C_NAME_BTAG,
    C_NAME_MERGE_FILES, C_STEP_BTAG, C_STEP_CURRENT_PERIOD, C_STEP_MERGE_FILES,
    C_STEP_PREVIOUS_PERIOD,
};
use crate::layout::{build_active_users_layout, build_btag_layout};
use crate::spec::{
    EnumMatchCountRule, EnumTemplateId, ReportError, SpecFileSlot, SpecFilesConfig,
    SpecReportOptions, SpecTemplateInfo, SpecTemplateOutput,
};

/// One report template: upload contract plus handler.
pub trait ReportTemplate {
    /// Registry entry.
    fn info(&self) -> SpecTemplateInfo;

    /// Aggregate parsed datasets and build the result to serialize.
    fn run(
        &self,
        datasets_step1: &[SpecRawSheet],
        datasets_step2: &[SpecRawSheet],
    ) -> Result<SpecTemplateOutput, ReportError>;
}

fn derive_first_dataset<'a>(
    datasets: &'a [SpecRawSheet],
    dataset: &str,
) -> Result<&'a SpecRawSheet, ReportError> {
    datasets
        .first()
        .ok_or_else(|| ReportError::EmptyInput(format!("dataset `{dataset}` is missing")))
}

////////////////////////////////////////////////////////////////////////////////
// #region Handlers

/// Two-period player comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateActiveUsers {
    /// Match counting rule.
    pub rule_match_count: EnumMatchCountRule,
}

impl ReportTemplate for TemplateActiveUsers {
    fn info(&self) -> SpecTemplateInfo {
        SpecTemplateInfo {
            id: EnumTemplateId::ActiveUsers,
            name: C_NAME_ACTIVE_USERS,
            description: C_DESC_ACTIVE_USERS,
            files_config: SpecFilesConfig {
                step1: SpecFileSlot {
                    name: C_STEP_PREVIOUS_PERIOD,
                    multiple: false,
                },
                step2: Some(SpecFileSlot {
                    name: C_STEP_CURRENT_PERIOD,
                    multiple: false,
                }),
            },
        }
    }

    fn run(
        &self,
        datasets_step1: &[SpecRawSheet],
        datasets_step2: &[SpecRawSheet],
    ) -> Result<SpecTemplateOutput, ReportError> {
        let sheet_prev = derive_first_dataset(datasets_step1, C_STEP_PREVIOUS_PERIOD)?;
        let sheet_current = derive_first_dataset(datasets_step2, C_STEP_CURRENT_PERIOD)?;

        let metrics = aggregate_active_users(
            sheet_prev,
            sheet_current,
            C_STEP_PREVIOUS_PERIOD,
            C_STEP_CURRENT_PERIOD,
            self.rule_match_count,
        )?;
        Ok(SpecTemplateOutput {
            result: EnumReportResult::Layout(build_active_users_layout(&metrics)),
            n_rows_scanned: metrics.n_rows_scanned,
            metrics: metrics.to_dict(),
        })
    }
}

/// Status tallies over one sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateBtag;

impl ReportTemplate for TemplateBtag {
    fn info(&self) -> SpecTemplateInfo {
        SpecTemplateInfo {
            id: EnumTemplateId::Btag,
            name: C_NAME_BTAG,
            description: C_DESC_BTAG,
            files_config: SpecFilesConfig {
                step1: SpecFileSlot {
                    name: C_STEP_BTAG,
                    multiple: false,
                },
                step2: None,
            },
        }
    }

    fn run(
        &self,
        datasets_step1: &[SpecRawSheet],
        _datasets_step2: &[SpecRawSheet],
    ) -> Result<SpecTemplateOutput, ReportError> {
        let sheet = derive_first_dataset(datasets_step1, C_STEP_BTAG)?;
        let metrics = aggregate_btag(sheet, C_STEP_BTAG)?;
        Ok(SpecTemplateOutput {
            result: EnumReportResult::Layout(build_btag_layout(&metrics)),
            n_rows_scanned: metrics.n_rows_scanned,
            metrics: metrics.to_dict(),
        })
    }
}

/// Header-union concatenation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateMergeFiles;

impl ReportTemplate for TemplateMergeFiles {
    fn info(&self) -> SpecTemplateInfo {
        SpecTemplateInfo {
            id: EnumTemplateId::MergeFiles,
            name: C_NAME_MERGE_FILES,
            description: C_DESC_MERGE_FILES,
            files_config: SpecFilesConfig {
                step1: SpecFileSlot {
                    name: C_STEP_MERGE_FILES,
                    multiple: true,
                },
                step2: None,
            },
        }
    }

    fn run(
        &self,
        datasets_step1: &[SpecRawSheet],
        _datasets_step2: &[SpecRawSheet],
    ) -> Result<SpecTemplateOutput, ReportError> {
        let merged = aggregate_merge_files(datasets_step1)?;
        let n_rows_scanned = merged.height_data();
        Ok(SpecTemplateOutput {
            result: EnumReportResult::Table(merged),
            n_rows_scanned,
            metrics: Default::default(),
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Dispatch

/// Registry entry of one template.
pub fn derive_template_info(id: EnumTemplateId) -> SpecTemplateInfo {
    match id {
        EnumTemplateId::ActiveUsers => TemplateActiveUsers::default().info(),
        EnumTemplateId::Btag => TemplateBtag.info(),
        EnumTemplateId::MergeFiles => TemplateMergeFiles.info(),
    }
}

/// Every registered template, in registry order.
pub fn list_templates() -> Vec<SpecTemplateInfo> {
    EnumTemplateId::ALL
        .iter()
        .map(|id| derive_template_info(*id))
        .collect()
}

/// Run the handler of `id` over parsed datasets.
pub fn run_template(
    id: EnumTemplateId,
    options: &SpecReportOptions,
    datasets_step1: &[SpecRawSheet],
    datasets_step2: &[SpecRawSheet],
) -> Result<SpecTemplateOutput, ReportError> {
    tracing::info!(
        template = id.as_str(),
        step1 = datasets_step1.len(),
        step2 = datasets_step2.len(),
        "dispatching template"
    );
    match id {
        EnumTemplateId::ActiveUsers => TemplateActiveUsers {
            rule_match_count: options.rule_match_count,
        }
        .run(datasets_step1, datasets_step2),
        EnumTemplateId::Btag => TemplateBtag.run(datasets_step1, datasets_step2),
        EnumTemplateId::MergeFiles => TemplateMergeFiles.run(datasets_step1, datasets_step2),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use aiadminka_io_xlsx::EnumCellValue;

    use super::*;

    fn ids(values: &[&str]) -> SpecRawSheet {
        let mut rows = vec![vec![EnumCellValue::from("ID игрока")]];
        rows.extend(values.iter().map(|v| vec![EnumCellValue::from(*v)]));
        SpecRawSheet::new(rows)
    }

    #[test]
    fn registry_lists_three_templates_with_upload_steps() {
        let l_infos = list_templates();
        let l_ids: Vec<&str> = l_infos.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(l_ids, vec!["active_users", "btag", "merge_files"]);

        assert!(l_infos[0].files_config.step2.is_some());
        assert!(l_infos[1].files_config.step2.is_none());
        assert!(l_infos[2].files_config.step1.multiple);
        assert!(!l_infos[1].files_config.step1.multiple);
    }

    #[test]
    fn dispatch_uses_the_configured_match_rule() {
        let prev = ids(&["A", "A", "B"]);
        let current = ids(&["A", "B", "B", "C"]);

        let options = SpecReportOptions {
            rule_match_count: EnumMatchCountRule::CurrentRows,
            ..Default::default()
        };
        let output = run_template(
            EnumTemplateId::ActiveUsers,
            &options,
            std::slice::from_ref(&prev),
            std::slice::from_ref(&current),
        )
        .unwrap();

        assert_eq!(output.metrics["count_matches"], 3.0);
        assert_eq!(output.n_rows_scanned, 7);
        assert!(matches!(output.result, EnumReportResult::Layout(_)));
    }

    #[test]
    fn active_users_without_second_dataset_is_empty_input() {
        let prev = ids(&["A"]);
        let err = run_template(
            EnumTemplateId::ActiveUsers,
            &SpecReportOptions::default(),
            &[prev],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::EmptyInput(_)));
    }

    #[test]
    fn merge_files_returns_plain_table() {
        let output = run_template(
            EnumTemplateId::MergeFiles,
            &SpecReportOptions::default(),
            &[ids(&["A"]), ids(&["B", "C"])],
            &[],
        )
        .unwrap();

        let EnumReportResult::Table(table) = output.result else {
            panic!("expected table");
        };
        assert_eq!(table.height_data(), 3);
        assert_eq!(output.n_rows_scanned, 3);
        assert!(output.metrics.is_empty());
    }
}
