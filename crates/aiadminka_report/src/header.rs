//! Header resolution by logical field name.

use aiadminka_io_xlsx::{EnumCellValue, SpecRawSheet};

use crate::spec::{ReportError, SpecLogicalField, SpecMissingColumn};

/// Header text as compared during resolution.
pub fn normalize_header(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Index of the first header cell matching any candidate.
///
/// Cells and candidates are compared trimmed and lower-cased.
pub fn resolve_header_index<S: AsRef<str>>(
    header_row: &[EnumCellValue],
    candidates: &[S],
) -> Option<usize> {
    let l_candidates: Vec<String> = candidates
        .iter()
        .map(|c| normalize_header(c.as_ref()))
        .collect();

    header_row.iter().position(|cell| {
        let c_cell = normalize_header(&cell.to_text());
        !c_cell.is_empty() && l_candidates.iter().any(|c| *c == c_cell)
    })
}

/// Resolve every field against one sheet's header row.
///
/// Unresolved fields are appended to `missing` instead of failing, so the
/// caller can report all of them at once.
pub fn resolve_fields(
    sheet: &SpecRawSheet,
    dataset: &str,
    fields: &[SpecLogicalField],
    missing: &mut Vec<SpecMissingColumn>,
) -> Vec<Option<usize>> {
    fields
        .iter()
        .map(|field| {
            let idx = resolve_header_index(sheet.header(), field.synonyms);
            if let Some(col_idx) = idx {
                tracing::debug!(dataset, field = field.name, col_idx, "column resolved");
            } else {
                missing.push(SpecMissingColumn {
                    dataset: dataset.to_string(),
                    field: field.name.to_string(),
                    synonyms: field.synonyms.iter().map(|s| s.to_string()).collect(),
                });
            }
            idx
        })
        .collect()
}

/// Turn collected misses into a single `MissingColumn` failure.
pub fn ensure_no_missing(missing: Vec<SpecMissingColumn>) -> Result<(), ReportError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingColumn(missing))
    }
}

/// Resolve fields of one sheet, failing on any miss.
pub fn resolve_required_fields(
    sheet: &SpecRawSheet,
    dataset: &str,
    fields: &[SpecLogicalField],
) -> Result<Vec<usize>, ReportError> {
    let mut l_missing = Vec::new();
    let l_idx = resolve_fields(sheet, dataset, fields, &mut l_missing);
    ensure_no_missing(l_missing)?;
    Ok(l_idx.into_iter().flatten().collect())
}
