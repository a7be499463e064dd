//! Template constants: logical fields, status literals, layout columns.

use crate::spec::SpecLogicalField;

////////////////////////////////////////////////////////////////////////////////
// #region LogicalFields

/// Player identifier column.
pub const FIELD_PLAYER_ID: SpecLogicalField = SpecLogicalField {
    name: "playerId",
    synonyms: &["ID игрока", "ID пользователя", "Player ID", "PlayerId", "ID"],
};

/// First status column of the B-TAG sheet.
pub const FIELD_STATUS_1: SpecLogicalField = SpecLogicalField {
    name: "status1",
    synonyms: &["Статус 1", "Статус1", "Status 1", "Status1"],
};

/// Second status column of the B-TAG sheet.
pub const FIELD_STATUS_2: SpecLogicalField = SpecLogicalField {
    name: "status2",
    synonyms: &["Статус 2", "Статус2", "Status 2", "Status2"],
};

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StatusLiterals

/// Approved status text.
pub const C_STATUS_OK: &str = "ОК";
/// Refused status text.
pub const C_STATUS_REFUSED: &str = "Отказ";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutText

/// Header text of a count sub-column.
pub const C_HEADER_COUNT: &str = "Кол-во";
/// Header text of a percent sub-column.
pub const C_HEADER_PERCENT: &str = "%";

/// Default width of a data column.
pub const N_WIDTH_DATA: f64 = 16.0;
/// Width of a count/percent sub-column.
pub const N_WIDTH_SUB: f64 = 12.0;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TemplateMeta

/// Active-Users display name.
pub const C_NAME_ACTIVE_USERS: &str = "Активные пользователи";
/// Active-Users description.
pub const C_DESC_ACTIVE_USERS: &str =
    "Сравнение игроков двух периодов: совпадения, новые и отток.";
/// B-TAG display name.
pub const C_NAME_BTAG: &str = "B-TAG";
/// B-TAG description.
pub const C_DESC_BTAG: &str = "Подсчет статусов ОК/Отказ и переходов между ними.";
/// Merge-Files display name.
pub const C_NAME_MERGE_FILES: &str = "Объединение файлов";
/// Merge-Files description.
pub const C_DESC_MERGE_FILES: &str = "Склеивает строки нескольких файлов по общим заголовкам.";

/// Dataset label of the Active-Users first step.
pub const C_STEP_PREVIOUS_PERIOD: &str = "Прошлый период";
/// Dataset label of the Active-Users second step.
pub const C_STEP_CURRENT_PERIOD: &str = "Текущий период";
/// Dataset label of the B-TAG upload step.
pub const C_STEP_BTAG: &str = "Файл B-TAG";
/// Dataset label of the Merge-Files upload step.
pub const C_STEP_MERGE_FILES: &str = "Файлы для объединения";

// #endregion
////////////////////////////////////////////////////////////////////////////////
