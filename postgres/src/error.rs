//! Mapping from `sqlx` errors and column types to settlement errors.

use brewspace_core::SettlementError;

/// `exclusion_violation`
const EXCLUSION_VIOLATION: &str = "23P01";
/// `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> SettlementError {
    move |e| SettlementError::Storage(format!("{context}: {e}"))
}

fn has_code(error: &sqlx::Error, code: &str) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|c| c == code)
}

pub(crate) fn is_exclusion_violation(error: &sqlx::Error) -> bool {
    has_code(error, EXCLUSION_VIOLATION)
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    has_code(error, UNIQUE_VIOLATION)
}

pub(crate) fn violates_constraint(error: &sqlx::Error, name: &str) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|c| c == name)
}

pub(crate) fn corrupt(what: impl std::fmt::Display) -> SettlementError {
    SettlementError::Storage(format!("Corrupt row: {what}"))
}

pub(crate) fn to_db_count(value: u32) -> Result<i32, SettlementError> {
    i32::try_from(value).map_err(|_| SettlementError::Storage(format!("Count out of range: {value}")))
}

pub(crate) fn from_db_count(value: i32) -> Result<u32, SettlementError> {
    u32::try_from(value).map_err(|_| corrupt(format!("negative count {value}")))
}

pub(crate) fn from_db_percent(value: i16) -> Result<u8, SettlementError> {
    u8::try_from(value).map_err(|_| corrupt(format!("discount {value}")))
}
