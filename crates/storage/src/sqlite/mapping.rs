use dictation_core::model::AttemptStats;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn count_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn stats_from_row(row: &SqliteRow) -> Result<AttemptStats, StorageError> {
    let correct = count_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let total = count_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    AttemptStats::new(correct, total).map_err(ser)
}

pub(crate) fn word_from_row(row: &SqliteRow) -> Result<String, StorageError> {
    row.try_get::<String, _>("word").map_err(ser)
}
