use std::collections::BTreeMap;

use dictation_core::model::{AttemptStats, LibraryName, LibraryStats};

use super::SqliteRepository;
use super::mapping::{stats_from_row, word_from_row};
use crate::repository::{AccuracyLedger, StorageError};

#[async_trait::async_trait]
impl AccuracyLedger for SqliteRepository {
    async fn record_attempt(
        &self,
        library: &LibraryName,
        word: &str,
        was_correct: bool,
    ) -> Result<AttemptStats, StorageError> {
        // One statement, so the increment is applied atomically per key.
        // A full counter matches no row and is left as it was.
        let row = sqlx::query(
            r"
            INSERT INTO attempt_stats (library_name, word, correct, total)
            VALUES (?1, ?2, ?3, 1)
            ON CONFLICT(library_name, word) DO UPDATE SET
                correct = attempt_stats.correct + excluded.correct,
                total = attempt_stats.total + 1
            WHERE attempt_stats.total < ?4
            RETURNING correct, total
            ",
        )
        .bind(library.as_str())
        .bind(word)
        .bind(i64::from(was_correct))
        .bind(i64::from(u32::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::warn!(library = %library, word, error = %e, "ledger write failed");
            StorageError::Connection(e.to_string())
        })?;

        let Some(row) = row else {
            tracing::warn!(library = %library, word, "attempt counter is full");
            return Err(StorageError::CounterOverflow {
                library: library.clone(),
                word: word.to_owned(),
            });
        };
        stats_from_row(&row)
    }

    async fn get_attempt_stats(
        &self,
        library: &LibraryName,
        word: &str,
    ) -> Result<AttemptStats, StorageError> {
        let row = sqlx::query(
            r"
            SELECT correct, total
            FROM attempt_stats
            WHERE library_name = ?1 AND word = ?2
            ",
        )
        .bind(library.as_str())
        .bind(word)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => stats_from_row(&row),
            None => Ok(AttemptStats::empty()),
        }
    }

    async fn get_library_stats(&self, library: &LibraryName) -> Result<LibraryStats, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT word, correct, total
            FROM attempt_stats
            WHERE library_name = ?1
            ORDER BY word ASC
            ",
        )
        .bind(library.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut words = BTreeMap::new();
        for row in rows {
            words.insert(word_from_row(&row)?, stats_from_row(&row)?);
        }
        Ok(LibraryStats::new(library.clone(), words))
    }
}
