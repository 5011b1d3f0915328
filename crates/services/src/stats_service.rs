use std::sync::Arc;

use serde::Serialize;

use dictation_core::model::{AttemptStats, LibraryName};
use storage::repository::AccuracyLedger;

use crate::error::StatsServiceError;

/// Lifetime accuracy of one word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordReport {
    pub word: String,
    pub correct: u32,
    pub total: u32,
    pub accuracy: f64,
}

/// Lifetime accuracy of a library, words sorted by spelling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryReport {
    pub library: LibraryName,
    pub total_correct: u64,
    pub total_attempts: u64,
    pub accuracy: f64,
    pub words: Vec<WordReport>,
}

impl LibraryReport {
    /// No word of the library was attempted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Read-only views over the accuracy ledger.
#[derive(Clone)]
pub struct StatsService {
    ledger: Arc<dyn AccuracyLedger>,
}

impl StatsService {
    #[must_use]
    pub fn new(ledger: Arc<dyn AccuracyLedger>) -> Self {
        Self { ledger }
    }

    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` if the ledger cannot be read.
    pub async fn library_report(
        &self,
        library: &LibraryName,
    ) -> Result<LibraryReport, StatsServiceError> {
        let stats = self.ledger.get_library_stats(library).await?;
        let words = stats
            .words()
            .iter()
            .map(|(word, s)| WordReport {
                word: word.clone(),
                correct: s.correct(),
                total: s.total(),
                accuracy: s.accuracy(),
            })
            .collect();

        Ok(LibraryReport {
            library: library.clone(),
            total_correct: stats.total_correct(),
            total_attempts: stats.total_attempts(),
            accuracy: stats.accuracy(),
            words,
        })
    }

    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` if the ledger cannot be read.
    pub async fn word_stats(
        &self,
        library: &LibraryName,
        word: &str,
    ) -> Result<AttemptStats, StatsServiceError> {
        Ok(self.ledger.get_attempt_stats(library, word).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn report_sums_words_in_order() {
        let repo = Arc::new(InMemoryRepository::new());
        let animals = LibraryName::new("animals").unwrap();
        repo.record_attempt(&animals, "dog", true).await.unwrap();
        repo.record_attempt(&animals, "cat", true).await.unwrap();
        repo.record_attempt(&animals, "cat", false).await.unwrap();

        let report = StatsService::new(repo).library_report(&animals).await.unwrap();
        assert_eq!(report.total_correct, 2);
        assert_eq!(report.total_attempts, 3);
        let order: Vec<&str> = report.words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(order, vec!["cat", "dog"]);
        assert!((report.words[0].accuracy - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_library_reports_nothing() {
        let service = StatsService::new(Arc::new(InMemoryRepository::new()));
        let plants = LibraryName::new("plants").unwrap();
        let report = service.library_report(&plants).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(
            service.word_stats(&plants, "fern").await.unwrap(),
            AttemptStats::empty()
        );
    }
}
