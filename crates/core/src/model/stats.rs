use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::library::LibraryName;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("attempt counter overflow")]
    Overflow,
}

/// Lifetime correct/total counters for one (library, word) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttemptStats {
    correct: u32,
    total: u32,
}

impl AttemptStats {
    /// Rehydrate counters from storage.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::CorrectExceedsTotal` if `correct > total`.
    pub fn new(correct: u32, total: u32) -> Result<Self, StatsError> {
        if correct > total {
            return Err(StatsError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self { correct, total })
    }

    /// Counters for a pair that has never been attempted.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Counters after one more judged attempt.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Overflow` if `total` cannot be incremented.
    pub fn record(self, was_correct: bool) -> Result<Self, StatsError> {
        let total = self.total.checked_add(1).ok_or(StatsError::Overflow)?;
        let correct = if was_correct {
            self.correct + 1
        } else {
            self.correct
        };
        Ok(Self { correct, total })
    }

    /// Fraction of correct attempts in `[0, 1]`; 0 when never attempted.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(u64::from(self.correct), u64::from(self.total))
    }
}

/// All ledger records of a library, ordered by word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryStats {
    library: LibraryName,
    words: BTreeMap<String, AttemptStats>,
}

impl LibraryStats {
    #[must_use]
    pub fn new(library: LibraryName, words: BTreeMap<String, AttemptStats>) -> Self {
        Self { library, words }
    }

    #[must_use]
    pub fn library(&self) -> &LibraryName {
        &self.library
    }

    #[must_use]
    pub fn words(&self) -> &BTreeMap<String, AttemptStats> {
        &self.words
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<AttemptStats> {
        self.words.get(word).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn total_correct(&self) -> u64 {
        self.words.values().map(|s| u64::from(s.correct)).sum()
    }

    #[must_use]
    pub fn total_attempts(&self) -> u64 {
        self.words.values().map(|s| u64::from(s.total)).sum()
    }

    /// `sum(correct) / sum(total)`, or 0 when nothing has been attempted.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.total_correct(), self.total_attempts())
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(correct: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}
