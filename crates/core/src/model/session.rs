use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::library::LibraryName;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("score ({score}) exceeds attempts ({attempts})")]
    ScoreExceedsAttempts { score: u32, attempts: u32 },
}

/// Where a dictation session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// A current word is shown and has not been judged yet.
    AwaitingAnswer,
    /// The current word was judged; the result is visible until the next advance.
    Feedback,
    /// Every word of the working set has been drawn.
    Finished,
}

impl SessionPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingAnswer => "awaiting_answer",
            Self::Feedback => "feedback",
            Self::Finished => "finished",
        }
    }
}

/// Score of a dictation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    library: LibraryName,
    score: u32,
    attempts: u32,
    words_total: usize,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    /// # Errors
    ///
    /// Returns `SessionSummaryError` if `score > attempts` or the time range is inverted.
    pub fn new(
        library: LibraryName,
        score: u32,
        attempts: u32,
        words_total: usize,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SessionSummaryError> {
        if score > attempts {
            return Err(SessionSummaryError::ScoreExceedsAttempts { score, attempts });
        }
        if completed_at.is_some_and(|done| done < started_at) {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        Ok(Self {
            library,
            score,
            attempts,
            words_total,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn library(&self) -> &LibraryName {
        &self.library
    }

    /// Number of correct answers.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of judged answers. Skipped words are not counted.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Distinct words in the working set.
    #[must_use]
    pub fn words_total(&self) -> usize {
        self.words_total
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.score) / f64::from(self.attempts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_score_above_attempts() {
        let err = SessionSummary::new(
            LibraryName::new("lib").unwrap(),
            2,
            1,
            2,
            fixed_now(),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SessionSummaryError::ScoreExceedsAttempts {
                score: 2,
                attempts: 1
            }
        );
    }

    #[test]
    fn rejects_inverted_time_range() {
        let err = SessionSummary::new(
            LibraryName::new("lib").unwrap(),
            0,
            0,
            1,
            fixed_now(),
            Some(fixed_now() - chrono::Duration::seconds(1)),
        )
        .unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn accuracy_is_score_over_attempts() {
        let summary = SessionSummary::new(
            LibraryName::new("lib").unwrap(),
            1,
            2,
            2,
            fixed_now(),
            Some(fixed_now()),
        )
        .unwrap();
        assert!(summary.is_complete());
        assert!((summary.accuracy() - 0.5).abs() < f64::EPSILON);
    }
}
