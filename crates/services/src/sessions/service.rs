use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::sync::Arc;

use dictation_core::Clock;
use dictation_core::model::{LibraryName, SessionPhase, SessionSummary, Word};
use storage::repository::AccuracyLedger;

use super::plan::WordPool;
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Outcome of judging one answer, with the word's lifetime counters.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_word: String,
    pub meaning: String,
    pub attempt_correct_count: u32,
    pub attempt_total_count: u32,
}

impl AnswerFeedback {
    /// Lifetime accuracy of this word in `[0, 1]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.attempt_total_count == 0 {
            0.0
        } else {
            f64::from(self.attempt_correct_count) / f64::from(self.attempt_total_count)
        }
    }
}

/// What `advance` moved the session to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    Next(Word),
    Finished(SessionSummary),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One dictation run over a working set.
///
/// Each word is drawn once, in random order. Answers are judged ignoring case
/// and surrounding whitespace and every judgment is counted in the ledger
/// before the session's own score moves.
pub struct DictationSession {
    library: LibraryName,
    pool: WordPool,
    current: Option<Word>,
    phase: SessionPhase,
    score: u32,
    attempts: u32,
    feedback: Option<AnswerFeedback>,
    ledger: Arc<dyn AccuracyLedger>,
    clock: Clock,
    rng: StdRng,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl DictationSession {
    /// Start a session and draw the first word.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSession` if `words` is empty.
    pub fn new(
        library: LibraryName,
        words: Vec<Word>,
        ledger: Arc<dyn AccuracyLedger>,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        Self::with_rng(library, words, ledger, clock, StdRng::from_os_rng())
    }

    /// Like `new`, drawing words from the given generator.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSession` if `words` is empty.
    pub fn with_rng(
        library: LibraryName,
        words: Vec<Word>,
        ledger: Arc<dyn AccuracyLedger>,
        clock: Clock,
        mut rng: StdRng,
    ) -> Result<Self, SessionError> {
        let mut pool = WordPool::new(words);
        let Some(first) = pool.draw(&mut rng) else {
            return Err(SessionError::InvalidSession);
        };

        tracing::info!(library = %library, words = pool.word_count(), "dictation session started");

        Ok(Self {
            library,
            pool,
            current: Some(first),
            phase: SessionPhase::AwaitingAnswer,
            score: 0,
            attempts: 0,
            feedback: None,
            ledger,
            clock,
            rng,
            started_at: clock.now(),
            completed_at: None,
        })
    }

    #[must_use]
    pub fn library(&self) -> &LibraryName {
        &self.library
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    /// The word being asked, or `None` once finished.
    #[must_use]
    pub fn current_word(&self) -> Option<&Word> {
        self.current.as_ref()
    }

    /// Feedback for the current word while in `SessionPhase::Feedback`.
    #[must_use]
    pub fn last_feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
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
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.pool.word_count(),
            drawn: self.pool.used_count(),
            remaining: self.pool.remaining(),
            attempts: self.attempts,
            score: self.score,
            is_complete: self.is_finished(),
        }
    }

    /// Current `(score, attempts)` with timestamps. Final once the session is finished.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the counters are inconsistent.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        Ok(SessionSummary::new(
            self.library.clone(),
            self.score,
            self.attempts,
            self.pool.word_count(),
            self.started_at,
            self.completed_at,
        )?)
    }

    /// Move to the next undrawn word, or finish when none is left.
    ///
    /// Skips the current word if it has not been answered. On a finished
    /// session this returns the final summary again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the final summary cannot be built.
    pub fn advance(&mut self) -> Result<SessionStep, SessionError> {
        if self.is_finished() {
            return Ok(SessionStep::Finished(self.summary()?));
        }

        if let (SessionPhase::AwaitingAnswer, Some(word)) = (self.phase, &self.current) {
            tracing::debug!(library = %self.library, word = word.word(), "word skipped");
        }

        self.feedback = None;
        match self.pool.draw(&mut self.rng) {
            Some(word) => {
                self.current = Some(word.clone());
                self.phase = SessionPhase::AwaitingAnswer;
                Ok(SessionStep::Next(word))
            }
            None => {
                self.current = None;
                self.phase = SessionPhase::Finished;
                self.completed_at = Some(self.clock.now().max(self.started_at));
                let summary = self.summary()?;
                tracing::info!(
                    library = %self.library,
                    score = summary.score(),
                    attempts = summary.attempts(),
                    "dictation session finished"
                );
                Ok(SessionStep::Finished(summary))
            }
        }
    }

    /// Judge an answer for the current word and count it in the ledger.
    ///
    /// # Errors
    ///
    /// - `SessionError::NoCurrentWord` if the session is finished.
    /// - `SessionError::AwaitingAdvance` if the current word was already judged.
    /// - `SessionError::BlankAnswer` if `raw` is empty or whitespace.
    /// - `SessionError::Storage` if the ledger rejects the attempt; the session
    ///   is left unchanged.
    pub async fn submit_answer(&mut self, raw: &str) -> Result<AnswerFeedback, SessionError> {
        match self.phase {
            SessionPhase::Finished => return Err(SessionError::NoCurrentWord),
            SessionPhase::Feedback => return Err(SessionError::AwaitingAdvance),
            SessionPhase::AwaitingAnswer => {}
        }
        let word = self.current.clone().ok_or(SessionError::NoCurrentWord)?;
        if raw.trim().is_empty() {
            return Err(SessionError::BlankAnswer);
        }

        let is_correct = word.is_spelled_by(raw);
        let stats = self
            .ledger
            .record_attempt(&self.library, word.word(), is_correct)
            .await?;

        self.attempts += 1;
        if is_correct {
            self.score += 1;
        }

        let feedback = AnswerFeedback {
            is_correct,
            correct_word: word.word().to_owned(),
            meaning: word.meaning().to_owned(),
            attempt_correct_count: stats.correct(),
            attempt_total_count: stats.total(),
        };
        self.feedback = Some(feedback.clone());
        self.phase = SessionPhase::Feedback;
        Ok(feedback)
    }
}

impl fmt::Debug for DictationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictationSession")
            .field("library", &self.library)
            .field("words", &self.pool.word_count())
            .field("drawn", &self.pool.used_count())
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("attempts", &self.attempts)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dictation_core::model::{AttemptStats, LibraryStats};
    use dictation_core::time::{fixed_clock, fixed_now};
    use std::collections::HashSet;
    use storage::repository::{InMemoryRepository, StorageError};

    fn lib() -> LibraryName {
        LibraryName::new("animals").unwrap()
    }

    fn words(pairs: &[(&str, &str)]) -> Vec<Word> {
        pairs
            .iter()
            .map(|(w, m)| Word::new(*w, *m).unwrap())
            .collect()
    }

    fn session_with(repo: &InMemoryRepository, list: Vec<Word>, seed: u64) -> DictationSession {
        DictationSession::with_rng(
            lib(),
            list,
            Arc::new(repo.clone()),
            fixed_clock(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    struct FailingLedger;

    #[async_trait]
    impl AccuracyLedger for FailingLedger {
        async fn record_attempt(
            &self,
            _library: &LibraryName,
            _word: &str,
            _was_correct: bool,
        ) -> Result<AttemptStats, StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }

        async fn get_attempt_stats(
            &self,
            _library: &LibraryName,
            _word: &str,
        ) -> Result<AttemptStats, StorageError> {
            Ok(AttemptStats::empty())
        }

        async fn get_library_stats(
            &self,
            library: &LibraryName,
        ) -> Result<LibraryStats, StorageError> {
            Ok(LibraryStats::new(library.clone(), Default::default()))
        }
    }

    #[test]
    fn empty_word_list_is_invalid() {
        let repo = InMemoryRepository::new();
        let err = DictationSession::new(lib(), Vec::new(), Arc::new(repo), fixed_clock())
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidSession));
    }

    #[test]
    fn new_session_awaits_an_answer() {
        let repo = InMemoryRepository::new();
        let session = session_with(&repo, words(&[("cat", "猫")]), 1);
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
        assert_eq!(session.current_word().unwrap().word(), "cat");
        assert_eq!(session.progress().drawn, 1);
        assert_eq!(session.started_at(), fixed_now());
    }

    #[tokio::test]
    async fn full_session_visits_each_identity_once() {
        let repo = InMemoryRepository::new();
        let list = words(&[("cat", "猫"), ("dog", "狗"), ("fox", "狐狸"), ("CAT", "猫猫")]);
        let mut session = session_with(&repo, list, 42);

        let mut seen = HashSet::new();
        loop {
            let word = session.current_word().unwrap().clone();
            assert!(seen.insert(word.key()));
            session.submit_answer(word.word()).await.unwrap();
            if let SessionStep::Finished(summary) = session.advance().unwrap() {
                assert_eq!(summary.score(), 3);
                assert_eq!(summary.attempts(), 3);
                assert_eq!(summary.words_total(), 3);
                break;
            }
        }
        assert_eq!(seen.len(), 3);
        assert!(session.is_finished());
        assert_eq!(session.completed_at(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn answers_are_case_and_whitespace_insensitive() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, words(&[("apple", "苹果")]), 3);
        let feedback = session.submit_answer(" Apple  ").await.unwrap();
        assert!(feedback.is_correct);
        assert_eq!(feedback.correct_word, "apple");
        assert_eq!(feedback.meaning, "苹果");
        assert_eq!(
            (feedback.attempt_correct_count, feedback.attempt_total_count),
            (1, 1)
        );
    }

    #[tokio::test]
    async fn blank_answer_keeps_state_and_allows_retry() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, words(&[("cat", "猫")]), 3);

        let err = session.submit_answer("   ").await.unwrap_err();
        assert!(matches!(err, SessionError::BlankAnswer));
        assert!(err.is_user_input());
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
        assert_eq!(session.attempts(), 0);

        let feedback = session.submit_answer("cat").await.unwrap();
        assert!(feedback.is_correct);
        assert_eq!(session.phase(), SessionPhase::Feedback);
    }

    #[tokio::test]
    async fn second_answer_for_same_word_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, words(&[("cat", "猫"), ("dog", "狗")]), 3);
        session.submit_answer("wrong").await.unwrap();
        let err = session.submit_answer("again").await.unwrap_err();
        assert!(matches!(err, SessionError::AwaitingAdvance));
        assert_eq!(session.attempts(), 1);
    }

    #[tokio::test]
    async fn finished_session_rejects_answers_and_keeps_summary() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, words(&[("cat", "猫")]), 3);
        session.submit_answer("cat").await.unwrap();
        let first = session.advance().unwrap();
        let SessionStep::Finished(summary) = first else {
            panic!("expected finish");
        };

        let err = session.submit_answer("cat").await.unwrap_err();
        assert!(matches!(err, SessionError::NoCurrentWord));
        assert_eq!(session.advance().unwrap(), SessionStep::Finished(summary.clone()));
        assert_eq!(session.summary().unwrap(), summary);
    }

    #[tokio::test]
    async fn skipping_draws_next_without_counting() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, words(&[("cat", "猫"), ("dog", "狗")]), 9);
        let skipped = session.current_word().unwrap().clone();

        let SessionStep::Next(next) = session.advance().unwrap() else {
            panic!("expected a second word");
        };
        assert_ne!(next.key(), skipped.key());
        assert_eq!(session.attempts(), 0);
        let stats = repo.get_attempt_stats(&lib(), skipped.word()).await.unwrap();
        assert_eq!(stats.total(), 0);
    }

    #[tokio::test]
    async fn ledger_failure_leaves_session_unchanged() {
        let mut session = DictationSession::with_rng(
            lib(),
            words(&[("cat", "猫")]),
            Arc::new(FailingLedger),
            fixed_clock(),
            StdRng::seed_from_u64(0),
        )
        .unwrap();

        let err = session.submit_answer("cat").await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
        assert_eq!((session.score(), session.attempts()), (0, 0));
        assert!(session.last_feedback().is_none());
    }

    #[tokio::test]
    async fn cat_right_dog_wrong_scores_one_of_two() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, words(&[("cat", "猫"), ("dog", "狗")]), 5);

        loop {
            let word = session.current_word().unwrap().clone();
            let answer = if word.word() == "cat" { "cat" } else { "dgo" };
            let feedback = session.submit_answer(answer).await.unwrap();
            assert_eq!(feedback.is_correct, word.word() == "cat");
            if let SessionStep::Finished(summary) = session.advance().unwrap() {
                assert_eq!((summary.score(), summary.attempts()), (1, 2));
                break;
            }
        }

        let dog = repo.get_attempt_stats(&lib(), "dog").await.unwrap();
        assert_eq!((dog.correct(), dog.total()), (0, 1));
        let cat = repo.get_attempt_stats(&lib(), "cat").await.unwrap();
        assert_eq!((cat.correct(), cat.total()), (1, 1));
    }
}
