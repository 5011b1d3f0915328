use std::sync::Arc;

use dictation_core::model::{LibraryName, Word, WordSelection};
use storage::repository::{AccuracyLedger, LibraryRepository};

use super::progress::SessionProgress;
use super::queries::SessionQueries;
use super::service::{AnswerFeedback, DictationSession, SessionStep};
use crate::Clock;
use crate::error::SessionError;
use crate::speech::SpeechDispatcher;

/// Default number of times each word is spoken.
pub const DEFAULT_REPEAT: u32 = 2;

/// Previews speak each word once.
const PREVIEW_REPEAT: u32 = 1;

/// Result of answering the current word in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerResult {
    pub feedback: AnswerFeedback,
    pub progress: SessionProgress,
}

/// Orchestrates session start, answering and speech prompts.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    libraries: Arc<dyn LibraryRepository>,
    ledger: Arc<dyn AccuracyLedger>,
    speech: Option<SpeechDispatcher>,
    repeat: u32,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        libraries: Arc<dyn LibraryRepository>,
        ledger: Arc<dyn AccuracyLedger>,
    ) -> Self {
        Self {
            clock,
            libraries,
            ledger,
            speech: None,
            repeat: DEFAULT_REPEAT,
        }
    }

    #[must_use]
    pub fn with_speech(mut self, speech: SpeechDispatcher) -> Self {
        self.speech = Some(speech);
        self
    }

    #[must_use]
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    #[must_use]
    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    #[must_use]
    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    /// Start a session over the selected words of a stored library and speak the first word.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the library cannot be loaded, the selection
    /// is invalid or leaves no words.
    pub async fn start_session(
        &self,
        library: &LibraryName,
        selection: &WordSelection,
    ) -> Result<DictationSession, SessionError> {
        let words =
            SessionQueries::working_set(library, selection, self.libraries.as_ref()).await?;
        let session = DictationSession::new(
            library.clone(),
            words,
            Arc::clone(&self.ledger),
            self.clock,
        )?;
        self.replay(&session);
        Ok(session)
    }

    /// Judge an answer for the current word.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for blank answers, out-of-phase calls or ledger failures.
    pub async fn answer_current(
        &self,
        session: &mut DictationSession,
        raw: &str,
    ) -> Result<SessionAnswerResult, SessionError> {
        let feedback = session.submit_answer(raw).await?;
        Ok(SessionAnswerResult {
            feedback,
            progress: session.progress(),
        })
    }

    /// Move to the next word and speak it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the final summary cannot be built.
    pub fn advance(&self, session: &mut DictationSession) -> Result<SessionStep, SessionError> {
        let step = session.advance()?;
        if let SessionStep::Next(_) = step {
            self.replay(session);
        }
        Ok(step)
    }

    /// Speak the selected words once each, in selection order, without starting a session.
    ///
    /// Returns the words that were queued. Without speech nothing is played.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the library cannot be loaded or the selection is invalid.
    pub async fn preview(
        &self,
        library: &LibraryName,
        selection: &WordSelection,
    ) -> Result<Vec<Word>, SessionError> {
        let words =
            SessionQueries::working_set(library, selection, self.libraries.as_ref()).await?;
        if let Some(speech) = &self.speech {
            for word in &words {
                if let Err(e) = speech.play(word.word(), PREVIEW_REPEAT).await {
                    tracing::warn!(word = word.word(), error = %e, "preview playback task failed");
                }
            }
        }
        tracing::debug!(library = %library, words = words.len(), "library previewed");
        Ok(words)
    }

    /// Speak the current word again. Does nothing without speech or once finished.
    pub fn replay(&self, session: &DictationSession) {
        if let (Some(speech), Some(word)) = (&self.speech, session.current_word()) {
            // Playback is detached; failures arrive on the report channel.
            drop(speech.play(word.word(), self.repeat));
        }
    }
}

impl std::fmt::Debug for SessionLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLoopService")
            .field("clock", &self.clock)
            .field("speech", &self.speech.is_some())
            .field("repeat", &self.repeat)
            .finish_non_exhaustive()
    }
}
