//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use dictation_core::model::{LibraryName, LibraryNameError, SelectionError, SessionSummaryError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by dictation sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no words to practice")]
    InvalidSession,
    #[error("no current word: the session is finished")]
    NoCurrentWord,
    #[error("answer is blank")]
    BlankAnswer,
    #[error("the current word was already judged; advance to continue")]
    AwaitingAdvance,
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True for mistakes the user can fix by retrying (blank answer, bad selection).
    #[must_use]
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::BlankAnswer | Self::AwaitingAdvance | Self::Selection(_)
        )
    }
}

/// Errors emitted by `LibraryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryServiceError {
    #[error(transparent)]
    Name(#[from] LibraryNameError),
    #[error("a library needs at least one word")]
    EmptyLibrary,
    #[error("library already exists: {0}")]
    AlreadyExists(LibraryName),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("only .json libraries can be imported: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors reported by a speech output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpeechError {
    #[error("speech engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("speech playback failed: {0}")]
    Playback(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
