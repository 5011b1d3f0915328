use async_trait::async_trait;
use dictation_core::model::{AttemptStats, Library, LibraryName, LibraryStats, Word};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("library not found: {0}")]
    LibraryNotFound(LibraryName),

    #[error("library {library} is malformed: {reason}")]
    MalformedLibrary { library: String, reason: String },

    #[error("attempt counter for {word} in {library} is at its limit")]
    CounterOverflow { library: LibraryName, word: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Durable per-(library, word) correct/total counters.
#[async_trait]
pub trait AccuracyLedger: Send + Sync {
    /// Count one judged attempt, creating the record on first use.
    ///
    /// Either the whole increment applies or an error is returned and the
    /// previous counters are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the increment cannot be persisted.
    async fn record_attempt(
        &self,
        library: &LibraryName,
        word: &str,
        was_correct: bool,
    ) -> Result<AttemptStats, StorageError>;

    /// Counters for one word; `0/0` when it was never attempted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read.
    async fn get_attempt_stats(
        &self,
        library: &LibraryName,
        word: &str,
    ) -> Result<AttemptStats, StorageError>;

    /// Every record stored for a library.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn get_library_stats(&self, library: &LibraryName) -> Result<LibraryStats, StorageError>;
}

/// Named word lists.
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Names of all stored libraries, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be listed.
    async fn list_libraries(&self) -> Result<Vec<LibraryName>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::LibraryNotFound` if the name is unknown and
    /// `StorageError::MalformedLibrary` if its contents are not valid words.
    async fn load_library(&self, name: &LibraryName) -> Result<Library, StorageError>;

    /// Create or replace a library.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the library cannot be written.
    async fn save_library(&self, library: &Library) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be queried.
    async fn library_exists(&self, name: &LibraryName) -> Result<bool, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    stats: Arc<Mutex<HashMap<(LibraryName, String), AttemptStats>>>,
    libraries: Arc<Mutex<HashMap<LibraryName, Vec<Word>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl AccuracyLedger for InMemoryRepository {
    async fn record_attempt(
        &self,
        library: &LibraryName,
        word: &str,
        was_correct: bool,
    ) -> Result<AttemptStats, StorageError> {
        let mut guard = self.stats.lock().map_err(poisoned)?;
        let key = (library.clone(), word.to_owned());
        let current = guard.get(&key).copied().unwrap_or_default();
        let updated = current
            .record(was_correct)
            .map_err(|_| StorageError::CounterOverflow {
                library: library.clone(),
                word: word.to_owned(),
            })?;
        guard.insert(key, updated);
        Ok(updated)
    }

    async fn get_attempt_stats(
        &self,
        library: &LibraryName,
        word: &str,
    ) -> Result<AttemptStats, StorageError> {
        let guard = self.stats.lock().map_err(poisoned)?;
        Ok(guard
            .get(&(library.clone(), word.to_owned()))
            .copied()
            .unwrap_or_default())
    }

    async fn get_library_stats(&self, library: &LibraryName) -> Result<LibraryStats, StorageError> {
        let guard = self.stats.lock().map_err(poisoned)?;
        let words: BTreeMap<String, AttemptStats> = guard
            .iter()
            .filter(|((lib, _), _)| lib == library)
            .map(|((_, word), stats)| (word.clone(), *stats))
            .collect();
        Ok(LibraryStats::new(library.clone(), words))
    }
}

#[async_trait]
impl LibraryRepository for InMemoryRepository {
    async fn list_libraries(&self) -> Result<Vec<LibraryName>, StorageError> {
        let guard = self.libraries.lock().map_err(poisoned)?;
        let mut names: Vec<LibraryName> = guard.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn load_library(&self, name: &LibraryName) -> Result<Library, StorageError> {
        let guard = self.libraries.lock().map_err(poisoned)?;
        guard
            .get(name)
            .map(|words| Library::new(name.clone(), words.clone()))
            .ok_or_else(|| StorageError::LibraryNotFound(name.clone()))
    }

    async fn save_library(&self, library: &Library) -> Result<(), StorageError> {
        let mut guard = self.libraries.lock().map_err(poisoned)?;
        guard.insert(library.name().clone(), library.words().to_vec());
        Ok(())
    }

    async fn library_exists(&self, name: &LibraryName) -> Result<bool, StorageError> {
        let guard = self.libraries.lock().map_err(poisoned)?;
        Ok(guard.contains_key(name))
    }
}

/// Aggregates the ledger and library store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub ledger: Arc<dyn AccuracyLedger>,
    pub libraries: Arc<dyn LibraryRepository>,
    pub(crate) sqlite: Option<crate::sqlite::SqliteRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let ledger: Arc<dyn AccuracyLedger> = Arc::new(repo.clone());
        let libraries: Arc<dyn LibraryRepository> = Arc::new(repo);
        Self {
            ledger,
            libraries,
            sqlite: None,
        }
    }

    /// Release the database connection pool, if any. Later ledger calls fail.
    pub async fn close(&self) {
        if let Some(repo) = &self.sqlite {
            repo.close().await;
        }
    }
}
