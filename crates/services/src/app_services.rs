use std::path::PathBuf;
use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::library_service::LibraryService;
use crate::sessions::SessionLoopService;
use crate::speech::SpeechDispatcher;
use crate::stats_service::StatsService;

/// Assembles app-facing services over one process-scoped storage handle.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    session_loop: Arc<SessionLoopService>,
    libraries: Arc<LibraryService>,
    stats: Arc<StatsService>,
}

impl AppServices {
    /// Build services backed by a `SQLite` ledger and a directory of library documents.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        library_root: impl Into<PathBuf>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, library_root).await?;
        Ok(Self::from_storage(storage, clock))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            Arc::clone(&storage.libraries),
            Arc::clone(&storage.ledger),
        ));
        let libraries = Arc::new(LibraryService::new(Arc::clone(&storage.libraries)));
        let stats = Arc::new(StatsService::new(Arc::clone(&storage.ledger)));
        Self {
            storage,
            session_loop,
            libraries,
            stats,
        }
    }

    /// Speak words through `speech`, `repeat` times each.
    #[must_use]
    pub fn with_speech(mut self, speech: SpeechDispatcher, repeat: u32) -> Self {
        let session_loop = (*self.session_loop)
            .clone()
            .with_speech(speech)
            .with_repeat(repeat);
        self.session_loop = Arc::new(session_loop);
        self
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn libraries(&self) -> Arc<LibraryService> {
        Arc::clone(&self.libraries)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    /// Release storage. Sessions still holding the ledger fail on their next answer.
    pub async fn shutdown(&self) {
        self.storage.close().await;
        tracing::debug!("storage closed");
    }
}
