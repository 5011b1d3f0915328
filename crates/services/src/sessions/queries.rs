use dictation_core::model::{LibraryName, Word, WordSelection};
use storage::repository::LibraryRepository;

use crate::error::SessionError;

/// Storage-backed lookups used to start sessions.
pub(crate) struct SessionQueries;

impl SessionQueries {
    /// Load a library and apply the selection to it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the library cannot be loaded,
    /// `SessionError::Selection` when the selection does not fit it and
    /// `SessionError::InvalidSession` when the result holds no words.
    pub async fn working_set(
        name: &LibraryName,
        selection: &WordSelection,
        libraries: &dyn LibraryRepository,
    ) -> Result<Vec<Word>, SessionError> {
        let library = libraries.load_library(name).await?;
        if library.is_empty() {
            return Err(SessionError::InvalidSession);
        }
        Ok(library.select(selection)?)
    }
}
