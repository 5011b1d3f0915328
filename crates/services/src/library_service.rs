use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use dictation_core::model::{Library, LibraryName, Word, WordSelection};
use storage::json::{decode_words, encode_words, write_atomically};
use storage::repository::{LibraryRepository, StorageError};

use crate::error::LibraryServiceError;

const IMPORT_EXTENSION: &str = "json";

/// Upper bound on `stem_N` candidates tried when an import name is taken.
const MAX_IMPORT_SUFFIX: u32 = 10_000;

/// Authoring, import and export of word libraries.
#[derive(Clone)]
pub struct LibraryService {
    libraries: Arc<dyn LibraryRepository>,
}

impl LibraryService {
    #[must_use]
    pub fn new(libraries: Arc<dyn LibraryRepository>) -> Self {
        Self { libraries }
    }

    /// # Errors
    ///
    /// Returns `LibraryServiceError::Storage` if the store cannot be listed.
    pub async fn list_libraries(&self) -> Result<Vec<LibraryName>, LibraryServiceError> {
        Ok(self.libraries.list_libraries().await?)
    }

    /// # Errors
    ///
    /// Returns `LibraryServiceError::Storage` if the library is missing or malformed.
    pub async fn load_library(&self, name: &LibraryName) -> Result<Library, LibraryServiceError> {
        Ok(self.libraries.load_library(name).await?)
    }

    /// Create a library from a raw name and its words.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::Name` for an invalid name,
    /// `LibraryServiceError::EmptyLibrary` for an empty word list and
    /// `LibraryServiceError::AlreadyExists` if the name is taken and
    /// `overwrite` is false.
    pub async fn create_library(
        &self,
        name: &str,
        words: Vec<Word>,
        overwrite: bool,
    ) -> Result<LibraryName, LibraryServiceError> {
        let name = LibraryName::new(name)?;
        if words.is_empty() {
            return Err(LibraryServiceError::EmptyLibrary);
        }
        if !overwrite && self.libraries.library_exists(&name).await? {
            return Err(LibraryServiceError::AlreadyExists(name));
        }

        self.libraries
            .save_library(&Library::new(name.clone(), words))
            .await?;
        tracing::debug!(library = %name, overwrite, "library created");
        Ok(name)
    }

    /// Replace the words of an existing library.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::EmptyLibrary` for an empty word list and
    /// `StorageError::LibraryNotFound` (wrapped) if the library does not exist.
    pub async fn update_library(
        &self,
        name: &LibraryName,
        words: Vec<Word>,
    ) -> Result<(), LibraryServiceError> {
        if words.is_empty() {
            return Err(LibraryServiceError::EmptyLibrary);
        }
        if !self.libraries.library_exists(name).await? {
            return Err(StorageError::LibraryNotFound(name.clone()).into());
        }
        self.libraries
            .save_library(&Library::new(name.clone(), words))
            .await?;
        tracing::debug!(library = %name, "library updated");
        Ok(())
    }

    /// Append words to an existing library.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::EmptyLibrary` if `words` is empty and
    /// `LibraryServiceError::Storage` if the library cannot be loaded or saved.
    pub async fn add_words(
        &self,
        name: &LibraryName,
        words: Vec<Word>,
    ) -> Result<Library, LibraryServiceError> {
        if words.is_empty() {
            return Err(LibraryServiceError::EmptyLibrary);
        }
        let mut updated = self.libraries.load_library(name).await?.into_words();
        updated.extend(words);
        self.update_library(name, updated.clone()).await?;
        Ok(Library::new(name.clone(), updated))
    }

    /// Remove the words at zero-based `positions`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::Selection` for an empty or out-of-range
    /// position list and `LibraryServiceError::EmptyLibrary` if no word would remain.
    pub async fn remove_words(
        &self,
        name: &LibraryName,
        positions: &[usize],
    ) -> Result<Library, LibraryServiceError> {
        let library = self.libraries.load_library(name).await?;
        library.select(&WordSelection::Indices(positions.to_vec()))?;

        let doomed: BTreeSet<usize> = positions.iter().copied().collect();
        let kept: Vec<Word> = library
            .into_words()
            .into_iter()
            .enumerate()
            .filter_map(|(position, word)| (!doomed.contains(&position)).then_some(word))
            .collect();
        self.update_library(name, kept.clone()).await?;
        Ok(Library::new(name.clone(), kept))
    }

    /// Import a `.json` library document. The library is named after the file
    /// stem, with `_1`, `_2`, ... appended while that name is taken.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::UnsupportedFormat` for other extensions,
    /// `LibraryServiceError::Io` if the file cannot be read, and
    /// `StorageError::MalformedLibrary` (wrapped) if its contents are invalid.
    pub async fn import_file(&self, path: &Path) -> Result<LibraryName, LibraryServiceError> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(IMPORT_EXTENSION));
        if !is_json {
            return Err(LibraryServiceError::UnsupportedFormat(path.to_path_buf()));
        }
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| LibraryServiceError::UnsupportedFormat(path.to_path_buf()))?;
        let base = LibraryName::new(stem)?;

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LibraryServiceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let words = decode_words(base.as_str(), &text)?;
        if words.is_empty() {
            return Err(LibraryServiceError::EmptyLibrary);
        }

        let name = self.free_name(&base).await?;
        self.libraries
            .save_library(&Library::new(name.clone(), words))
            .await?;
        tracing::info!(library = %name, source = %path.display(), "library imported");
        Ok(name)
    }

    /// Write a library document to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `LibraryServiceError::Storage` if the library cannot be loaded
    /// or the file cannot be written.
    pub async fn export_library(
        &self,
        name: &LibraryName,
        dest: &Path,
    ) -> Result<(), LibraryServiceError> {
        let library = self.libraries.load_library(name).await?;
        let text = encode_words(library.words())?;
        write_atomically(dest, text).await?;
        tracing::info!(library = %name, dest = %dest.display(), "library exported");
        Ok(())
    }

    async fn free_name(&self, base: &LibraryName) -> Result<LibraryName, LibraryServiceError> {
        if !self.libraries.library_exists(base).await? {
            return Ok(base.clone());
        }
        for counter in 1..=MAX_IMPORT_SUFFIX {
            let candidate = base.with_suffix(counter);
            if !self.libraries.library_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(LibraryServiceError::AlreadyExists(base.clone()))
    }
}
