use dictation_core::model::{Library, LibraryName, Word};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

/// On-disk shape of a library: `{"words": [{"word": ..., "meaning": ...}, ...]}`.
///
/// Other top-level or per-word fields are ignored when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDocument {
    pub words: Vec<WordEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
}

impl LibraryDocument {
    #[must_use]
    pub fn from_words(words: &[Word]) -> Self {
        Self {
            words: words
                .iter()
                .map(|w| WordEntry {
                    word: w.word().to_owned(),
                    meaning: w.meaning().to_owned(),
                })
                .collect(),
        }
    }

    /// Validate every entry into a domain `Word`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MalformedLibrary` naming the first invalid entry.
    pub fn into_words(self, library: &str) -> Result<Vec<Word>, StorageError> {
        self.words
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                Word::new(entry.word, entry.meaning).map_err(|e| StorageError::MalformedLibrary {
                    library: library.to_owned(),
                    reason: format!("entry {index}: {e}"),
                })
            })
            .collect()
    }
}

/// Parse a library document.
///
/// # Errors
///
/// Returns `StorageError::MalformedLibrary` if the text is not a valid document.
pub fn decode_words(library: &str, text: &str) -> Result<Vec<Word>, StorageError> {
    let document: LibraryDocument =
        serde_json::from_str(text).map_err(|e| StorageError::MalformedLibrary {
            library: library.to_owned(),
            reason: e.to_string(),
        })?;
    document.into_words(library)
}

/// # Errors
///
/// Returns `StorageError::MalformedLibrary` if the document does not parse.
pub fn decode_library(name: &LibraryName, text: &str) -> Result<Library, StorageError> {
    let words = decode_words(name.as_str(), text)?;
    Ok(Library::new(name.clone(), words))
}

/// Pretty-printed document with two-space indent; non-ASCII text is written as-is.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_words(words: &[Word]) -> Result<String, StorageError> {
    serde_json::to_string_pretty(&LibraryDocument::from_words(words))
        .map_err(|e| StorageError::Serialization(e.to_string()))
}
