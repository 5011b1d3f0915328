use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::word::Word;

//
// ─── NAME ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LibraryNameError {
    #[error("library name cannot be empty")]
    Empty,

    #[error("library name cannot contain path separators: {0}")]
    PathSeparator(String),

    #[error("library name cannot start with '.': {0}")]
    Hidden(String),

    #[error("library name cannot contain control characters")]
    ControlCharacter,
}

/// Name of a word library. Doubles as its storage name (`<name>.json`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LibraryName(String);

impl LibraryName {
    /// Validates and creates a library name.
    ///
    /// # Errors
    ///
    /// Returns `LibraryNameError` if the name is blank or cannot be used as a file stem.
    pub fn new(raw: impl Into<String>) -> Result<Self, LibraryNameError> {
        let raw = raw.into();
        let name = raw.trim();
        if name.is_empty() {
            return Err(LibraryNameError::Empty);
        }
        if name.contains(['/', '\\']) {
            return Err(LibraryNameError::PathSeparator(name.to_owned()));
        }
        if name.starts_with('.') {
            return Err(LibraryNameError::Hidden(name.to_owned()));
        }
        if name.chars().any(char::is_control) {
            return Err(LibraryNameError::ControlCharacter);
        }
        Ok(Self(name.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name used when `self` is already taken: `name_1`, `name_2`, ...
    #[must_use]
    pub fn with_suffix(&self, counter: u32) -> Self {
        Self(format!("{}_{counter}", self.0))
    }
}

impl TryFrom<String> for LibraryName {
    type Error = LibraryNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LibraryName> for String {
    fn from(value: LibraryName) -> Self {
        value.0
    }
}

impl FromStr for LibraryName {
    type Err = LibraryNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for LibraryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LibraryName({})", self.0)
    }
}

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("no words selected")]
    Empty,

    #[error("word position {index} is out of range for a library of {len} words")]
    OutOfRange { index: usize, len: usize },
}

/// Which words of a library a session practices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WordSelection {
    #[default]
    All,
    /// Zero-based positions in the library's word order.
    Indices(Vec<usize>),
}

//
// ─── LIBRARY ───────────────────────────────────────────────────────────────────
//

/// A named, ordered list of words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    name: LibraryName,
    words: Vec<Word>,
}

impl Library {
    #[must_use]
    pub fn new(name: LibraryName, words: Vec<Word>) -> Self {
        Self { name, words }
    }

    #[must_use]
    pub fn name(&self) -> &LibraryName {
        &self.name
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    #[must_use]
    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Resolve a selection into the working set, keeping selection order.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Empty` for an empty index list and
    /// `SelectionError::OutOfRange` for positions past the end.
    pub fn select(&self, selection: &WordSelection) -> Result<Vec<Word>, SelectionError> {
        match selection {
            WordSelection::All => Ok(self.words.clone()),
            WordSelection::Indices(indices) => {
                if indices.is_empty() {
                    return Err(SelectionError::Empty);
                }
                indices
                    .iter()
                    .map(|&index| {
                        self.words
                            .get(index)
                            .cloned()
                            .ok_or(SelectionError::OutOfRange {
                                index,
                                len: self.words.len(),
                            })
                    })
                    .collect()
            }
        }
    }
}
