use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordError {
    #[error("word cannot be empty")]
    EmptyWord,
}

/// Normalizes typed or stored spelling for comparison: trimmed and case-folded.
#[must_use]
pub fn normalize_spelling(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Identity of a word inside a session: its normalized spelling.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordKey(String);

impl WordKey {
    #[must_use]
    pub fn from_spelling(raw: &str) -> Self {
        Self(normalize_spelling(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when `answer` spells this key, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn matches(&self, answer: &str) -> bool {
        normalize_spelling(answer) == self.0
    }
}

impl fmt::Debug for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WordKey({})", self.0)
    }
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dictation entry: the spelling to type and the meaning shown as a hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word {
    word: String,
    meaning: String,
}

impl Word {
    /// Creates a word, trimming the spelling.
    ///
    /// # Errors
    ///
    /// Returns `WordError::EmptyWord` if the spelling is blank.
    pub fn new(word: impl Into<String>, meaning: impl Into<String>) -> Result<Self, WordError> {
        let word = word.into();
        let trimmed = word.trim();
        if trimmed.is_empty() {
            return Err(WordError::EmptyWord);
        }
        let word = if trimmed.len() == word.len() {
            word
        } else {
            trimmed.to_owned()
        };

        Ok(Self {
            word,
            meaning: meaning.into(),
        })
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn key(&self) -> WordKey {
        WordKey::from_spelling(&self.word)
    }

    /// Judge a typed answer against this word.
    #[must_use]
    pub fn is_spelled_by(&self, answer: &str) -> bool {
        self.key().matches(answer)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.meaning.is_empty() {
            f.write_str(&self.word)
        } else {
            write!(f, "{}  ({})", self.word, self.meaning)
        }
    }
}
