use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;

use dictation_core::model::{Word, WordKey};

/// Working set of a session: words drawn at random without replacement.
///
/// Words sharing a `WordKey` collapse into one entry; the first occurrence
/// (and its meaning) is kept.
#[derive(Debug, Clone)]
pub struct WordPool {
    entries: Vec<(WordKey, Word)>,
    used: HashSet<WordKey>,
}

impl WordPool {
    #[must_use]
    pub fn new(words: impl IntoIterator<Item = Word>) -> Self {
        let mut seen = HashSet::new();
        let entries = words
            .into_iter()
            .filter_map(|word| {
                let key = word.key();
                seen.insert(key.clone()).then_some((key, word))
            })
            .collect();
        Self {
            entries,
            used: HashSet::new(),
        }
    }

    /// Number of distinct words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.word_count().saturating_sub(self.used_count())
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Draw a word uniformly among those not drawn yet and mark it used.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Word> {
        let candidates: Vec<&(WordKey, Word)> = self
            .entries
            .iter()
            .filter(|(key, _)| !self.used.contains(key))
            .collect();
        let (key, word) = candidates.choose(rng).copied()?;
        let word = word.clone();
        self.used.insert(key.clone());
        Some(word)
    }
}
