//! Word lists loaded at startup and shared read-only by every session.
//!
//! Two lists back the game: *answers*, which rounds draw their secret word
//! from, and *guesses*, the dictionary a guess must appear in before it is
//! scored. Both are immutable once loaded.

use log::{info, warn};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use wordle_shared::is_word;

/// A set of lowercase words, indexed by length for random selection.
#[derive(Debug, Default)]
pub struct WordList {
    words: HashSet<String>,
    by_length: HashMap<usize, Vec<String>>,
}

impl WordList {
    /// Builds a list from raw entries, dropping anything that is not purely
    /// ASCII letters. Duplicates are kept once.
    pub fn from_words<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = WordList::default();
        for entry in entries {
            if let Some(word) = is_word(entry.as_ref()) {
                list.insert(word);
            }
        }
        list
    }

    /// Reads one word per line from `path`.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read(path)?;
        let contents = String::from_utf8_lossy(&contents);
        let list = Self::from_words(contents.lines());

        if list.is_empty() {
            warn!("Word list {} contains no usable words", path.display());
        } else {
            info!("Loaded {} words from {}", list.len(), path.display());
        }
        Ok(list)
    }

    fn insert(&mut self, word: String) {
        if self.words.insert(word.clone()) {
            self.by_length.entry(word.len()).or_default().push(word);
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Uniformly picks a word of exactly `length` letters.
    pub fn random_word(&self, length: usize) -> Option<String> {
        self.by_length
            .get(&length)
            .and_then(|words| words.choose(&mut rand::thread_rng()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// The answers and guesses lists a session plays against.
#[derive(Debug)]
pub struct WordRepository {
    answers: WordList,
    guesses: WordList,
}

impl WordRepository {
    pub fn new(answers: WordList, guesses: WordList) -> Self {
        Self { answers, guesses }
    }

    /// True if `word` is an allowed guess.
    pub fn contains(&self, word: &str) -> bool {
        self.guesses.contains(word)
    }

    /// Draws a random answer of the given length, or `None` if the answers
    /// list has none.
    pub fn random_word(&self, length: usize) -> Option<String> {
        self.answers.random_word(length)
    }
}
