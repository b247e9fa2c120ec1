//! In-memory word index: word -> every (file, line) it occurs on.
//!
//! The map lives behind the crate's writer-preferring [`RwLock`]: indexers
//! insert in write mode, searches look up in read mode.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::sync::RwLock;
use crate::tokenizer::tokenize;

/// One occurrence of a word
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    /// The file as it was named by the scanner
    pub filename: String,
    /// 1-based line number
    pub line_number: usize,
}

impl Occurrence {
    pub fn new(filename: impl Into<String>, line_number: usize) -> Self {
        Self {
            filename: filename.into(),
            line_number,
        }
    }
}

#[derive(Debug, Default)]
pub struct WordIndex {
    words: RwLock<HashMap<String, Vec<Occurrence>>>,
}

impl WordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `word`
    pub fn insert(&self, word: &str, filename: &str, line_number: usize) {
        let mut words = self.words.write();
        words
            .entry(word.to_string())
            .or_default()
            .push(Occurrence::new(filename, line_number));
    }

    /// Tokenizes `line` and records every word under a single write acquisition.
    ///
    /// Returns the number of words inserted.
    pub fn insert_line(&self, line: &str, filename: &str, line_number: usize) -> usize {
        let mut tokens = tokenize(line).peekable();
        if tokens.peek().is_none() {
            return 0;
        }

        let mut words = self.words.write();
        let mut inserted = 0;
        for word in tokens {
            words
                .entry(word.to_string())
                .or_default()
                .push(Occurrence::new(filename, line_number));
            inserted += 1;
        }
        inserted
    }

    /// Every recorded occurrence of `word`, or `None` if it was never seen
    pub fn lookup(&self, word: &str) -> Option<Vec<Occurrence>> {
        self.words.read().get(word).cloned()
    }

    /// Occurrences of `word` restricted to `filename`
    pub fn lookup_in_file(&self, word: &str, filename: &str) -> Vec<Occurrence> {
        self.words
            .read()
            .get(word)
            .map(|occurrences| {
                occurrences
                    .iter()
                    .filter(|o| o.filename == filename)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of distinct words
    pub fn word_count(&self) -> usize {
        self.words.read().len()
    }

    /// Total number of recorded occurrences
    pub fn occurrence_count(&self) -> usize {
        self.words.read().values().map(Vec::len).sum()
    }
}
