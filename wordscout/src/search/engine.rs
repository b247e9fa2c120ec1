use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::query::Query;
use crate::index::{Occurrence, WordIndex};
use crate::registry::{IndexedFileRegistry, WaitOutcome};

/// Answer to one [`Query`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found { occurrences: Vec<Occurrence> },
    WordNotFound,
    /// Indexing finished without ever indexing this file
    FileNotIndexed { filename: String },
    /// The wait for the file exceeded the searcher's timeout
    TimedOut { filename: String },
    BadInput,
    Empty,
}

impl SearchOutcome {
    fn from_occurrences(occurrences: Vec<Occurrence>) -> Self {
        if occurrences.is_empty() {
            SearchOutcome::WordNotFound
        } else {
            SearchOutcome::Found { occurrences }
        }
    }
}

/// Read-only front end over the index and the registry.
///
/// Basic searches answer from whatever is indexed so far. Advanced searches
/// first block until their file is indexed or the pool has finished.
#[derive(Debug, Clone, Copy)]
pub struct Searcher<'a> {
    index: &'a WordIndex,
    registry: &'a IndexedFileRegistry,
    wait_timeout: Option<Duration>,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a WordIndex, registry: &'a IndexedFileRegistry) -> Self {
        Self {
            index,
            registry,
            wait_timeout: None,
        }
    }

    /// Bounds how long an advanced search waits for its file
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    pub fn execute(&self, query: &Query) -> SearchOutcome {
        match query {
            Query::Empty => SearchOutcome::Empty,
            Query::Malformed => SearchOutcome::BadInput,
            Query::Basic(word) => self.basic(word),
            Query::Advanced { filename, word } => self.advanced(filename, word),
        }
    }

    /// Every occurrence of `word` indexed so far
    pub fn basic(&self, word: &str) -> SearchOutcome {
        SearchOutcome::from_occurrences(self.index.lookup(word).unwrap_or_default())
    }

    /// Occurrences of `word` in `filename`, after waiting for the file
    pub fn advanced(&self, filename: &str, word: &str) -> SearchOutcome {
        let outcome = match self.wait_timeout {
            Some(timeout) => self.registry.wait_for_file_timeout(filename, timeout),
            None => self.registry.wait_for_file(filename).into(),
        };
        debug!("Wait for {} finished: {:?}", filename, outcome);

        match outcome {
            WaitOutcome::Indexed => {
                SearchOutcome::from_occurrences(self.index.lookup_in_file(word, filename))
            }
            WaitOutcome::NeverIndexed => SearchOutcome::FileNotIndexed {
                filename: filename.to_string(),
            },
            WaitOutcome::TimedOut => SearchOutcome::TimedOut {
                filename: filename.to_string(),
            },
        }
    }
}
