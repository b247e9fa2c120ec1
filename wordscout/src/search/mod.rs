//! Search front end: parses query lines and answers them from the index.
//!
//! A line with one term is a basic search over everything indexed so far.
//! A line with two terms, `<filename> <word>`, is an advanced search: it
//! waits on the [`IndexedFileRegistry`](crate::registry::IndexedFileRegistry)
//! until that file is indexed, or until indexing completes without it, and
//! then reports only that file's occurrences.
pub mod engine;
pub mod output;
pub mod query;

pub use engine::{SearchOutcome, Searcher};
pub use output::{run_search_loop, write_json, write_text, OutputFormat};
pub use query::Query;
