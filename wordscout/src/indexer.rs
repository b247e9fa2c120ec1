//! Indexer worker: takes filenames from the bounded buffer, tokenizes each
//! file into the word index and announces it to the registry.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::buffer::BoundedBuffer;
use crate::config::EncodingMode;
use crate::errors::{IndexError, IndexResult};
use crate::index::WordIndex;
use crate::metrics::IndexMetrics;
use crate::registry::IndexedFileRegistry;

const BUFFER_CAPACITY: usize = 64 * 1024;

/// What indexing one file produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileSummary {
    pub lines: usize,
    pub words: usize,
}

/// Reads `filename` and inserts every word with its 1-based line number.
///
/// Under [`EncodingMode::Lossy`] lines go into the index as they are read.
/// Under [`EncodingMode::FailFast`] the whole file is decoded before anything
/// is inserted, so a rejected file leaves no partial entries in the index.
pub fn index_file(
    filename: &str,
    index: &WordIndex,
    encoding_mode: EncodingMode,
) -> IndexResult<FileSummary> {
    let path = Path::new(filename);
    let file = File::open(path).map_err(|e| IndexError::from_open(path, e))?;
    let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);

    let mut summary = FileSummary::default();
    let mut decoded = Vec::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        if raw.last() == Some(&b'\n') {
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
        }
        summary.lines += 1;
        match encoding_mode {
            EncodingMode::Lossy => {
                let line = String::from_utf8_lossy(&raw);
                summary.words += index.insert_line(&line, filename, summary.lines);
            }
            EncodingMode::FailFast => {
                let line = String::from_utf8(std::mem::take(&mut raw))
                    .map_err(|e| IndexError::encoding_error(path, summary.lines, e))?;
                decoded.push(line);
            }
        }
    }

    for (i, line) in decoded.iter().enumerate() {
        summary.words += index.insert_line(line, filename, i + 1);
    }
    trace!(
        "{}: {} lines, {} words",
        filename,
        summary.lines,
        summary.words
    );
    Ok(summary)
}

/// Everything one indexer thread works against
#[derive(Debug, Clone, Copy)]
pub struct Indexer<'a> {
    pub buffer: &'a BoundedBuffer,
    pub index: &'a WordIndex,
    pub registry: &'a IndexedFileRegistry,
    pub metrics: &'a IndexMetrics,
    pub encoding_mode: EncodingMode,
}

impl Indexer<'_> {
    /// Indexes files until the buffer reports no more work.
    ///
    /// A file that cannot be read is logged and skipped; it is never
    /// announced. Returns the number of files this worker indexed.
    pub fn run(&self, worker: usize) -> usize {
        let mut indexed = 0;
        while let Some(filename) = self.buffer.get() {
            match index_file(&filename, self.index, self.encoding_mode) {
                Ok(summary) => {
                    self.metrics
                        .record_indexed(summary.lines as u64, summary.words as u64);
                    self.registry.announce(&filename);
                    indexed += 1;
                }
                Err(e) => {
                    warn!("Indexer {} skipping {}: {}", worker, filename, e);
                    self.metrics.record_failed();
                }
            }
        }
        debug!("Indexer {} done after {} files", worker, indexed);
        indexed
    }
}
