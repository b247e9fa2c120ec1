use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Counters shared by the scanner, the indexer pool and the collector
#[derive(Debug)]
pub struct IndexMetrics {
    started: Instant,
    files_scanned: AtomicU64,
    entries_skipped: AtomicU64,
    files_indexed: AtomicU64,
    files_failed: AtomicU64,
    lines_read: AtomicU64,
    words_inserted: AtomicU64,
}

impl IndexMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            files_scanned: AtomicU64::new(0),
            entries_skipped: AtomicU64::new(0),
            files_indexed: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            lines_read: AtomicU64::new(0),
            words_inserted: AtomicU64::new(0),
        }
    }

    /// A filename was handed to the bounded buffer
    pub fn record_scanned(&self) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// A file-list entry was blank or undecodable
    pub fn record_skipped(&self) {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_indexed(&self, lines: u64, words: u64) {
        self.files_indexed.fetch_add(1, Ordering::Relaxed);
        self.lines_read.fetch_add(lines, Ordering::Relaxed);
        let total = self.words_inserted.fetch_add(words, Ordering::Relaxed) + words;
        debug!("Indexed {} words from {} lines, total words: {}", words, lines, total);
    }

    pub fn record_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IndexStats {
        IndexStats {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            entries_skipped: self.entries_skipped.load(Ordering::Relaxed),
            files_indexed: self.files_indexed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            lines_read: self.lines_read.load(Ordering::Relaxed),
            words_inserted: self.words_inserted.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.snapshot();
        let elapsed = Duration::from_millis(stats.elapsed.as_millis() as u64);
        info!(
            "Indexing stats:\n\
             Files scanned/indexed/failed: {}/{}/{}\n\
             Entries skipped: {}\n\
             Lines read: {}\n\
             Words inserted: {}\n\
             Elapsed: {}",
            stats.files_scanned,
            stats.files_indexed,
            stats.files_failed,
            stats.entries_skipped,
            stats.lines_read,
            stats.words_inserted,
            humantime::format_duration(elapsed)
        );
    }
}

impl Default for IndexMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`IndexMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub files_scanned: u64,
    pub entries_skipped: u64,
    pub files_indexed: u64,
    pub files_failed: u64,
    pub lines_read: u64,
    pub words_inserted: u64,
    pub elapsed: Duration,
}
