//! Record of which files are fully indexed, with blocking waits on a single file.
//!
//! An advanced search must not look at the index until its file is done, or
//! until the whole pool has stopped and the file can no longer appear. The
//! registry lets it sleep on exactly that condition instead of polling.
//!
//! Any number of searches may wait at once. Each awaited filename gets its
//! own condition variable, so announcing `a.txt` wakes only the searches
//! waiting for `a.txt`. Completion of the pool wakes all of them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::sync::{lock_or_abort, wait_or_abort, wait_timeout_or_abort};

/// Final answer for a file a search waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// The file was fully indexed; its words are visible in the index
    Indexed,
    /// Indexing finished without ever producing this file
    NeverIndexed,
}

/// Result of [`IndexedFileRegistry::wait_for_file_timeout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Indexed,
    NeverIndexed,
    TimedOut,
}

impl From<FileStatus> for WaitOutcome {
    fn from(status: FileStatus) -> Self {
        match status {
            FileStatus::Indexed => WaitOutcome::Indexed,
            FileStatus::NeverIndexed => WaitOutcome::NeverIndexed,
        }
    }
}

#[derive(Debug)]
struct Waiters {
    announced: Arc<Condvar>,
    count: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Completion order
    indexed: Vec<String>,
    seen: HashSet<String>,
    awaited: HashMap<String, Waiters>,
    indexing_complete: bool,
}

impl RegistryState {
    fn status(&self, filename: &str) -> Option<FileStatus> {
        if self.seen.contains(filename) {
            Some(FileStatus::Indexed)
        } else if self.indexing_complete {
            Some(FileStatus::NeverIndexed)
        } else {
            None
        }
    }

    fn claim(&mut self, filename: &str) -> Arc<Condvar> {
        let waiters = self
            .awaited
            .entry(filename.to_string())
            .or_insert_with(|| Waiters {
                announced: Arc::new(Condvar::new()),
                count: 0,
            });
        waiters.count += 1;
        Arc::clone(&waiters.announced)
    }

    fn withdraw(&mut self, filename: &str) {
        if let Some(waiters) = self.awaited.get_mut(filename) {
            waiters.count -= 1;
            if waiters.count == 0 {
                self.awaited.remove(filename);
            }
        }
    }
}

/// Append-only registry of indexed files
#[derive(Debug, Default)]
pub struct IndexedFileRegistry {
    state: Mutex<RegistryState>,
}

impl IndexedFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        lock_or_abort(&self.state, "indexed-file registry")
    }

    /// Records `filename` as fully indexed and wakes searches waiting on it.
    ///
    /// Announcing a file twice is a no-op. Returns whether the file was new.
    pub fn announce(&self, filename: &str) -> bool {
        let mut state = self.lock();
        if !state.seen.insert(filename.to_string()) {
            debug!("Ignoring duplicate announcement for {}", filename);
            return false;
        }
        state.indexed.push(filename.to_string());

        if let Some(waiters) = state.awaited.get(filename) {
            debug!(
                "Waking {} search(es) waiting on {}",
                waiters.count, filename
            );
            waiters.announced.notify_all();
        }
        true
    }

    /// Marks the indexer pool as finished and wakes every waiting search.
    ///
    /// After this call the registry no longer changes.
    pub fn mark_indexing_complete(&self) {
        let mut state = self.lock();
        if state.indexing_complete {
            return;
        }
        state.indexing_complete = true;
        info!(
            "Indexing complete: {} files indexed, {} file(s) awaited",
            state.indexed.len(),
            state.awaited.len()
        );
        for waiters in state.awaited.values() {
            waiters.announced.notify_all();
        }
    }

    /// Blocks until `filename` is announced or indexing completes without it
    pub fn wait_for_file(&self, filename: &str) -> FileStatus {
        let mut state = self.lock();
        if let Some(status) = state.status(filename) {
            return status;
        }

        let announced = state.claim(filename);
        let status = loop {
            state = wait_or_abort(&announced, state, "indexed-file registry");
            if let Some(status) = state.status(filename) {
                break status;
            }
        };
        state.withdraw(filename);
        status
    }

    /// Like [`wait_for_file`](Self::wait_for_file) but gives up after `timeout`.
    ///
    /// The claim on `filename` is withdrawn on every return path, including
    /// a timeout, so an abandoned wait leaves nothing behind. A timeout too
    /// large to represent as a deadline waits without one.
    pub fn wait_for_file_timeout(&self, filename: &str, timeout: Duration) -> WaitOutcome {
        let mut state = self.lock();
        if let Some(status) = state.status(filename) {
            return status.into();
        }
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            drop(state);
            return self.wait_for_file(filename).into();
        };

        let announced = state.claim(filename);
        let outcome = loop {
            let now = Instant::now();
            if now >= deadline {
                break WaitOutcome::TimedOut;
            }
            let (guard, _) = wait_timeout_or_abort(
                &announced,
                state,
                deadline - now,
                "indexed-file registry",
            );
            state = guard;
            if let Some(status) = state.status(filename) {
                break status.into();
            }
        };
        state.withdraw(filename);
        outcome
    }

    /// Whether `filename` has been announced
    pub fn is_indexed(&self, filename: &str) -> bool {
        self.lock().seen.contains(filename)
    }

    pub fn is_indexing_complete(&self) -> bool {
        self.lock().indexing_complete
    }

    /// Snapshot of indexed files in completion order
    pub fn indexed_files(&self) -> Vec<String> {
        self.lock().indexed.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().indexed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct filenames searches are currently blocked on
    pub fn awaited_count(&self) -> usize {
        self.lock().awaited.len()
    }
}
