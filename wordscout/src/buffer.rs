//! Fixed-capacity filename queue between the scanner and the indexer pool.
//!
//! One mutex guards the slots, the counters and the scan-complete flag. An
//! indexer checks "is the scan over?" and goes to sleep under that same mutex,
//! so the scanner cannot finish in between and leave it sleeping forever.

use std::num::NonZeroUsize;
use std::sync::{Condvar, Mutex};
use tracing::trace;

use crate::errors::{IndexError, IndexResult};
use crate::sync::{lock_or_abort, wait_or_abort};

#[derive(Debug)]
struct BufferState {
    slots: Vec<Option<String>>,
    fill: usize,
    take: usize,
    count: usize,
    scan_complete: bool,
}

/// Circular bounded buffer with blocking `put` and `get`
#[derive(Debug)]
pub struct BoundedBuffer {
    state: Mutex<BufferState>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl BoundedBuffer {
    /// Creates an empty buffer holding at most `capacity` filenames
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            state: Mutex::new(BufferState {
                slots: vec![None; capacity],
                fill: 0,
                take: 0,
                count: 0,
                scan_complete: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of filenames currently queued
    pub fn len(&self) -> usize {
        lock_or_abort(&self.state, "bounded buffer").count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scan_complete(&self) -> bool {
        lock_or_abort(&self.state, "bounded buffer").scan_complete
    }

    /// Appends `item`, blocking while the buffer is full.
    ///
    /// Fails with [`IndexError::BufferClosed`] once the scan has been marked
    /// complete, since no indexer is guaranteed to be left to take it.
    pub fn put(&self, item: String) -> IndexResult<()> {
        let mut state = lock_or_abort(&self.state, "bounded buffer");
        while state.count == self.capacity && !state.scan_complete {
            state = wait_or_abort(&self.not_full, state, "bounded buffer");
        }
        if state.scan_complete {
            return Err(IndexError::BufferClosed);
        }

        let fill = state.fill;
        trace!("Buffer put at slot {}: {}", fill, item);
        state.slots[fill] = Some(item);
        state.fill = (fill + 1) % self.capacity;
        state.count += 1;
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Takes the oldest filename, blocking while the buffer is empty.
    ///
    /// Returns `None` ("no more work") when the buffer is empty and the scan
    /// is complete; that case never blocks.
    pub fn get(&self) -> Option<String> {
        let mut state = lock_or_abort(&self.state, "bounded buffer");
        while state.count == 0 {
            if state.scan_complete {
                return None;
            }
            state = wait_or_abort(&self.not_empty, state, "bounded buffer");
        }

        let take = state.take;
        let item = state.slots[take].take();
        state.take = (take + 1) % self.capacity;
        state.count -= 1;
        drop(state);

        self.not_full.notify_one();
        item
    }

    /// Records that the producer will never `put` again and wakes every
    /// sleeping consumer so it can observe the flag.
    pub fn mark_scan_complete(&self) {
        let mut state = lock_or_abort(&self.state, "bounded buffer");
        state.scan_complete = true;
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}
