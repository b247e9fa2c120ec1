use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};

use super::{lock_or_abort, try_lock_or_abort, wait_or_abort};

/// Binary semaphore guarding the protected resource.
///
/// A plain mutex cannot be used here: the first reader closes the gate and the
/// last reader reopens it, and those are usually different threads.
#[derive(Debug, Default)]
struct Gate {
    closed: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn acquire(&self) {
        let mut closed = lock_or_abort(&self.closed, "rwlock resource");
        while *closed {
            closed = wait_or_abort(&self.opened, closed, "rwlock resource");
        }
        *closed = true;
    }

    fn try_acquire(&self) -> bool {
        let mut closed = lock_or_abort(&self.closed, "rwlock resource");
        if *closed {
            return false;
        }
        *closed = true;
        true
    }

    fn release(&self) {
        let mut closed = lock_or_abort(&self.closed, "rwlock resource");
        *closed = false;
        drop(closed);
        self.opened.notify_one();
    }
}

/// A writer-preferring reader/writer lock.
///
/// Any number of readers may hold the lock at once, or exactly one writer,
/// never both. It is built from three parts:
///
/// - an *admission* mutex every reader and writer passes through,
/// - a *resource* gate held by the active writer or by the group of readers,
/// - a *read-count* mutex protecting the number of active readers.
///
/// A writer holds all three for the whole write. A reader holds admission only
/// long enough to register itself; the first reader of a group closes the
/// resource gate and the last one reopens it.
///
/// # Fairness
///
/// A writer waiting for the gate keeps holding admission, so readers that
/// arrive after it queue behind it. Writers therefore cannot be starved by a
/// steady stream of readers, but late readers can wait for as long as writers
/// keep arriving.
///
/// Release happens when the guard returned by [`read`](Self::read) or
/// [`write`](Self::write) is dropped.
pub struct RwLock<T> {
    admission: Mutex<()>,
    resource: Gate,
    readers: Mutex<usize>,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is mediated by the admission/resource/read-count
// protocol: `&mut T` is only handed out while the resource gate is held by a
// single writer, and `&T` only while the gate is held on behalf of readers.
unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    /// Creates an unlocked lock protecting `value`
    pub fn new(value: T) -> Self {
        Self {
            admission: Mutex::new(()),
            resource: Gate::default(),
            readers: Mutex::new(0),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires shared access, blocking while a writer holds or waits for the lock
    pub fn read(&self) -> ReadGuard<'_, T> {
        let admission = lock_or_abort(&self.admission, "rwlock admission");
        let mut readers = lock_or_abort(&self.readers, "rwlock read-count");
        if *readers == 0 {
            self.resource.acquire();
        }
        *readers += 1;
        drop(readers);
        drop(admission);
        ReadGuard { lock: self }
    }

    /// Acquires shared access without blocking
    pub fn try_read(&self) -> Option<ReadGuard<'_, T>> {
        let _admission = try_lock_or_abort(&self.admission, "rwlock admission")?;
        let mut readers = lock_or_abort(&self.readers, "rwlock read-count");
        if *readers == 0 && !self.resource.try_acquire() {
            return None;
        }
        *readers += 1;
        Some(ReadGuard { lock: self })
    }

    /// Acquires exclusive access, blocking until every active reader has left
    pub fn write(&self) -> WriteGuard<'_, T> {
        let admission = lock_or_abort(&self.admission, "rwlock admission");
        self.resource.acquire();
        let readers = lock_or_abort(&self.readers, "rwlock read-count");
        WriteGuard {
            lock: self,
            admission: Some(admission),
            readers: Some(readers),
        }
    }

    /// Acquires exclusive access without blocking
    pub fn try_write(&self) -> Option<WriteGuard<'_, T>> {
        let admission = try_lock_or_abort(&self.admission, "rwlock admission")?;
        if !self.resource.try_acquire() {
            return None;
        }
        let readers = lock_or_abort(&self.readers, "rwlock read-count");
        Some(WriteGuard {
            lock: self,
            admission: Some(admission),
            readers: Some(readers),
        })
    }

    /// Number of readers currently holding the lock.
    ///
    /// Blocks while a writer is active, since the writer owns the read count.
    pub fn reader_count(&self) -> usize {
        *lock_or_abort(&self.readers, "rwlock read-count")
    }

    fn release_read(&self) {
        let mut readers = lock_or_abort(&self.readers, "rwlock read-count");
        *readers -= 1;
        if *readers == 0 {
            self.resource.release();
        }
    }
}

impl<T: Default> Default for RwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for RwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwLock").finish_non_exhaustive()
    }
}

/// Shared access to the value behind an [`RwLock`]
pub struct ReadGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard is counted in `readers`, so the resource gate is
        // closed against writers for as long as it lives.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Exclusive access to the value behind an [`RwLock`]
pub struct WriteGuard<'a, T> {
    lock: &'a RwLock<T>,
    admission: Option<MutexGuard<'a, ()>>,
    readers: Option<MutexGuard<'a, usize>>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the writer holds the resource gate exclusively.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the writer holds the resource gate exclusively, and `&mut self`
        // rules out aliasing through this guard.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        // Reverse acquisition order: read-count, resource, admission.
        drop(self.readers.take());
        self.lock.resource.release();
        drop(self.admission.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_lock_is_immediately_usable() {
        let lock = RwLock::new(5);
        assert_eq!(*lock.read(), 5);
        *lock.write() += 1;
        assert_eq!(*lock.read(), 6);
        assert_eq!(lock.reader_count(), 0);
    }

    #[test]
    fn test_readers_hold_lock_concurrently() {
        let readers = 4;
        let lock = Arc::new(RwLock::new(()));
        let barrier = Arc::new(Barrier::new(readers));

        let handles: Vec<_> = (0..readers)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let _guard = lock.read();
                    // Every reader must be inside at once for the barrier to open.
                    barrier.wait();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(lock.reader_count(), 0);
    }

    #[test]
    fn test_try_write_fails_while_reading() {
        let lock = RwLock::new(0);
        let guard = lock.read();
        assert_eq!(lock.reader_count(), 1);
        assert!(lock.try_write().is_none());
        let second = lock.try_read();
        assert!(second.is_some());
        drop(second);
        drop(guard);
        assert!(lock.try_write().is_some());
    }

    #[test]
    fn test_try_read_fails_while_writing() {
        let lock = RwLock::new(0);
        let guard = lock.write();
        assert!(lock.try_read().is_none());
        assert!(lock.try_write().is_none());
        drop(guard);
        assert!(lock.try_read().is_some());
    }

    #[test]
    fn test_no_torn_reads_under_contention() {
        let lock = Arc::new(RwLock::new((0usize, 0usize)));
        let active_readers = Arc::new(AtomicUsize::new(0));
        let writer_active = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();

        for w in 0..4 {
            let lock = Arc::clone(&lock);
            let active_readers = Arc::clone(&active_readers);
            let writer_active = Arc::clone(&writer_active);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    let mut guard = lock.write();
                    assert!(!writer_active.swap(true, Ordering::SeqCst));
                    assert_eq!(active_readers.load(Ordering::SeqCst), 0);
                    let value = w * 1000 + i;
                    guard.0 = value;
                    thread::yield_now();
                    guard.1 = value;
                    writer_active.store(false, Ordering::SeqCst);
                }
            }));
        }

        for _ in 0..8 {
            let lock = Arc::clone(&lock);
            let active_readers = Arc::clone(&active_readers);
            let writer_active = Arc::clone(&writer_active);
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    let guard = lock.read();
                    active_readers.fetch_add(1, Ordering::SeqCst);
                    assert!(!writer_active.load(Ordering::SeqCst));
                    let (a, b) = *guard;
                    thread::yield_now();
                    assert_eq!(a, b, "observed a torn write");
                    active_readers.fetch_sub(1, Ordering::SeqCst);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        let (a, b) = *lock.read();
        assert_eq!(a, b);
        assert_eq!(lock.reader_count(), 0);
    }

    #[test]
    fn test_waiting_writer_blocks_new_readers() {
        let lock = Arc::new(RwLock::new(Vec::<&'static str>::new()));
        let first = lock.read();

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                lock.write().push("writer");
            })
        };

        // Once the writer is queued it owns admission and try_read starts failing.
        while let Some(probe) = lock.try_read() {
            drop(probe);
            thread::sleep(Duration::from_millis(1));
        }

        let late_reader = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let seen = lock.read().clone();
                seen
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(first.len(), 0);
        drop(first);

        writer.join().unwrap();
        let seen = late_reader.join().unwrap();
        assert_eq!(seen, vec!["writer"]);
    }
}
