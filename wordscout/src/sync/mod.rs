//! Synchronization primitives shared by the indexing pipeline.
//!
//! Every mutex in this crate is locked through [`lock_or_abort`]. A poisoned
//! mutex means some thread panicked halfway through a state transition, so the
//! bounded buffer, the registry or the index may be inconsistent. The process
//! is aborted instead of continuing on top of that state.

mod rwlock;

pub use rwlock::{ReadGuard, RwLock, WriteGuard};

use std::sync::{Condvar, Mutex, MutexGuard, TryLockError, WaitTimeoutResult};
use std::time::Duration;
use tracing::error;

fn poisoned(what: &str) -> ! {
    error!("{} mutex poisoned, aborting", what);
    std::process::abort()
}

/// Locks `mutex`, aborting the process if it is poisoned
pub fn lock_or_abort<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => poisoned(what),
    }
}

/// Non-blocking variant of [`lock_or_abort`]; `None` when the mutex is held
pub fn try_lock_or_abort<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Option<MutexGuard<'a, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::WouldBlock) => None,
        Err(TryLockError::Poisoned(_)) => poisoned(what),
    }
}

/// Waits on `cond`, aborting the process if the mutex was poisoned meanwhile
pub fn wait_or_abort<'a, T>(
    cond: &Condvar,
    guard: MutexGuard<'a, T>,
    what: &str,
) -> MutexGuard<'a, T> {
    match cond.wait(guard) {
        Ok(guard) => guard,
        Err(_) => poisoned(what),
    }
}

/// Timed variant of [`wait_or_abort`]
pub fn wait_timeout_or_abort<'a, T>(
    cond: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
    what: &str,
) -> (MutexGuard<'a, T>, WaitTimeoutResult) {
    match cond.wait_timeout(guard, timeout) {
        Ok(pair) => pair,
        Err(_) => poisoned(what),
    }
}
