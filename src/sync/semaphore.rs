//! Counting semaphore built from a std mutex and condition variable.
//!
//! Initialized with one permit it behaves as a binary lock and implements [`Mutex`], so callers
//! hold it through a [`MutexGuard`]. Initialized with zero permits it is an event: one thread
//! `wait()`s, another `signal()`s.

use std::{
    sync::{Condvar, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError},
    time::{Duration, Instant},
};

use super::{Mutex, MutexGuard, ReleaseToken};

pub struct Semaphore {
    permits: StdMutex<usize>,
    cvar: Condvar,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: StdMutex::new(permits),
            cvar: Condvar::new(),
        }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn wait(&self) {
        let mut permits = self.lock();
        while *permits == 0 {
            permits = self
                .cvar
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }

    /// Takes a permit only if one is available right now.
    pub fn try_wait(&self) -> bool {
        let mut permits = self.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Like `wait()`, but gives up after `timeout`. Returns whether a permit was taken.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        // A deadline past what Instant can represent is as good as no deadline
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut permits = self.lock();
        while *permits == 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            permits = self
                .cvar
                .wait_timeout(permits, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *permits -= 1;
        true
    }

    /// Returns a permit and wakes one waiter, if any.
    pub fn signal(&self) {
        *self.lock() += 1;
        self.cvar.notify_one();
    }

    pub fn permits(&self) -> usize {
        *self.lock()
    }

    // The count is always consistent, so a panic elsewhere while holding the lock is harmless
    fn lock(&self) -> StdMutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Mutex for Semaphore {
    fn acquire(&self) -> MutexGuard<'_, Self> {
        self.wait();
        MutexGuard::new(self)
    }
    fn release(&self, _: ReleaseToken) {
        self.signal()
    }
}
