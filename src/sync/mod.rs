pub mod semaphore;

pub use semaphore::Semaphore;

/// Blocking mutual exclusion over whatever the implementor guards.
///
/// The lock is only ever released by dropping the [`MutexGuard`] returned from `acquire()`.
/// `release` takes a [`ReleaseToken`], which only this module can build, so callers elsewhere
/// have no way to release a lock they do not hold:
///
/// ```compile_fail
/// use sundae::sync::{Mutex, Semaphore};
///
/// let lock = Semaphore::new(1);
/// lock.release();
/// ```
///
/// ```compile_fail
/// use sundae::sync::{Mutex, ReleaseToken, Semaphore};
///
/// let lock = Semaphore::new(1);
/// lock.release(ReleaseToken { _private: () });
/// ```
///
/// ```
/// use sundae::sync::{Mutex, Semaphore};
///
/// let lock = Semaphore::new(1);
/// {
///     let _guard = lock.acquire();
///     assert_eq!(lock.permits(), 0);
/// }
/// assert_eq!(lock.permits(), 1);
/// ```
pub trait Mutex {
    fn acquire(&self) -> MutexGuard<'_, Self>;
    fn release(&self, token: ReleaseToken);
}

/// Proof that a [`MutexGuard`] is being dropped. Cannot be built outside `sync`.
pub struct ReleaseToken {
    _private: (),
}

#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct MutexGuard<'a, M: Mutex + ?Sized> {
    mutex: &'a M,
}

impl<'a, M: Mutex + ?Sized> MutexGuard<'a, M> {
    fn new(mutex: &'a M) -> Self {
        Self { mutex }
    }
}

impl<M: Mutex + ?Sized> Drop for MutexGuard<'_, M> {
    fn drop(&mut self) {
        self.mutex.release(ReleaseToken { _private: () })
    }
}
