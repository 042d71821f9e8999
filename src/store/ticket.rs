use std::sync::atomic::{AtomicUsize, Ordering};

use crate::sync::{Mutex, Semaphore};

/// Hands out 0, 1, 2, ... one ticket per call.
pub struct TicketAllocator {
    lock: Semaphore,
    // Relaxed is enough: every access happens under `lock`
    next: AtomicUsize,
}

impl Default for TicketAllocator {
    fn default() -> Self {
        Self {
            lock: Semaphore::new(1),
            next: AtomicUsize::new(0),
        }
    }
}

impl TicketAllocator {
    pub fn take(&self) -> usize {
        let _guard = self.lock.acquire();
        let ticket = self.next.load(Ordering::Relaxed);
        self.next.store(ticket + 1, Ordering::Relaxed);
        ticket
    }

    /// Number of tickets handed out so far.
    pub fn issued(&self) -> usize {
        let _guard = self.lock.acquire();
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::TicketAllocator;
    use std::{sync::Arc, thread};

    const N_THREADS: usize = 8;
    const WORK: usize = 2_000;

    #[test]
    fn sequential_tickets_increase() {
        let tickets = TicketAllocator::default();
        assert_eq!((0..5).map(|_| tickets.take()).collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
        assert_eq!(tickets.issued(), 5);
    }

    #[test]
    fn no_duplicates_under_contention() {
        let tickets = Arc::new(TicketAllocator::default());
        let ths = (0..N_THREADS)
            .map(|_| {
                let tickets = tickets.clone();
                thread::spawn(move || (0..WORK).map(|_| tickets.take()).collect::<Vec<_>>())
            })
            .collect::<Vec<_>>();

        let per_thread = ths
            .into_iter()
            .map(|th| th.join().unwrap())
            .collect::<Vec<_>>();
        assert!(per_thread
            .iter()
            .all(|ts| ts.iter().zip(&ts[1..]).all(|(s, t)| s < t)));

        let mut seen = per_thread.concat();
        seen.sort_unstable();
        assert_eq!(seen, (0..N_THREADS * WORK).collect::<Vec<_>>());
        assert_eq!(tickets.issued(), N_THREADS * WORK);
    }
}
