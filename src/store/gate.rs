//! Single-slot request/response channel between clerks and the manager.
//!
//! A clerk takes the admission lock, signals `request`, parks on `response`, reads the outcome
//! and only then drops the lock. The manager side is the unique [`GateServer`]; dropping it
//! retires the gate, after which clerks get [`GateError::Retired`] instead of blocking forever.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex as StdMutex, PoisonError,
};

use tracing::debug;

use crate::{
    error::GateError,
    sync::{Mutex, Semaphore},
};

pub struct VerificationGate {
    admission: Semaphore,
    request: Semaphore,
    response: Semaphore,
    // Written by the server, taken by the clerk holding admission. None after retirement.
    passed: StdMutex<Option<bool>>,
    retired: AtomicBool,
    attempts: AtomicUsize,
    occupancy: AtomicUsize,
    peak_occupancy: AtomicUsize,
}

impl VerificationGate {
    /// Opens a gate, returning the clerk-side handle and the one manager-side server.
    pub fn open() -> (Arc<Self>, GateServer) {
        let gate = Arc::new(Self {
            admission: Semaphore::new(1),
            request: Semaphore::new(0),
            response: Semaphore::new(0),
            passed: StdMutex::new(None),
            retired: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
            occupancy: AtomicUsize::new(0),
            peak_occupancy: AtomicUsize::new(0),
        });
        let server = GateServer { gate: gate.clone() };
        (gate, server)
    }

    /// Submits one unit of work and blocks until the manager has judged it.
    pub fn request_verification(&self) -> Result<bool, GateError> {
        let _admitted = self.admission.acquire();
        if self.is_retired() {
            return Err(GateError::Retired);
        }

        let inside = self.occupancy.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_occupancy.fetch_max(inside, Ordering::SeqCst);
        self.attempts.fetch_add(1, Ordering::SeqCst);

        self.request.signal();
        self.response.wait();
        let passed = self.slot().take();

        self.occupancy.fetch_sub(1, Ordering::SeqCst);
        passed.ok_or(GateError::Retired)
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Total requests that reached the manager.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Highest number of clerks ever seen between request and response. Never above 1.
    pub fn peak_occupancy(&self) -> usize {
        self.peak_occupancy.load(Ordering::SeqCst)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<bool>> {
        self.passed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The manager's end of a [`VerificationGate`]. Not `Clone`; dropping it retires the gate.
pub struct GateServer {
    gate: Arc<VerificationGate>,
}

impl GateServer {
    /// Blocks for the next request, judges it with `verify`, and hands the outcome back.
    pub fn serve_one<F: FnOnce() -> bool>(&mut self, verify: F) -> bool {
        self.gate.request.wait();
        let passed = verify();
        *self.gate.slot() = Some(passed);
        self.gate.response.signal();
        debug!(passed, "verification served");
        passed
    }
}

impl Drop for GateServer {
    fn drop(&mut self) {
        self.gate.retired.store(true, Ordering::SeqCst);
        // Wake a clerk that slipped past the retirement check; it finds no outcome
        self.gate.response.signal();
        debug!("verification gate retired");
    }
}

#[cfg(test)]
mod tests {
    use super::VerificationGate;
    use crate::error::GateError;
    use std::{thread, time::Duration};

    #[test]
    fn one_request_one_response() {
        let (gate, mut server) = VerificationGate::open();
        let clerk = thread::spawn({
            let gate = gate.clone();
            move || gate.request_verification()
        });
        assert!(server.serve_one(|| true));
        assert_eq!(clerk.join().unwrap(), Ok(true));
        assert_eq!(gate.attempts(), 1);
    }

    #[test]
    fn clerk_blocks_without_manager() {
        let (gate, _server) = VerificationGate::open();
        let clerk = thread::spawn({
            let gate = gate.clone();
            move || gate.request_verification()
        });
        thread::sleep(Duration::from_millis(100));
        assert!(!clerk.is_finished());
        drop(_server);
        assert_eq!(clerk.join().unwrap(), Err(GateError::Retired));
    }

    #[test]
    fn retired_gate_refuses_requests() {
        let (gate, server) = VerificationGate::open();
        assert!(!gate.is_retired());
        drop(server);
        assert!(gate.is_retired());
        assert_eq!(gate.request_verification(), Err(GateError::Retired));
        assert_eq!(gate.request_verification(), Err(GateError::Retired));
        assert_eq!(gate.attempts(), 0);
    }

    #[test]
    fn one_clerk_inside_at_a_time() {
        const N_CLERKS: usize = 8;
        const WORK: usize = 50;
        let (gate, mut server) = VerificationGate::open();
        let clerks = (0..N_CLERKS)
            .map(|_| {
                let gate = gate.clone();
                thread::spawn(move || {
                    (0..WORK)
                        .map(|_| gate.request_verification().unwrap())
                        .filter(|&passed| passed)
                        .count()
                })
            })
            .collect::<Vec<_>>();

        // Alternate outcomes so both branches are exercised
        let mut approvals = 0;
        for i in 0..N_CLERKS * WORK {
            if server.serve_one(|| {
                thread::sleep(Duration::from_micros(20));
                i % 2 == 0
            }) {
                approvals += 1;
            }
        }

        let approved_by_clerks: usize = clerks.into_iter().map(|th| th.join().unwrap()).sum();
        assert_eq!(approved_by_clerks, approvals);
        assert_eq!(gate.attempts(), N_CLERKS * WORK);
        assert_eq!(gate.peak_occupancy(), 1);
    }
}
