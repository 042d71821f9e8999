use std::{thread, time::Duration};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, trace};

use super::gate::GateServer;

/// Judges one cone.
pub trait Verifier: Send {
    fn verify(&mut self) -> bool;
}

impl<F: FnMut() -> bool + Send> Verifier for F {
    fn verify(&mut self) -> bool {
        self()
    }
}

/// Fair coin, independent on every call.
pub struct CoinFlip {
    rng: StdRng,
}

impl CoinFlip {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Verifier for CoinFlip {
    fn verify(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerState {
    AwaitingRequest,
    Verifying,
    Responded,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSummary {
    pub approvals: usize,
    pub verifications: usize,
}

/// Serves verification requests until `target` cones have been approved, then retires the gate.
pub struct Manager<V> {
    server: GateServer,
    verifier: V,
    target: usize,
    verify_delay: Duration,
    state: ManagerState,
}

impl<V: Verifier> Manager<V> {
    pub fn new(server: GateServer, verifier: V, target: usize) -> Self {
        Self {
            server,
            verifier,
            target,
            verify_delay: Duration::ZERO,
            state: ManagerState::AwaitingRequest,
        }
    }

    pub fn with_verify_delay(mut self, delay: Duration) -> Self {
        self.verify_delay = delay;
        self
    }

    pub fn run(mut self) -> ManagerSummary {
        let mut summary = ManagerSummary {
            approvals: 0,
            verifications: 0,
        };
        while summary.approvals < self.target {
            self.transition(ManagerState::AwaitingRequest);
            let state = &mut self.state;
            let verifier = &mut self.verifier;
            let delay = self.verify_delay;
            let passed = self.server.serve_one(|| {
                *state = ManagerState::Verifying;
                trace!(state = ?state, "manager");
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                verifier.verify()
            });
            self.transition(ManagerState::Responded);

            summary.verifications += 1;
            if passed {
                summary.approvals += 1;
            }
            debug!(
                passed,
                approvals = summary.approvals,
                target = self.target,
                "cone verified"
            );
        }
        self.transition(ManagerState::Terminated);
        info!(
            approvals = summary.approvals,
            verifications = summary.verifications,
            "manager retiring"
        );
        // Dropping self drops the server, which retires the gate
        summary
    }

    fn transition(&mut self, next: ManagerState) {
        self.state = next;
        trace!(state = ?next, "manager");
    }
}
