use std::{sync::Arc, thread, time::Duration};

use tracing::debug;

use super::gate::VerificationGate;
use crate::error::GateError;

/// Makes one cone, retrying until the manager approves it. There is no retry cap.
pub struct Clerk {
    customer: usize,
    unit: usize,
    gate: Arc<VerificationGate>,
    make_delay: Duration,
    backoff: Duration,
}

impl Clerk {
    pub fn new(customer: usize, unit: usize, gate: Arc<VerificationGate>) -> Self {
        Self {
            customer,
            unit,
            gate,
            make_delay: Duration::ZERO,
            backoff: Duration::ZERO,
        }
    }

    pub fn with_delays(mut self, make_delay: Duration, backoff: Duration) -> Self {
        self.make_delay = make_delay;
        self.backoff = backoff;
        self
    }

    /// Returns the number of attempts it took to get an approval.
    pub fn run(&self) -> Result<usize, GateError> {
        let mut attempts = 0;
        loop {
            self.make_cone();
            attempts += 1;
            let passed = self.gate.request_verification()?;
            debug!(
                customer = self.customer,
                unit = self.unit,
                attempt = attempts,
                passed,
                "clerk got verdict"
            );
            if passed {
                return Ok(attempts);
            }
            if !self.backoff.is_zero() {
                thread::sleep(self.backoff);
            }
        }
    }

    fn make_cone(&self) {
        if !self.make_delay.is_zero() {
            thread::sleep(self.make_delay);
        }
    }
}
