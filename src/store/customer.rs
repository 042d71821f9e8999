use std::{sync::Arc, thread, time::Duration};

use tracing::{debug, info};

use super::{cashier::BillingSlots, clerk::Clerk, gate::VerificationGate, ticket::TicketAllocator};
use crate::{config::StoreConfig, error::StoreError};

/// Shared handles every customer is spawned with.
#[derive(Clone)]
pub struct Counter {
    pub gate: Arc<VerificationGate>,
    pub tickets: Arc<TicketAllocator>,
    pub bills: Arc<BillingSlots>,
}

pub struct Customer {
    id: usize,
    units: usize,
    counter: Counter,
    browse_delay: Duration,
    make_delay: Duration,
    clerk_backoff: Duration,
}

impl Customer {
    pub fn new(id: usize, units: usize, counter: Counter) -> Self {
        Self {
            id,
            units,
            counter,
            browse_delay: Duration::ZERO,
            make_delay: Duration::ZERO,
            clerk_backoff: Duration::ZERO,
        }
    }

    pub fn with_config(mut self, config: &StoreConfig) -> Self {
        self.browse_delay = config.browse_delay;
        self.make_delay = config.make_delay;
        self.clerk_backoff = config.clerk_backoff;
        self
    }

    /// Browses, waits for all of its cones, then takes a ticket and asks for the bill.
    /// Returns the ticket.
    pub fn run(self) -> Result<usize, StoreError> {
        info!(customer = self.id, units = self.units, "customer browsing");
        if !self.browse_delay.is_zero() {
            thread::sleep(self.browse_delay);
        }

        self.collect_cones()?;

        let ticket = self.counter.tickets.take();
        info!(customer = self.id, ticket, "customer took ticket");
        self.counter.bills.raise(ticket, self.id)?;
        Ok(ticket)
    }

    // One clerk per cone; returns only once every clerk has an approval
    fn collect_cones(&self) -> Result<(), StoreError> {
        let results = thread::scope(|s| {
            let handles = (0..self.units)
                .map(|unit| {
                    let clerk = Clerk::new(self.id, unit, self.counter.gate.clone())
                        .with_delays(self.make_delay, self.clerk_backoff);
                    s.spawn(move || clerk.run())
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join())
                .collect::<Vec<_>>()
        });

        for (unit, result) in results.into_iter().enumerate() {
            let attempts = result.map_err(|_| StoreError::WorkerPanicked {
                role: format!("clerk {}/{unit}", self.id),
            })??;
            debug!(customer = self.id, unit, attempts, "cone approved");
        }
        Ok(())
    }
}
