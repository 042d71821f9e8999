//! The ice-cream store: customers, their clerks, one manager and one cashier.
//!
//! Customers spawn a clerk per cone. Clerks take turns at the [`VerificationGate`] until the
//! [`Manager`] approves their cone. Once all of its cones are approved, a customer takes a ticket
//! from the [`TicketAllocator`] and raises the matching billing slot; the [`Cashier`] serves the
//! slots in ticket order.

pub mod cashier;
pub mod clerk;
pub mod customer;
pub mod gate;
pub mod manager;
pub mod ticket;

pub use cashier::{Bill, BillingSlots, Cashier};
pub use clerk::Clerk;
pub use customer::{Counter, Customer};
pub use gate::{GateServer, VerificationGate};
pub use manager::{CoinFlip, Manager, ManagerSummary, Verifier};
pub use ticket::TicketAllocator;

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

use crate::{
    config::StoreConfig,
    error::{GateError, StoreError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopReport {
    /// Cones ordered, indexed by customer id.
    pub orders: Vec<usize>,
    pub approvals: usize,
    pub verifications: usize,
    pub peak_occupancy: usize,
    /// Ticket each customer took, indexed by customer id.
    pub tickets_by_customer: Vec<usize>,
    /// In the order the cashier gave them.
    pub bills: Vec<Bill>,
}

impl ShopReport {
    pub fn target(&self) -> usize {
        self.orders.iter().sum()
    }

    pub fn tickets(&self) -> Vec<usize> {
        self.bills.iter().map(|bill| bill.ticket).collect()
    }

    /// Customer ids in the order the cashier billed them.
    pub fn customers_by_ticket(&self) -> Vec<usize> {
        self.bills.iter().map(|bill| bill.customer).collect()
    }

    /// Whether the i-th bill went to the customer who took ticket i.
    pub fn billed_in_ticket_order(&self) -> bool {
        self.bills.len() == self.tickets_by_customer.len()
            && self.bills.iter().enumerate().all(|(i, bill)| {
                bill.ticket == i && self.tickets_by_customer.get(bill.customer) == Some(&i)
            })
    }
}

pub struct Shop;

impl Shop {
    /// Draws each customer's order and runs a full day with a fair coin.
    pub fn run(config: &StoreConfig) -> Result<ShopReport, StoreError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let orders = config.draw_orders(&mut rng);
        let coin = CoinFlip::seeded(rng.gen());
        Self::serve(config, orders, coin)
    }

    /// Runs a full day for the given orders, one customer per entry.
    pub fn serve<V: Verifier + 'static>(
        config: &StoreConfig,
        orders: Vec<usize>,
        verifier: V,
    ) -> Result<ShopReport, StoreError> {
        let target: usize = orders.iter().sum();
        info!(customers = orders.len(), target, "store opening");

        let (gate, server) = VerificationGate::open();
        let counter = Counter {
            gate: gate.clone(),
            tickets: Arc::new(TicketAllocator::default()),
            bills: Arc::new(BillingSlots::new(orders.len())),
        };

        let manager = spawn("manager".to_string(), {
            let manager =
                Manager::new(server, verifier, target).with_verify_delay(config.verify_delay);
            move || manager.run()
        })?;
        let cashier = spawn("cashier".to_string(), {
            let cashier = Cashier::new(counter.bills.clone())
                .with_bill_delay(config.bill_delay)
                .with_timeout(config.billing_timeout);
            move || cashier.run()
        })?;
        let customers = orders
            .iter()
            .enumerate()
            .map(|(id, &units)| {
                let customer = Customer::new(id, units, counter.clone()).with_config(config);
                spawn(format!("customer-{id}"), move || customer.run())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tickets_by_customer = Vec::with_capacity(customers.len());
        for (id, customer) in customers.into_iter().enumerate() {
            match join(&format!("customer-{id}"), customer).and_then(|r| r) {
                Ok(ticket) => tickets_by_customer.push(ticket),
                Err(e) => return Err(abandon(e, manager, cashier, &counter.bills)),
            }
        }

        let summary = join("manager", manager)?;
        let bills = join("cashier", cashier)??;
        info!(
            approvals = summary.approvals,
            verifications = summary.verifications,
            "store closing"
        );

        Ok(ShopReport {
            orders,
            approvals: summary.approvals,
            verifications: summary.verifications,
            peak_occupancy: gate.peak_occupancy(),
            tickets_by_customer,
            bills,
        })
    }
}

// A failed customer never raises its slot. Free the cashier, and if the manager has stopped
// (a retired gate means it has, maybe by panicking) surface its panic as the cause.
fn abandon(
    err: StoreError,
    manager: JoinHandle<ManagerSummary>,
    cashier: JoinHandle<Result<Vec<Bill>, StoreError>>,
    bills: &BillingSlots,
) -> StoreError {
    bills.close();
    let _ = cashier.join();
    if manager.is_finished() || matches!(err, StoreError::Gate(GateError::Retired)) {
        if let Err(panicked) = join("manager", manager) {
            return panicked;
        }
    }
    err
}

fn spawn<T, F>(role: String, f: F) -> Result<JoinHandle<T>, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(role.clone())
        .spawn(f)
        .map_err(|source| StoreError::Spawn { role, source })
}

fn join<T>(role: &str, handle: JoinHandle<T>) -> Result<T, StoreError> {
    handle.join().map_err(|_| StoreError::WorkerPanicked {
        role: role.to_string(),
    })
}
