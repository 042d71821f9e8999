use std::{
    sync::{Arc, OnceLock},
    thread,
    time::Duration,
};

use tracing::info;

use crate::{error::StoreError, sync::Semaphore};

struct BillingSlot {
    // Set once, by the customer holding this slot's ticket
    customer: OnceLock<usize>,
    ready: Semaphore,
}

/// One one-shot signal per ticket.
pub struct BillingSlots {
    slots: Vec<BillingSlot>,
}

impl BillingSlots {
    pub fn new(n: usize) -> Self {
        Self {
            slots: (0..n)
                .map(|_| BillingSlot {
                    customer: OnceLock::new(),
                    ready: Semaphore::new(0),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Marks `ticket` as ready to be billed on behalf of `customer`.
    pub fn raise(&self, ticket: usize, customer: usize) -> Result<(), StoreError> {
        let slot = self.slots.get(ticket).ok_or(StoreError::TicketOutOfRange {
            ticket,
            slots: self.slots.len(),
        })?;
        slot.customer
            .set(customer)
            .map_err(|_| StoreError::SlotRaisedTwice { ticket })?;
        slot.ready.signal();
        Ok(())
    }

    /// Wakes the cashier on every slot nobody raised; it gives up on the first such ticket.
    pub fn close(&self) {
        self.slots
            .iter()
            .filter(|slot| slot.customer.get().is_none())
            .for_each(|slot| slot.ready.signal());
    }

    /// Number of slots raised so far.
    pub fn raised(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.customer.get().is_some())
            .count()
    }

    // Blocks until `ticket` is raised and returns the customer who raised it
    fn wait(&self, ticket: usize, timeout: Option<Duration>) -> Result<usize, StoreError> {
        let slot = &self.slots[ticket];
        match timeout {
            None => slot.ready.wait(),
            Some(timeout) => {
                if !slot.ready.wait_timeout(timeout) {
                    return Err(StoreError::BillingTimedOut { ticket });
                }
            }
        }
        // The customer is set before the signal, so an empty slot means close() woke us
        slot.customer
            .get()
            .copied()
            .ok_or(StoreError::BillingClosed { ticket })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bill {
    pub ticket: usize,
    pub customer: usize,
}

/// Bills customers strictly in ticket order, however their requests arrive.
pub struct Cashier {
    bills: Arc<BillingSlots>,
    bill_delay: Duration,
    timeout: Option<Duration>,
}

impl Cashier {
    pub fn new(bills: Arc<BillingSlots>) -> Self {
        Self {
            bills,
            bill_delay: Duration::ZERO,
            timeout: None,
        }
    }

    pub fn with_bill_delay(mut self, delay: Duration) -> Self {
        self.bill_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Serves every slot, 0 first. Returns the bills in the order they were given.
    pub fn run(&self) -> Result<Vec<Bill>, StoreError> {
        (0..self.bills.len())
            .map(|ticket| {
                let customer = self.bills.wait(ticket, self.timeout)?;
                self.give_bill();
                info!(ticket, customer, "cashier billed");
                Ok(Bill { ticket, customer })
            })
            .collect()
    }

    fn give_bill(&self) {
        if !self.bill_delay.is_zero() {
            thread::sleep(self.bill_delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bill, BillingSlots, Cashier};
    use crate::error::StoreError;
    use rand::Rng;
    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn one_shot_slots() {
        let bills = BillingSlots::new(2);
        bills.raise(1, 7).unwrap();
        assert_eq!(bills.raised(), 1);
        assert!(matches!(
            bills.raise(1, 8),
            Err(StoreError::SlotRaisedTwice { ticket: 1 })
        ));
        assert!(matches!(
            bills.raise(2, 9),
            Err(StoreError::TicketOutOfRange { ticket: 2, slots: 2 })
        ));
    }

    #[test]
    fn serves_in_ticket_order_despite_reverse_arrival() {
        const N: usize = 6;
        let bills = Arc::new(BillingSlots::new(N));
        let cashier = thread::spawn({
            let bills = bills.clone();
            move || Cashier::new(bills).run()
        });

        // Last ticket first; customer id is 100 + ticket
        for ticket in (0..N).rev() {
            thread::sleep(Duration::from_millis(10));
            bills.raise(ticket, 100 + ticket).unwrap();
        }

        let served = cashier.join().unwrap().unwrap();
        assert_eq!(
            served,
            (0..N)
                .map(|ticket| Bill {
                    ticket,
                    customer: 100 + ticket
                })
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn jittered_arrivals() {
        const N: usize = 20;
        let bills = Arc::new(BillingSlots::new(N));
        let cashier = thread::spawn({
            let bills = bills.clone();
            move || Cashier::new(bills).run()
        });
        let raisers = (0..N)
            .map(|ticket| {
                let bills = bills.clone();
                thread::spawn(move || {
                    let t = rand::thread_rng().gen_range(0..=50);
                    thread::sleep(Duration::from_millis(t));
                    bills.raise(ticket, ticket).unwrap();
                })
            })
            .collect::<Vec<_>>();
        raisers.into_iter().for_each(|th| th.join().unwrap());

        let tickets = cashier
            .join()
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|bill| bill.ticket)
            .collect::<Vec<_>>();
        assert_eq!(tickets, (0..N).collect::<Vec<_>>());
    }

    #[test]
    fn blocks_on_missing_ticket() {
        let bills = Arc::new(BillingSlots::new(2));
        bills.raise(1, 1).unwrap();
        let cashier = thread::spawn({
            let bills = bills.clone();
            move || Cashier::new(bills).run()
        });
        thread::sleep(Duration::from_millis(100));
        assert!(!cashier.is_finished());

        bills.raise(0, 0).unwrap();
        assert_eq!(cashier.join().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn optional_timeout() {
        let bills = Arc::new(BillingSlots::new(1));
        let result = Cashier::new(bills)
            .with_timeout(Some(Duration::from_millis(20)))
            .run();
        assert!(matches!(
            result,
            Err(StoreError::BillingTimedOut { ticket: 0 })
        ));
    }

    #[test]
    fn huge_timeout_is_no_timeout() {
        let bills = Arc::new(BillingSlots::new(2));
        let cashier = thread::spawn({
            let bills = bills.clone();
            move || {
                Cashier::new(bills)
                    .with_timeout(Some(Duration::MAX))
                    .run()
            }
        });
        thread::sleep(Duration::from_millis(50));
        assert!(!cashier.is_finished());

        bills.raise(1, 4).unwrap();
        bills.raise(0, 3).unwrap();
        assert_eq!(
            cashier.join().unwrap().unwrap(),
            [
                Bill {
                    ticket: 0,
                    customer: 3
                },
                Bill {
                    ticket: 1,
                    customer: 4
                }
            ]
        );
    }

    #[test]
    fn close_releases_a_waiting_cashier() {
        let bills = Arc::new(BillingSlots::new(3));
        bills.raise(0, 0).unwrap();
        let cashier = thread::spawn({
            let bills = bills.clone();
            move || Cashier::new(bills).run()
        });
        thread::sleep(Duration::from_millis(50));
        assert!(!cashier.is_finished());

        bills.close();
        assert!(matches!(
            cashier.join().unwrap(),
            Err(StoreError::BillingClosed { ticket: 1 })
        ));
    }

    #[test]
    fn no_customers_no_bills() {
        let bills = Arc::new(BillingSlots::new(0));
        assert!(bills.is_empty());
        assert!(Cashier::new(bills).run().unwrap().is_empty());
    }
}
