//! Store configuration.
//!
//! The defaults are compile-time constants; tests and the binary build a [`StoreConfig`] from
//! them and override single fields as needed.

use std::{ops::RangeInclusive, time::Duration};

use rand::Rng;

use crate::error::ConfigError;

pub const NUM_OF_CUSTOMERS: usize = 10;
pub const MIN_NUM_OF_CONES: usize = 1;
pub const MAX_NUM_OF_CONES: usize = 4;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub customers: usize,
    pub min_units: usize,
    pub max_units: usize,
    /// Seeds both the order draw and the manager's coin. `None` uses OS entropy.
    pub seed: Option<u64>,
    pub browse_delay: Duration,
    pub make_delay: Duration,
    pub verify_delay: Duration,
    pub bill_delay: Duration,
    /// Pause between a rejected cone and the next attempt. Zero retries immediately.
    pub clerk_backoff: Duration,
    /// Upper bound on each cashier wait. `None` waits forever.
    pub billing_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            customers: NUM_OF_CUSTOMERS,
            min_units: MIN_NUM_OF_CONES,
            max_units: MAX_NUM_OF_CONES,
            seed: None,
            browse_delay: Duration::from_micros(200),
            make_delay: Duration::from_micros(100),
            verify_delay: Duration::from_micros(100),
            bill_delay: Duration::from_micros(100),
            clerk_backoff: Duration::ZERO,
            billing_timeout: None,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_units == 0 {
            return Err(ConfigError::ZeroMinUnits);
        }
        if self.min_units > self.max_units {
            return Err(ConfigError::EmptyUnitRange {
                min: self.min_units,
                max: self.max_units,
            });
        }
        Ok(())
    }

    pub fn unit_range(&self) -> RangeInclusive<usize> {
        self.min_units..=self.max_units
    }

    /// Draws how many cones each customer wants.
    pub fn draw_orders<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        (0..self.customers)
            .map(|_| rng.gen_range(self.unit_range()))
            .collect()
    }
}
