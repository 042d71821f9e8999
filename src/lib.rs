//! An ice-cream store run by threads: customers, the clerks they hire, a single manager who
//! verifies every cone, and a cashier who bills in ticket order.

pub mod config;
pub mod error;
pub mod store;
pub mod sync;

pub use config::StoreConfig;
pub use error::{ConfigError, GateError, StoreError};
pub use store::{Shop, ShopReport};
