//! Error types for the store protocol.

use thiserror::Error;

/// Misuse of the verification gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    /// The manager has retired; no verification will ever be served again.
    #[error("verification gate is retired")]
    Retired,
}

/// Invalid store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("every customer must order at least one cone")]
    ZeroMinUnits,

    #[error("unit range is empty: min {min} > max {max}")]
    EmptyUnitRange { min: usize, max: usize },
}

/// Errors surfaced by a store run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A billing slot is one-shot.
    #[error("billing slot for ticket {ticket} was already raised")]
    SlotRaisedTwice { ticket: usize },

    /// More tickets handed out than there are billing slots.
    #[error("ticket {ticket} has no billing slot (only {slots} slots)")]
    TicketOutOfRange { ticket: usize, slots: usize },

    /// Only possible when a billing timeout is configured.
    #[error("cashier gave up waiting for ticket {ticket}")]
    BillingTimedOut { ticket: usize },

    /// The store closed billing before this ticket was raised.
    #[error("billing closed before ticket {ticket} was raised")]
    BillingClosed { ticket: usize },

    #[error("{role} thread panicked")]
    WorkerPanicked { role: String },

    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: String,
        #[source]
        source: std::io::Error,
    },
}
