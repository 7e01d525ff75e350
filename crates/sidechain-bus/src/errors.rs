//! # Bus transport errors

use thiserror::Error;

/// Failures that can occur delivering a [`crate::BusMessage`] across the bus,
/// as distinct from a [`sidechain_types::LedgerError`] returned *inside* one.
#[derive(Debug, Error)]
pub enum BusError {
    /// The Ledger side has been dropped; no request can be delivered.
    #[error("ledger endpoint closed")]
    LedgerGone,

    /// The reply channel was dropped before a response arrived, typically
    /// because the Ledger task panicked mid-request.
    #[error("no response received for request {0}")]
    NoResponse(uuid::Uuid),
}
