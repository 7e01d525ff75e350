//! # Sidechain Bus
//!
//! The request/response transport connecting the Round Coordinator to the
//! Ledger process . The Ledger owns the chain and
//! the embedded document store; every other process reaches them through a
//! [`LedgerRequest`](sidechain_types::LedgerRequest)/
//! [`LedgerResponse`](sidechain_types::LedgerResponse) exchange carried in a
//! [`BusMessage`](sidechain_types::BusMessage) envelope.
//!
//! This crate only implements the in-process shape of that bus. An
//! out-of-process transport is a drop-in [`LedgerBus`] implementation; it
//! does not change how the Coordinator calls it.

pub mod errors;
pub mod transport;

pub use errors::BusError;
pub use transport::{InMemoryLedgerBus, LedgerBus, LedgerEndpoint, ReplyHandle};

/// Default channel capacity for [`InMemoryLedgerBus::new`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
