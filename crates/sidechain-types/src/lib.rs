//! # Sidechain Types
//!
//! Domain entities, bus envelope, and error types shared by the Ledger,
//! Executor and Round Coordinator crates.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: every cross-crate type is defined here.
//! - **Envelope authority**: `BusMessage<T>::sender` is the sole source of
//!   truth for which process originated a bus message.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;
pub mod security;

pub use entities::*;
pub use envelope::{BusMessage, Process};
pub use errors::*;
pub use ipc::*;
pub use security::*;
