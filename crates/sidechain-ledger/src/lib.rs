//! # Sidechain Ledger
//!
//! The append-only chain of blocks : block numbering,
//! block/Merkle hashing, genesis construction, and replay.
//!
//! ## Crate structure
//!
//! - `domain/` — pure functions: Merkle commitment, block hashing/assembly,
//!   genesis construction.
//! - `ports/` — `LedgerApi` (inbound) and `ChainStore`/`ContractExecutor`
//!   (outbound, supplied by `sidechain-node`).
//! - `service.rs` — `LedgerService`, the `LedgerApi` implementation other
//!   crates depend on.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::genesis::GenesisConfig;
pub use ports::inbound::LedgerApi;
pub use ports::outbound::{ChainStore, ContractExecutor, InMemoryChainStore};
pub use service::LedgerService;
