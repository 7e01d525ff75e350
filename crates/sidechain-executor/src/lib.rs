//! # Sidechain Executor
//!
//! The deterministic sandboxed smart-contract engine : one
//! fresh `boa_engine::Context` per invocation, a fixed host API
//! (`db`, `currency`, `emit`, `assert`, `executeSmartContract`, ...), and
//! no ambient non-determinism (no clock, no RNG, no I/O).
//!
//! ## Crate structure
//!
//! - `domain/` — pure functions: the contract-wrapping template, base64
//!   decoding, name/table validation, and the `Logs` accumulator.
//! - `host/` — registers the host API into a `boa_engine::Context`.
//! - `sandbox.rs` — runs one invocation end to end inside a fresh context.
//! - `ports/` — `ExecutorApi` (inbound) and `DocumentStore`/`ContractRegistry`
//!   (outbound, supplied by `sidechain-node`).
//! - `service.rs` — `ExecutorService`: the `ExecutorApi` implementation,
//!   and the adapter onto `sidechain-ledger`'s `ContractExecutor` port.

pub mod domain;
pub mod host;
pub mod ports;
pub mod sandbox;
pub mod service;

pub use domain::{Event, Logs};
pub use ports::inbound::{DeployRequest, ExecuteRequest, ExecutorApi};
pub use ports::outbound::{ContractRegistry, DocumentStore, InMemoryContractRegistry, InMemoryDocumentStore};
pub use service::{ExecutorConfig, ExecutorService};
