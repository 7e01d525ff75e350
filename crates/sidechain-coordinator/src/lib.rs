//! # Sidechain Round Coordinator
//!
//! Witness quorum round-hash agreement, anchored to an external chain
//! : round proposal/aggregation, the peer handshake
//! bijection, and anchor submission.
//!
//! ## Crate structure
//!
//! - `config.rs` — quorum size, tick cadence, per-witness signing identity.
//! - `wire.rs` — peer/anchor JSON frame shapes and their validators.
//! - `handshake.rs` — the two-sided auth-token challenge bijection.
//! - `domain/` — pure functions: round-hash commitment, proposition state
//!   transitions.
//! - `ports/` — `CoordinatorApi` (inbound) and `AnchorClient`/`PeerTransport`
//!   (outbound, supplied by `sidechain-node`).
//! - `service.rs` — `Coordinator`, the `CoordinatorApi` implementation.

pub mod config;
pub mod domain;
pub mod handshake;
pub mod ports;
pub mod service;
pub mod wire;

pub use config::CoordinatorConfig;
pub use ports::inbound::CoordinatorApi;
pub use ports::outbound::{AnchorClient, InMemoryAnchorClient, InMemoryPeerTransport, PeerTransport};
pub use service::{Coordinator, PropositionState};
