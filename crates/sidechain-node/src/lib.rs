//! # Sidechain Node
//!
//! The single-process reference binary: wires `sidechain-ledger`,
//! `sidechain-executor` and `sidechain-coordinator` together behind the
//! embedded store, the client-facing RPC surface, the peer transport and
//! the anchor-chain client, each treated as an external collaborator.
//!
//! Exposed as a library too so integration tests can wire a node without
//! going through `main`.

pub mod anchor_client;
pub mod config;
pub mod ledger_bus;
pub mod peer_transport;
pub mod rpc;
pub mod store;
