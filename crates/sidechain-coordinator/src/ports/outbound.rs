//! Outbound ports: collaborators that are external and out of scope here —
//! the anchor chain's RPC client and the witness P2P transport. Reads of
//! Ledger-owned state (blocks, schedules, params, witness records) go
//! through [`sidechain_bus::LedgerBus`] directly rather than a bespoke
//! port — the bus already exposes `GetWitness`, so a second
//! `WitnessDirectory` port would just duplicate that lookup.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sidechain_types::CoordinatorError;

use crate::wire::{AnchorCustomJson, ProposeRoundAck, ProposeRoundRequest};

/// Submits the quorum-signed custom JSON to the anchor chain.
#[async_trait]
pub trait AnchorClient: Send + Sync {
    async fn submit(&self, envelope: AnchorCustomJson) -> Result<(), CoordinatorError>;
}

/// Broadcasts `proposeRound` requests to scheduled peer witnesses and
/// collects their acks. A transport failure for one peer never blocks the
/// others — each peer's signature is verified against its own registered
/// `signingKey` independently of the rest.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn send_propose_round(
        &self,
        witness: &str,
        request: ProposeRoundRequest,
    ) -> Result<ProposeRoundAck, CoordinatorError>;
}

/// In-memory reference [`AnchorClient`] for tests: records every envelope
/// it was asked to submit, always succeeding.
#[derive(Default)]
pub struct InMemoryAnchorClient {
    submitted: Mutex<Vec<AnchorCustomJson>>,
}

impl InMemoryAnchorClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<AnchorCustomJson> {
        self.submitted.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl AnchorClient for InMemoryAnchorClient {
    async fn submit(&self, envelope: AnchorCustomJson) -> Result<(), CoordinatorError> {
        self.submitted.lock().expect("poisoned").push(envelope);
        Ok(())
    }
}

/// In-memory reference [`PeerTransport`]: holds a fixed table of canned acks
/// keyed by witness account, for tests that drive a coordinator's tick
/// without a real socket layer.
#[derive(Default)]
pub struct InMemoryPeerTransport {
    replies: Mutex<HashMap<String, ProposeRoundAck>>,
}

impl InMemoryPeerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reply(&self, witness: impl Into<String>, ack: ProposeRoundAck) {
        self.replies.lock().expect("poisoned").insert(witness.into(), ack);
    }
}

#[async_trait]
impl PeerTransport for InMemoryPeerTransport {
    async fn send_propose_round(
        &self,
        witness: &str,
        _request: ProposeRoundRequest,
    ) -> Result<ProposeRoundAck, CoordinatorError> {
        self.replies
            .lock()
            .expect("poisoned")
            .get(witness)
            .cloned()
            .ok_or_else(|| CoordinatorError::Transport(format!("no route to witness {witness}")))
    }
}
