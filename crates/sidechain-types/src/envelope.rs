//! # Bus message envelope
//!
//! The process-to-process message bus between the
//! Ledger and the Round Coordinator is an external collaborator: its
//! transport is out of scope, but its request/response *shape* is not — the
//! Coordinator reads finalized blocks and witness schedules through it, and
//! the bus is the seam `sidechain-bus` implements. `BusMessage<T>` is the
//! envelope every request and response travels in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two processes cooperating over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Process {
    /// Owns the chain and the embedded document store.
    Ledger,
    /// Owns the P2P witness socket map and round state.
    Coordinator,
}

/// Envelope wrapping every message that crosses the bus.
///
/// `correlation_id` ties a response back to its request; `sender` records
/// which process originated the message, matching the authority rule the
/// teacher's `AuthenticatedMessage` envelope uses for its `sender_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage<T> {
    /// Correlates a response with the request that caused it.
    pub correlation_id: Uuid,
    /// Which process originated this message.
    pub sender: Process,
    /// Unix timestamp (seconds) the message was created at.
    pub timestamp: u64,
    /// The payload.
    pub payload: T,
}

impl<T> BusMessage<T> {
    /// Wrap a fresh payload, generating a new correlation id.
    pub fn new(sender: Process, payload: T) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            sender,
            timestamp: crate::security::current_timestamp(),
            payload,
        }
    }

    /// Wrap a response payload, reusing the request's correlation id.
    pub fn reply<U>(request: &BusMessage<U>, sender: Process, payload: T) -> Self {
        Self {
            correlation_id: request.correlation_id,
            sender,
            timestamp: crate::security::current_timestamp(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_reuses_correlation_id() {
        let request = BusMessage::new(Process::Coordinator, 1u8);
        let response = BusMessage::reply(&request, Process::Ledger, "ok");
        assert_eq!(request.correlation_id, response.correlation_id);
        assert_eq!(response.sender, Process::Ledger);
    }
}
