//! # Ledger/Coordinator request-response transport
//!
//! The Round Coordinator is the only consumer of this bus: it calls
//! [`LedgerBus::call`] to ask the Ledger process for blocks, contracts,
//! schedules, params and witness records . Requests and
//! responses both travel wrapped in a [`BusMessage`] so a future out-of-process
//! transport can carry the same envelope over the wire without changing
//! either side's API.

use crate::errors::BusError;
use async_trait::async_trait;
use sidechain_types::{BusMessage, LedgerRequest, LedgerResponse, Process};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// One in-flight request, paired with the channel its reply travels back on.
struct Envelope {
    request: BusMessage<LedgerRequest>,
    reply_to: oneshot::Sender<BusMessage<LedgerResponse>>,
}

/// The Coordinator-facing side of the bus.
#[async_trait]
pub trait LedgerBus: Send + Sync {
    /// Send a request to the Ledger process and await its response.
    async fn call(&self, request: LedgerRequest) -> Result<LedgerResponse, BusError>;
}

/// A pending request delivered to the Ledger side, paired with a handle to
/// send the eventual response back to the caller that is still awaiting it.
pub struct ReplyHandle {
    correlation_id: Uuid,
    reply_to: oneshot::Sender<BusMessage<LedgerResponse>>,
}

impl ReplyHandle {
    /// Send the response, completing the matching [`LedgerBus::call`].
    ///
    /// Dropping a `ReplyHandle` instead of calling this is not an error: the
    /// caller simply sees [`BusError::NoResponse`].
    pub fn reply(self, response: LedgerResponse) {
        let envelope = BusMessage {
            correlation_id: self.correlation_id,
            sender: Process::Ledger,
            timestamp: sidechain_types::current_timestamp(),
            payload: response,
        };
        // The caller may have already timed out and dropped its receiver.
        let _ = self.reply_to.send(envelope);
    }
}

/// The Ledger-facing side of the bus: a stream of inbound requests.
pub struct LedgerEndpoint {
    receiver: mpsc::Receiver<Envelope>,
}

impl LedgerEndpoint {
    /// Wait for the next request, returning it alongside a handle to reply.
    ///
    /// Returns `None` once every [`InMemoryLedgerBus`] sender has been
    /// dropped, signalling the Coordinator side has gone away.
    pub async fn recv(&mut self) -> Option<(LedgerRequest, ReplyHandle)> {
        let envelope = self.receiver.recv().await?;
        let reply = ReplyHandle {
            correlation_id: envelope.request.correlation_id,
            reply_to: envelope.reply_to,
        };
        Some((envelope.request.payload, reply))
    }
}

/// Deterministic in-process transport standing in for an external
/// process-to-process message bus. A future IPC-backed
/// transport would implement [`LedgerBus`] the same way, swapping the
/// `mpsc` channel for a socket.
#[derive(Clone)]
pub struct InMemoryLedgerBus {
    sender: mpsc::Sender<Envelope>,
}

impl InMemoryLedgerBus {
    /// Build a connected pair: the Coordinator holds the returned bus, the
    /// Ledger task holds the returned [`LedgerEndpoint`].
    pub fn new(capacity: usize) -> (Self, LedgerEndpoint) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, LedgerEndpoint { receiver })
    }
}

#[async_trait]
impl LedgerBus for InMemoryLedgerBus {
    async fn call(&self, request: LedgerRequest) -> Result<LedgerResponse, BusError> {
        let (reply_to, reply_from) = oneshot::channel();
        let request = BusMessage::new(Process::Coordinator, request);
        let correlation_id = request.correlation_id;

        self.sender
            .send(Envelope { request, reply_to })
            .await
            .map_err(|_| BusError::LedgerGone)?;

        reply_from
            .await
            .map(|response| response.payload)
            .map_err(|_| BusError::NoResponse(correlation_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidechain_types::Params;

    #[tokio::test]
    async fn round_trips_a_request() {
        let (bus, mut endpoint) = InMemoryLedgerBus::new(8);

        tokio::spawn(async move {
            let (request, reply) = endpoint.recv().await.expect("request delivered");
            assert!(matches!(request, LedgerRequest::GetParams));
            reply.reply(LedgerResponse::Params(Params::default()));
        });

        let response = bus.call(LedgerRequest::GetParams).await.expect("response delivered");
        assert!(matches!(response, LedgerResponse::Params(_)));
    }

    #[tokio::test]
    async fn dropped_ledger_reports_gone() {
        let (bus, endpoint) = InMemoryLedgerBus::new(8);
        drop(endpoint);

        let err = bus.call(LedgerRequest::GetLatestBlock).await.unwrap_err();
        assert!(matches!(err, BusError::LedgerGone));
    }

    #[tokio::test]
    async fn dropped_reply_handle_reports_no_response() {
        let (bus, mut endpoint) = InMemoryLedgerBus::new(8);

        tokio::spawn(async move {
            let (_request, reply) = endpoint.recv().await.expect("request delivered");
            drop(reply);
        });

        let err = bus.call(LedgerRequest::GetLatestBlock).await.unwrap_err();
        assert!(matches!(err, BusError::NoResponse(_)));
    }
}
