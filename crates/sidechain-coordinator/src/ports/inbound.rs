//! Inbound API: the handlers driving the Coordinator's single event loop,
//! made explicit as `.await` points on a single owned value rather than
//! module-level callbacks.

use async_trait::async_trait;
use sidechain_types::CoordinatorError;

use crate::wire::{HandshakeMessage, ProposeRoundAck, ProposeRoundRequest};

/// The Round Coordinator's per-witness state machine.
#[async_trait]
pub trait CoordinatorApi: Send + Sync {
    /// Drive one 3-second tick: refresh `params`, and propose, aggregate,
    /// or time out depending on the current [`crate::service::PropositionState`].
    async fn on_tick(&self) -> Result<(), CoordinatorError>;

    /// Verifier side (`propose_round_handler`): a peer witness proposes a
    /// round hash for us to verify and countersign.
    async fn on_peer_proposal(
        &self,
        peer_account: &str,
        request: ProposeRoundRequest,
    ) -> Result<ProposeRoundAck, CoordinatorError>;

    /// Aggregate side: a peer we proposed to has replied with its
    /// countersignature (or a disagreement).
    async fn on_peer_reply(
        &self,
        peer_account: &str,
        ack: ProposeRoundAck,
    ) -> Result<(), CoordinatorError>;

    /// A peer has connected and sent its handshake challenge; verify it and
    /// return our countersignature (and, if the peer isn't yet
    /// authenticated in the other direction, our own fresh challenge).
    async fn on_handshake(
        &self,
        peer_ip: &str,
        message: HandshakeMessage,
    ) -> Result<HandshakeMessage, CoordinatorError>;
}
