//! Witness P2P transport: the wire framing is stated but not designed
//! upstream, so this is the concrete realization. One frame type
//! multiplexes the two message kinds the peer wire protocol defines —
//! `handshake` and `proposeRound` — over a single socket per peer,
//! preserving per-peer ordering.
//!
//! A `tokio-tungstenite` client loop drives the
//! outbound half; an axum WebSocket upgrade handles the
//! inbound half.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use sidechain_coordinator::ports::outbound::PeerTransport;
use sidechain_coordinator::CoordinatorApi;
use sidechain_types::CoordinatorError;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use sidechain_coordinator::wire::{AuthChallenge, HandshakeMessage, ProposeRoundAck, ProposeRoundRequest};
use sidechain_crypto::Secp256k1KeyPair;

/// Build the handshake message this node offers to every peer it dials:
/// a fresh challenge token signed with our own key, per the wire shape
/// `{authToken, signature, account}`.
pub fn build_handshake(account: &str, signing_key: &Secp256k1KeyPair) -> anyhow::Result<HandshakeMessage> {
    let auth_token = sidechain_coordinator::handshake::generate_auth_token();
    let challenge = AuthChallenge { auth_token: &auth_token };
    let bytes = serde_json::to_vec(&challenge)?;
    let digest_hex = sidechain_crypto::sha256_hex(&bytes);
    let digest: [u8; 32] = hex::decode(digest_hex)?.try_into().map_err(|_| anyhow::anyhow!("digest not 32 bytes"))?;
    let signature = signing_key.sign_prehash(&digest)?;
    Ok(HandshakeMessage { auth_token, signature: signature.to_hex(), account: account.to_string() })
}

/// The single frame type every message on a peer socket is wrapped in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum PeerFrame {
    Handshake(HandshakeMessage),
    HandshakeAck(HandshakeMessage),
    ProposeRound(ProposeRoundRequest),
    ProposeRoundAck(ProposeRoundAck),
}

async fn send_frame(
    socket: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
    frame: &PeerFrame,
) -> Result<(), CoordinatorError> {
    let text = serde_json::to_string(frame).map_err(|e| CoordinatorError::Transport(e.to_string()))?;
    socket
        .send(TungsteniteMessage::Text(text))
        .await
        .map_err(|e| CoordinatorError::Transport(e.to_string()))
}

async fn recv_frame(socket: &mut WebSocketStream<MaybeTlsStream<TcpStream>>) -> Result<PeerFrame, CoordinatorError> {
    loop {
        match socket.next().await {
            Some(Ok(TungsteniteMessage::Text(text))) => {
                return serde_json::from_str(&text).map_err(|e| CoordinatorError::Transport(e.to_string()));
            }
            Some(Ok(TungsteniteMessage::Ping(_))) | Some(Ok(TungsteniteMessage::Pong(_))) => continue,
            Some(Ok(_)) => return Err(CoordinatorError::Transport("unexpected binary frame".to_string())),
            Some(Err(e)) => return Err(CoordinatorError::Transport(e.to_string())),
            None => return Err(CoordinatorError::Transport("peer closed connection".to_string())),
        }
    }
}

/// Outbound half: dials a peer's WebSocket endpoint, performs the
/// handshake, and relays `proposeRound` requests. Connections are
/// short-lived — opened per call rather than pooled, since at most one
/// round is ever in flight
pub struct WsPeerTransport {
    /// Witness account -> `ws(s)://host:port/peer` endpoint.
    endpoints: HashMap<String, String>,
    handshake: HandshakeMessage,
    request_timeout: Duration,
}

impl WsPeerTransport {
    pub fn new(endpoints: HashMap<String, String>, handshake: HandshakeMessage, request_timeout: Duration) -> Self {
        Self { endpoints, handshake, request_timeout }
    }

    async fn dial(&self, witness: &str) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>, CoordinatorError> {
        let url = self
            .endpoints
            .get(witness)
            .ok_or_else(|| CoordinatorError::Transport(format!("no endpoint configured for witness {witness}")))?;
        let (mut socket, _) = connect_async(url).await.map_err(|e| CoordinatorError::Transport(e.to_string()))?;

        send_frame(&mut socket, &PeerFrame::Handshake(self.handshake.clone())).await?;
        match recv_frame(&mut socket).await? {
            PeerFrame::HandshakeAck(ack) => {
                if ack.account != witness {
                    return Err(CoordinatorError::Transport(format!(
                        "handshake account mismatch: expected {witness}, got {}",
                        ack.account
                    )));
                }
            }
            _ => return Err(CoordinatorError::Transport("expected handshake ack".to_string())),
        }
        Ok(socket)
    }
}

#[async_trait]
impl PeerTransport for WsPeerTransport {
    async fn send_propose_round(
        &self,
        witness: &str,
        request: ProposeRoundRequest,
    ) -> Result<ProposeRoundAck, CoordinatorError> {
        let call = async {
            let mut socket = self.dial(witness).await?;
            send_frame(&mut socket, &PeerFrame::ProposeRound(request)).await?;
            match recv_frame(&mut socket).await? {
                PeerFrame::ProposeRoundAck(ack) => Ok(ack),
                _ => Err(CoordinatorError::Transport("expected proposeRound ack".to_string())),
            }
        };
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| CoordinatorError::Transport(format!("proposeRound to {witness} timed out")))?
    }
}

/// Inbound half: axum router serving the WebSocket upgrade peers dial into.
pub fn router(coordinator: Arc<dyn CoordinatorApi>) -> Router {
    Router::new().route("/peer", get(upgrade)).with_state(coordinator)
}

async fn upgrade(
    ws: WebSocketUpgrade,
    State(coordinator): State<Arc<dyn CoordinatorApi>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator, addr.ip().to_string()))
}

async fn handle_socket(mut socket: WebSocket, coordinator: Arc<dyn CoordinatorApi>, peer_ip: String) {
    let mut peer_account: Option<String> = None;

    while let Some(msg) = socket.next().await {
        let Ok(msg) = msg else { break };
        let Message::Text(text) = msg else { continue };
        let Ok(frame) = serde_json::from_str::<PeerFrame>(&text) else {
            warn!(peer_ip = %peer_ip, "malformed peer frame");
            continue;
        };

        let reply = match frame {
            PeerFrame::Handshake(message) => match coordinator.on_handshake(&peer_ip, message.clone()).await {
                Ok(ack) => {
                    peer_account = Some(message.account.clone());
                    PeerFrame::HandshakeAck(ack)
                }
                Err(e) => {
                    warn!(peer_ip = %peer_ip, error = %e, "handshake rejected");
                    sidechain_telemetry::HANDSHAKE_FAILURES.inc();
                    break;
                }
            },
            PeerFrame::ProposeRound(request) => {
                let Some(account) = peer_account.as_deref() else {
                    warn!(peer_ip = %peer_ip, "proposeRound before handshake");
                    break;
                };
                match coordinator.on_peer_proposal(account, request).await {
                    Ok(ack) => PeerFrame::ProposeRoundAck(ack),
                    Err(e) => PeerFrame::ProposeRoundAck(ProposeRoundAck::Err { error: e.to_string() }),
                }
            }
            _ => continue,
        };

        let Ok(text) = serde_json::to_string(&reply) else { break };
        if socket.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
    info!(peer_ip = %peer_ip, "peer socket closed");
}
