//! Handshake bijection : each direction of a socket
//! authenticates independently — a peer is `authenticated=true` only once
//! both directions have produced a valid signature over the other's
//! `authToken`.
//!
//! Cyclic references are avoided per Design Notes §9: sessions are keyed
//! and addressed by the peer's account, never by a back-pointer into a
//! `WitnessRecord`.

use rand::Rng;

/// Per-peer handshake progress. `authenticated()` is the bijection: true
/// only once both directions have completed.
#[derive(Debug, Clone, Default)]
pub struct HandshakeSession {
    /// This side has verified the peer's signature over a token we issued.
    pub outgoing_authenticated: bool,
    /// The peer has accepted a signature we produced over its token.
    pub incoming_authenticated: bool,
    /// The token we most recently challenged this peer with, if any.
    pub pending_challenge: Option<String>,
}

impl HandshakeSession {
    /// A socket is authenticated only once both directions complete.
    pub fn authenticated(&self) -> bool {
        self.outgoing_authenticated && self.incoming_authenticated
    }
}

/// Generate a fresh 32-character alphanumeric challenge token.
pub fn generate_auth_token() -> String {
    rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(crate::config::AUTH_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Strip the IPv6-mapped-IPv4 prefix (`::ffff:`) before comparing against a
/// witness's registered IP; preserved as-is here pending confirmation this
/// is the intended authorization rule.
pub fn normalize_ip(ip: &str) -> &str {
    ip.strip_prefix("::ffff:").unwrap_or(ip)
}
