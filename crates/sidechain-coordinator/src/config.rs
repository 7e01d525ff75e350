//! Tunables fixed by quorum size, tick cadence, and the
//! per-witness identity a [`crate::service::Coordinator`] signs rounds with.

use std::time::Duration;

/// Signatures (including the proposer's own) required before a round is
/// submitted to the anchor chain.
pub const QUORUM: usize = 3;

/// Total witnesses participating in scheduling (reference parameterization).
pub const NB_WITNESSES: usize = 4;

/// Ticks a proposition may wait for quorum before being discarded and
/// re-proposed on the following tick.
pub const MAX_PROPOSITION_WAITING_PERIODS: u32 = 20;

/// Cadence of the repeating round tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(3);

/// Delay before retrying a failed anchor submission.
pub const ANCHOR_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Delay a verifier should wait before retrying a `round hash different`
/// disagreement (no dispute escalation beyond this).
pub const CONSENSUS_MISMATCH_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Length of a handshake `authToken` in random characters.
pub const AUTH_TOKEN_LEN: usize = 32;

/// This witness's identity and the anchor-chain parameters it signs with.
pub struct CoordinatorConfig {
    /// This witness's account name.
    pub account: String,
    /// This witness's secp256k1 signing key (anchor-chain key format).
    pub signing_key: sidechain_crypto::Secp256k1KeyPair,
    /// Mixed into the anchor custom-JSON envelope id (`ssc-<chainId>`).
    pub chain_id: String,
}
