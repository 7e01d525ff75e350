//! # Error Types
//!
//! The error taxonomy, shared by every crate so the bus
//! can carry a single error type across the process boundary.

use thiserror::Error;

/// Errors surfaced while producing or replaying blocks.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// A requested block number is not in the chain.
    #[error("block not found: {0}")]
    NotFound(u64),

    /// `replay` produced a hash that diverges from the stored chain — a
    /// fatal determinism bug.
    #[error("determinism violation: block {height} replayed to hash {got}, stored hash is {want}")]
    DeterminismError {
        /// The block height at which hashes diverged.
        height: u64,
        /// The hash produced by replay.
        got: String,
        /// The hash stored in the chain.
        want: String,
    },

    /// `produce_block`/`replay`/`save`/`load` were attempted while another
    /// exclusive operation was already in progress and the caller did not
    /// want to wait.
    #[error("ledger is busy: {0}")]
    Busy(&'static str),

    /// The outbound chain-store adapter failed.
    #[error("chain store error: {0}")]
    Store(String),
}

/// Errors surfaced by contract deployment/execution.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// Malformed transaction, unknown action, bad name, missing params.
    #[error("validation error: {0}")]
    Validation(String),

    /// Deploying over an already-used contract name.
    #[error("contract already exists")]
    DuplicateContract,

    /// `execute` against an unregistered contract name.
    #[error("contract doesn't exist")]
    UnknownContract,

    /// Attempted to invoke `createSSC` outside of deploy.
    #[error("you cannot trigger the createSSC action")]
    CreateSscForbidden,

    /// The sandbox raised an uncaught error.
    #[error("{kind}: {message}")]
    Contract {
        /// The JS error constructor name (e.g. `TypeError`).
        kind: String,
        /// The error message.
        message: String,
    },

    /// The sandbox exceeded its wall-clock budget. Treated as a
    /// `ContractError`.
    #[error("contract execution exceeded {0}ms")]
    Timeout(u64),

    /// `executeSmartContract` recursion exceeded the configured depth.
    #[error("call depth exceeded")]
    CallDepthExceeded,
}

/// Errors surfaced by the Round Coordinator.
#[derive(Debug, Clone, Error)]
pub enum CoordinatorError {
    /// A peer's proposed round hash differs from ours. Non-fatal; retried
    /// after 3s with no dispute escalation.
    #[error("round hash different")]
    ConsensusMismatch,

    /// A handshake or proposal signature failed verification.
    #[error("invalid signature")]
    InvalidSignature,

    /// A peer attempted to act without completing the handshake.
    #[error("peer not authenticated")]
    NotAuthenticated,

    /// A peer proposed/verified a round it is not scheduled for.
    #[error("witness not scheduled for round {0}")]
    NotScheduled(u64),

    /// Malformed wire field (wrong hash/signature length, non-integer
    /// round).
    #[error("malformed field: {0}")]
    Malformed(&'static str),

    /// The anchor RPC or a peer socket failed; retry with backoff.
    #[error("transport error: {0}")]
    Transport(String),
}
