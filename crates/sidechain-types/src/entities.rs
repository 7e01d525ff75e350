//! # Core Domain Entities
//!
//! The data model: transactions, blocks, deployed
//! contracts, and the Round Coordinator's view of witness scheduling.
//!
//! ## Clusters
//!
//! - **Chain**: `Transaction`, `Block`
//! - **Contracts**: `ContractRecord`
//! - **Consensus**: `RoundProposition`, `Schedule`, `Params`, `WitnessRecord`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// Lowercase hex-encoded SHA-256 digest (64 characters).
pub type Hash64 = String;

/// A user-submitted transaction referencing a block on the anchor chain.
///
/// Immutable once constructed: `logs` is filled in exactly once, by
/// [`Transaction::with_logs`], after execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// The anchor-chain block number this transaction references.
    pub ref_anchor_block_number: u64,
    /// Submitter-chosen unique identifier.
    pub transaction_id: String,
    /// The submitting account.
    pub sender: String,
    /// Target contract name, or `None` for a contract-less transaction.
    pub contract: Option<String>,
    /// Target action name within the contract.
    pub action: Option<String>,
    /// Canonical-JSON payload passed to the action.
    pub payload: Option<String>,
    /// `SHA256(ref_anchor_block_number || transaction_id || sender ||
    /// contract || action || payload)`, with `None` fields spelled literally
    /// as `"null"` before hashing.
    pub hash: Hash64,
    /// Canonical JSON of `{errors?, events?}`, populated after execution.
    pub logs: String,
}

/// Render an `Option<String>` using the literal textual `"null"` for `None`,
/// matching the reference hashing rule verbatim (not JSON `null`, not
/// omission).
fn null_or(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

impl Transaction {
    /// Construct a transaction and compute its `hash`; `logs` starts empty.
    pub fn new(
        ref_anchor_block_number: u64,
        transaction_id: impl Into<String>,
        sender: impl Into<String>,
        contract: Option<String>,
        action: Option<String>,
        payload: Option<String>,
    ) -> Self {
        let transaction_id = transaction_id.into();
        let sender = sender.into();
        let hash = Self::compute_hash(
            ref_anchor_block_number,
            &transaction_id,
            &sender,
            &contract,
            &action,
            &payload,
        );
        Self {
            ref_anchor_block_number,
            transaction_id,
            sender,
            contract,
            action,
            payload,
            hash,
            logs: String::new(),
        }
    }

    /// The hashing rule: lexical concatenation of every
    /// field, `None` rendered as the literal string `"null"`.
    pub fn compute_hash(
        ref_anchor_block_number: u64,
        transaction_id: &str,
        sender: &str,
        contract: &Option<String>,
        action: &Option<String>,
        payload: &Option<String>,
    ) -> Hash64 {
        sidechain_crypto::sha256_hex_concat(&[
            ref_anchor_block_number.to_string().as_bytes(),
            transaction_id.as_bytes(),
            sender.as_bytes(),
            null_or(contract).as_bytes(),
            null_or(action).as_bytes(),
            null_or(payload).as_bytes(),
        ])
    }

    /// Consume `self`, returning a transaction with `logs` set. Logs are
    /// write-once: this is the only way to attach them.
    #[must_use]
    pub fn with_logs(mut self, logs: String) -> Self {
        self.logs = logs;
        self
    }
}

/// A locally-produced block of executed transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    /// Strictly increasing; `previous + 1`.
    pub block_number: u64,
    /// Inherited from the first transaction, else 0.
    pub ref_anchor_block_number: u64,
    /// Hash of the previous block, or `"0"` for genesis.
    pub previous_hash: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Executed transactions, in block order.
    pub transactions: Vec<Transaction>,
    /// `SHA256(previous_hash || timestamp || canonical_json(transactions))`,
    /// computed only after every transaction has its `logs` attached.
    pub hash: Hash64,
    /// Merkle root over `transaction.hash`; empty string for an empty block.
    pub merkle_root: Hash64,
}

// =============================================================================
// CLUSTER B: CONTRACTS
// =============================================================================

/// A deployed contract. Write-once: redeploying an existing `name` is
/// rejected by the Executor (`ExecutorError::DuplicateContract`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Contract name; must match `[A-Za-z0-9_]+` and start with a letter or
    /// underscore to be usable as a table-name prefix.
    pub name: String,
    /// The deploying account.
    pub owner: String,
    /// The wrapped source (see §4.2's contract-wrapping template), not the
    /// raw submitted code.
    pub code: String,
    /// Fully-qualified table names (`<name>_<table>`) this contract owns.
    pub tables: BTreeSet<String>,
}

// =============================================================================
// CLUSTER C: ROUND COORDINATOR
// =============================================================================

/// In-memory, per-witness proposal state for a round in flight. Discarded
/// once the round is anchored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundProposition {
    /// The round number being proposed.
    pub round: u64,
    /// The proposer's computed round hash.
    pub round_hash: Hash64,
    /// `(witness account, signature hex)` pairs collected so far, starting
    /// with the proposer's own.
    pub signatures: Vec<(String, String)>,
    /// Ticks elapsed since the proposal was broadcast, for the
    /// `MAX_PROPOSITION_WAITING_PERIODS` timeout.
    pub ticks_waited: u32,
}

/// A `{round, witness}` row from the `schedules` table: which witnesses are
/// expected to verify a given round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    /// The round this schedule entry applies to.
    pub round: u64,
    /// The scheduled witness account.
    pub witness: String,
}

/// The global, singleton `params` record read from the witnesses contract.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Params {
    /// The current round number.
    pub round: u64,
    /// The highest block number included in the current round's range.
    pub last_block_round: u64,
    /// The highest block number finalized by a prior round.
    pub last_verified_block_number: u64,
    /// The witness scheduled to propose the current round.
    pub current_witness: String,
}

/// A registered witness: account, signing key, and optional bound IP for
/// the handshake's address check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessRecord {
    /// The witness's account name.
    pub account: String,
    /// Compressed secp256k1 public key, hex-encoded.
    pub signing_key: String,
    /// IP the witness is expected to connect from, if bound.
    pub ip: Option<String>,
    /// Whether this witness currently participates in scheduling.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_uses_literal_null_for_none_fields() {
        let with_none = Transaction::new(5, "tx1", "alice", None, None, None);
        let with_null_string = Transaction::new(
            5,
            "tx1",
            "alice",
            Some("null".to_string()),
            Some("null".to_string()),
            Some("null".to_string()),
        );
        assert_eq!(with_none.hash, with_null_string.hash);
    }

    #[test]
    fn hash_is_deterministic() {
        let a = Transaction::new(1, "t", "alice", Some("c".into()), Some("a".into()), None);
        let b = Transaction::new(1, "t", "alice", Some("c".into()), Some("a".into()), None);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn distinct_fields_hash_differently() {
        let a = Transaction::new(1, "t", "alice", None, None, None);
        let b = Transaction::new(1, "t", "bob", None, None, None);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn with_logs_is_the_only_way_to_set_logs() {
        let tx = Transaction::new(1, "t", "alice", None, None, None);
        assert!(tx.logs.is_empty());
        let tx = tx.with_logs("{\"events\":[]}".to_string());
        assert_eq!(tx.logs, "{\"events\":[]}");
    }
}
