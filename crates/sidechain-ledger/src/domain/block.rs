//! # Block assembly
//!
//! A block's `hash` commits to its previous hash, timestamp
//! and the canonical JSON of its (already-executed) transactions; its
//! `merkleRoot` commits to their individual hashes.

use crate::domain::merkle::merkle_root;
use sidechain_crypto::sha256_hex_concat;
use sidechain_types::{Block, Hash64, Transaction};

/// `SHA256(previous_hash || timestamp || canonical_json(transactions))`.
///
/// Transactions are serialized in field-declaration order via `serde_json`,
/// which is what makes this reproducible across a replay.
pub fn compute_block_hash(
    previous_hash: &str,
    timestamp: &str,
    transactions: &[Transaction],
) -> Hash64 {
    let canonical = serde_json::to_string(transactions).expect("transactions always serialize");
    sha256_hex_concat(&[previous_hash.as_bytes(), timestamp.as_bytes(), canonical.as_bytes()])
}

/// Assemble a block from its already-executed transactions. `hash` and
/// `merkle_root` are computed here; callers must not mutate a transaction's
/// `logs` afterward or the block's own hash becomes stale.
pub fn assemble_block(
    block_number: u64,
    ref_anchor_block_number: u64,
    previous_hash: String,
    timestamp: String,
    transactions: Vec<Transaction>,
) -> Block {
    let tx_hashes: Vec<Hash64> = transactions.iter().map(|tx| tx.hash.clone()).collect();
    let merkle_root = merkle_root(&tx_hashes);
    let hash = compute_block_hash(&previous_hash, &timestamp, &transactions);

    Block {
        block_number,
        ref_anchor_block_number,
        previous_hash,
        timestamp,
        transactions,
        hash,
        merkle_root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_hash_is_deterministic() {
        let a = compute_block_hash("0", "2026-01-01T00:00:00Z", &[]);
        let b = compute_block_hash("0", "2026-01-01T00:00:00Z", &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn assemble_empty_block_has_empty_merkle_root() {
        let block = assemble_block(1, 0, "0".into(), "2026-01-01T00:00:00Z".into(), vec![]);
        assert_eq!(block.merkle_root, "");
    }

    #[test]
    fn assemble_sets_ref_anchor_from_caller() {
        let tx = Transaction::new(42, "t1", "alice", None, None, None);
        let block = assemble_block(1, 42, "0".into(), "2026-01-01T00:00:00Z".into(), vec![tx]);
        assert_eq!(block.ref_anchor_block_number, 42);
        assert_ne!(block.merkle_root, "");
    }
}
