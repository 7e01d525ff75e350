//! # Genesis construction
//!
//! Block 0 is
//! built deterministically from a small config rather than executed like
//! every other block: a single synthetic transaction
//! carrying `{chainId}`, no execution.

use crate::domain::block::assemble_block;
use sidechain_types::{Block, Transaction};

/// Parameters fixed at chain creation.
#[derive(Debug, Clone)]
pub struct GenesisConfig {
    /// Identifies this sidechain to itself and to peers during the
    /// handshake; carried as the genesis transaction's payload.
    pub chain_id: String,
}

/// Build block 0: `previousHash = "0"`, one synthetic transaction carrying
/// the chain id, no contract execution involved.
pub fn build_genesis(config: &GenesisConfig, timestamp: String) -> Block {
    let payload = format!("{{\"chainId\":\"{}\"}}", config.chain_id);
    let tx = Transaction::new(0, "genesis", "genesis", None, None, Some(payload));
    assemble_block(0, 0, "0".to_string(), timestamp, vec![tx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_block_number_zero_and_previous_hash_zero() {
        let genesis = build_genesis(
            &GenesisConfig { chain_id: "test-chain".into() },
            "2026-01-01T00:00:00Z".into(),
        );
        assert_eq!(genesis.block_number, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.transactions.len(), 1);
    }

    #[test]
    fn genesis_is_deterministic_for_the_same_config() {
        let config = GenesisConfig { chain_id: "test-chain".into() };
        let a = build_genesis(&config, "2026-01-01T00:00:00Z".into());
        let b = build_genesis(&config, "2026-01-01T00:00:00Z".into());
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn distinct_chain_ids_yield_distinct_genesis_hashes() {
        let a = build_genesis(&GenesisConfig { chain_id: "a".into() }, "2026-01-01T00:00:00Z".into());
        let b = build_genesis(&GenesisConfig { chain_id: "b".into() }, "2026-01-01T00:00:00Z".into());
        assert_ne!(a.hash, b.hash);
    }
}
