//! # Outbound ports
//!
//! Dependencies the Ledger requires the host process to supply: a driven-port
//! split between the storage engine and its adapters.

use async_trait::async_trait;
use sidechain_types::{Block, ExecutorError, Transaction};

/// The embedded chain collection. The document store itself lives outside
/// this crate; this is only the seam the Ledger calls through to
/// append and read finalized blocks.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// Append a block. Callers guarantee `block.block_number == self.len()`.
    async fn put(&self, block: Block);

    /// Fetch a block by number.
    async fn get(&self, block_number: u64) -> Option<Block>;

    /// The highest-numbered block, if any has been stored.
    async fn latest(&self) -> Option<Block>;

    /// Number of blocks stored, including genesis.
    async fn len(&self) -> u64;

    /// True iff no blocks (not even genesis) have been stored.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Discard every stored block. Used by `replay` before reconstructing
    /// the chain from scratch.
    async fn clear(&self);
}

/// Runs one transaction against the contract sandbox and the embedded
/// database, returning the canonical-JSON `{errors?, events?}` logs to
/// attach to it (the "Executor ... returns events/errors that
/// are recorded in the transaction's logs").
///
/// The Ledger never constructs an executor itself; `sidechain-node` wires a
/// `sidechain-executor` adapter implementing this trait, which keeps the
/// Ledger crate free of any dependency on the sandbox.
#[async_trait]
pub trait ContractExecutor: Send + Sync {
    /// Execute `tx` and return its logs. Infrastructure failures (sandbox
    /// panics, host API wiring bugs) are the only things that surface as
    /// `Err`; contract-level failures are captured in the returned logs.
    async fn execute(&self, tx: &Transaction) -> Result<String, ExecutorError>;

    /// Discard every deployed contract and table. `replay` calls this
    /// alongside [`ChainStore::clear`] so a redeployed contract doesn't
    /// collide with the copy left over from the run being replayed.
    async fn reset(&self);
}

/// Reference in-memory [`ChainStore`]. Production wiring is a
/// `sidechain-node` adapter over the embedded document store; this is the
/// one used by every test in this crate and by `replay` round-trips.
#[derive(Default)]
pub struct InMemoryChainStore {
    blocks: tokio::sync::Mutex<Vec<Block>>,
}

impl InMemoryChainStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChainStore for InMemoryChainStore {
    async fn put(&self, block: Block) {
        self.blocks.lock().await.push(block);
    }

    async fn get(&self, block_number: u64) -> Option<Block> {
        self.blocks
            .lock()
            .await
            .get(block_number as usize)
            .cloned()
    }

    async fn latest(&self) -> Option<Block> {
        self.blocks.lock().await.last().cloned()
    }

    async fn len(&self) -> u64 {
        self.blocks.lock().await.len() as u64
    }

    async fn clear(&self) {
        self.blocks.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidechain_types::Block;

    fn block(n: u64) -> Block {
        Block {
            block_number: n,
            ref_anchor_block_number: 0,
            previous_hash: "0".into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            transactions: vec![],
            hash: format!("{n:064}"),
            merkle_root: String::new(),
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let store = InMemoryChainStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.latest().await, None);
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryChainStore::new();
        store.put(block(0)).await;
        store.put(block(1)).await;
        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(1).await.unwrap().block_number, 1);
        assert_eq!(store.latest().await.unwrap().block_number, 1);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = InMemoryChainStore::new();
        store.put(block(0)).await;
        store.clear().await;
        assert!(store.is_empty().await);
    }
}
