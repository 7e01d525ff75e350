//! # Ledger service
//!
//! Implements [`LedgerApi`] over a [`ChainStore`] and a [`ContractExecutor`],
//! with a single exclusivity lock standing in for the reference
//! implementation's `producing`/`saving`/`loading`/`replaying` flags —
//! a proper wait instead of a spin-wait recursion; `tokio::sync::Mutex`
//! is that wait.

use crate::domain::block::{assemble_block, compute_block_hash};
use crate::domain::genesis::{build_genesis, GenesisConfig};
use crate::domain::merkle::merkle_root;
use crate::ports::inbound::LedgerApi;
use crate::ports::outbound::{ChainStore, ContractExecutor};
use async_trait::async_trait;
use sidechain_types::{Block, LedgerError, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The Ledger: pending-transaction queue, chain store, and the executor
/// adapter it drives one transaction at a time.
pub struct LedgerService {
    chain_store: Arc<dyn ChainStore>,
    executor: Arc<dyn ContractExecutor>,
    genesis: GenesisConfig,
    pending: Mutex<Vec<Transaction>>,
    /// Held for the duration of `produce_block` and `replay`; serializes
    /// the two the way the reference flags do.
    exclusive: Mutex<()>,
}

impl LedgerService {
    /// Wire a fresh Ledger over `chain_store`/`executor`. If the store is
    /// empty, genesis is constructed and inserted immediately — the Ledger
    /// never allows `produce_block` to run before block 0 exists.
    pub async fn new(
        chain_store: Arc<dyn ChainStore>,
        executor: Arc<dyn ContractExecutor>,
        genesis: GenesisConfig,
        genesis_timestamp: String,
    ) -> Self {
        if chain_store.is_empty().await {
            let block = build_genesis(&genesis, genesis_timestamp);
            chain_store.put(block).await;
        }

        Self {
            chain_store,
            executor,
            genesis,
            pending: Mutex::new(Vec::new()),
            exclusive: Mutex::new(()),
        }
    }

    async fn execute_all(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>, LedgerError> {
        let mut executed = Vec::with_capacity(transactions.len());
        for tx in transactions {
            let logs = self
                .executor
                .execute(&tx)
                .await
                .map_err(|e| LedgerError::Store(e.to_string()))?;
            executed.push(tx.with_logs(logs));
        }
        Ok(executed)
    }
}

#[async_trait]
impl LedgerApi for LedgerService {
    async fn submit(&self, tx: Transaction) {
        self.pending.lock().await.push(tx);
    }

    async fn produce_block(&self, timestamp: String) -> Result<Block, LedgerError> {
        let _guard = self.exclusive.lock().await;

        let previous = self
            .chain_store
            .latest()
            .await
            .ok_or_else(|| LedgerError::Store("genesis not initialized".into()))?;

        let pending = std::mem::take(&mut *self.pending.lock().await);
        let ref_anchor_block_number = pending.first().map(|tx| tx.ref_anchor_block_number).unwrap_or(0);
        let tx_count = pending.len();

        let executed = self.execute_all(pending).await?;
        let block = assemble_block(
            previous.block_number + 1,
            ref_anchor_block_number,
            previous.hash.clone(),
            timestamp,
            executed,
        );

        self.chain_store.put(block.clone()).await;
        info!(block = block.block_number, tx_count, "produced block");
        Ok(block)
    }

    async fn get_block(&self, block_number: u64) -> Result<Block, LedgerError> {
        self.chain_store
            .get(block_number)
            .await
            .ok_or(LedgerError::NotFound(block_number))
    }

    async fn get_latest_block(&self) -> Result<Block, LedgerError> {
        self.chain_store.latest().await.ok_or(LedgerError::NotFound(0))
    }

    async fn replay(&self) -> Result<(), LedgerError> {
        let _guard = self.exclusive.lock().await;

        let stored_len = self.chain_store.len().await;
        let mut stored_blocks = Vec::with_capacity(stored_len as usize);
        for n in 0..stored_len {
            let block = self
                .chain_store
                .get(n)
                .await
                .ok_or(LedgerError::NotFound(n))?;
            stored_blocks.push(block);
        }

        self.chain_store.clear().await;
        self.executor.reset().await;

        let genesis_timestamp = stored_blocks
            .first()
            .map(|b| b.timestamp.clone())
            .unwrap_or_default();
        let genesis = build_genesis(&self.genesis, genesis_timestamp);

        if let Some(stored_genesis) = stored_blocks.first() {
            if genesis.hash != stored_genesis.hash {
                return Err(LedgerError::DeterminismError {
                    height: 0,
                    got: genesis.hash,
                    want: stored_genesis.hash.clone(),
                });
            }
        }
        self.chain_store.put(genesis).await;

        for stored in stored_blocks.into_iter().skip(1) {
            let executed = self.execute_all(stored.transactions.clone()).await?;
            let rebuilt = assemble_block(
                stored.block_number,
                stored.ref_anchor_block_number,
                stored.previous_hash.clone(),
                stored.timestamp.clone(),
                executed,
            );

            if rebuilt.hash != stored.hash {
                warn!(height = stored.block_number, "replay produced a divergent hash");
                return Err(LedgerError::DeterminismError {
                    height: stored.block_number,
                    got: rebuilt.hash,
                    want: stored.hash,
                });
            }
            self.chain_store.put(rebuilt).await;
        }

        info!("replay completed with no determinism violations");
        Ok(())
    }

    async fn is_chain_valid(&self) -> bool {
        let len = self.chain_store.len().await;
        if len == 0 {
            return true;
        }

        let mut previous: Option<Block> = None;
        for n in 0..len {
            let Some(block) = self.chain_store.get(n).await else {
                return false;
            };

            let tx_hashes: Vec<_> = block.transactions.iter().map(|t| t.hash.clone()).collect();
            if merkle_root(&tx_hashes) != block.merkle_root {
                return false;
            }
            if compute_block_hash(&block.previous_hash, &block.timestamp, &block.transactions) != block.hash {
                return false;
            }
            if let Some(prev) = &previous {
                if block.previous_hash != prev.hash {
                    return false;
                }
            }
            previous = Some(block);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::InMemoryChainStore;
    use sidechain_types::ExecutorError;

    struct NoopExecutor;

    #[async_trait]
    impl ContractExecutor for NoopExecutor {
        async fn execute(&self, _tx: &Transaction) -> Result<String, ExecutorError> {
            Ok("{}".to_string())
        }

        async fn reset(&self) {}
    }

    async fn new_service() -> LedgerService {
        LedgerService::new(
            Arc::new(InMemoryChainStore::new()),
            Arc::new(NoopExecutor),
            GenesisConfig { chain_id: "test".into() },
            "2026-01-01T00:00:00Z".into(),
        )
        .await
    }

    /// Mimics the Executor's write-once contract registry closely enough
    /// to catch a `replay` that forgets to reset it: a deploy transaction
    /// succeeds once and fails with `"already deployed"` on every
    /// subsequent attempt against the same name, until `reset` runs.
    struct DeployTrackingExecutor {
        deployed: Mutex<std::collections::HashSet<String>>,
    }

    impl DeployTrackingExecutor {
        fn new() -> Self {
            Self { deployed: Mutex::new(std::collections::HashSet::new()) }
        }
    }

    #[async_trait]
    impl ContractExecutor for DeployTrackingExecutor {
        async fn execute(&self, tx: &Transaction) -> Result<String, ExecutorError> {
            if tx.contract.as_deref() == Some("contract") && tx.action.as_deref() == Some("deploy") {
                let mut deployed = self.deployed.lock().await;
                if !deployed.insert(tx.sender.clone()) {
                    return Ok(r#"{"errors":["contract already exists"]}"#.to_string());
                }
            }
            Ok("{}".to_string())
        }

        async fn reset(&self) {
            self.deployed.lock().await.clear();
        }
    }

    #[tokio::test]
    async fn replay_resets_executor_state_before_re_executing_a_deploy() {
        let ledger = LedgerService::new(
            Arc::new(InMemoryChainStore::new()),
            Arc::new(DeployTrackingExecutor::new()),
            GenesisConfig { chain_id: "test".into() },
            "2026-01-01T00:00:00Z".into(),
        )
        .await;

        ledger
            .submit(Transaction::new(1, "deploy-tok", "alice", Some("contract".into()), Some("deploy".into()), None))
            .await;
        let block = ledger.produce_block("2026-01-01T00:00:01Z".into()).await.unwrap();
        assert_eq!(block.transactions[0].logs, "{}");

        ledger.replay().await.unwrap();

        let replayed = ledger.get_block(block.block_number).await.unwrap();
        assert_eq!(replayed.hash, block.hash);
        assert_eq!(replayed.transactions[0].logs, "{}");
    }

    #[tokio::test]
    async fn new_ledger_has_genesis() {
        let ledger = new_service().await;
        let genesis = ledger.get_block(0).await.unwrap();
        assert_eq!(genesis.block_number, 0);
        assert_eq!(genesis.previous_hash, "0");
    }

    #[tokio::test]
    async fn produce_block_on_empty_queue_still_produces_a_block() {
        let ledger = new_service().await;
        let block = ledger.produce_block("2026-01-01T00:00:01Z".into()).await.unwrap();
        assert_eq!(block.block_number, 1);
        assert_eq!(block.transactions.len(), 0);
        assert_eq!(block.merkle_root, "");
    }

    #[tokio::test]
    async fn submitted_transactions_land_in_the_next_block() {
        let ledger = new_service().await;
        ledger.submit(Transaction::new(1, "t1", "alice", None, None, None)).await;
        ledger.submit(Transaction::new(1, "t2", "bob", None, None, None)).await;

        let block = ledger.produce_block("2026-01-01T00:00:01Z".into()).await.unwrap();
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.ref_anchor_block_number, 1);
        assert!(!block.transactions[0].logs.is_empty());
    }

    #[tokio::test]
    async fn chain_grows_block_numbers_sequentially() {
        let ledger = new_service().await;
        let first = ledger.produce_block("2026-01-01T00:00:01Z".into()).await.unwrap();
        let second = ledger.produce_block("2026-01-01T00:00:02Z".into()).await.unwrap();
        assert_eq!(first.block_number, 1);
        assert_eq!(second.block_number, 2);
        assert_eq!(second.previous_hash, first.hash);
    }

    #[tokio::test]
    async fn replay_reproduces_identical_hashes() {
        let ledger = new_service().await;
        ledger.submit(Transaction::new(1, "t1", "alice", None, None, None)).await;
        ledger.produce_block("2026-01-01T00:00:01Z".into()).await.unwrap();
        ledger.produce_block("2026-01-01T00:00:02Z".into()).await.unwrap();

        let before = ledger.get_latest_block().await.unwrap();
        ledger.replay().await.unwrap();
        let after = ledger.get_latest_block().await.unwrap();
        assert_eq!(before.hash, after.hash);
    }

    #[tokio::test]
    async fn freshly_produced_chain_is_valid() {
        let ledger = new_service().await;
        ledger.submit(Transaction::new(1, "t1", "alice", None, None, None)).await;
        ledger.produce_block("2026-01-01T00:00:01Z".into()).await.unwrap();
        assert!(ledger.is_chain_valid().await);
    }

    #[tokio::test]
    async fn get_unknown_block_is_not_found() {
        let ledger = new_service().await;
        let err = ledger.get_block(99).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(99)));
    }
}
