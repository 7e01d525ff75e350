//! # Inbound port
//!
//! The primary API other components call into the Ledger through
//! . `sidechain-coordinator` reaches it over
//! `sidechain-bus` rather than calling these methods directly; `LedgerApi`
//! is the trait that bus handler wraps.

use async_trait::async_trait;
use sidechain_types::{Block, LedgerError, Transaction};

/// Operations exposed by the Ledger.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Append `tx` to the pending queue. No validation beyond field typing;
    /// the Executor is the arbiter of whether a transaction is meaningful.
    async fn submit(&self, tx: Transaction);

    /// Drain the pending queue into a new block, executing each
    /// transaction in submission order. Produces an empty-transactions
    /// block if the queue was empty.
    async fn produce_block(&self, timestamp: String) -> Result<Block, LedgerError>;

    /// Fetch a block by number.
    async fn get_block(&self, block_number: u64) -> Result<Block, LedgerError>;

    /// Fetch the highest-numbered block.
    async fn get_latest_block(&self) -> Result<Block, LedgerError>;

    /// Reinitialize the store to empty, re-insert genesis, then re-produce
    /// every existing block's transactions in order. A hash mismatch
    /// against the previously stored chain is
    /// [`LedgerError::DeterminismError`], not a silently accepted rewrite.
    async fn replay(&self) -> Result<(), LedgerError>;

    /// For every non-genesis block, verify `merkle_root`, `hash`, and
    /// `previous_hash` against its predecessor. A single pass/fail verdict.
    async fn is_chain_valid(&self) -> bool;
}
