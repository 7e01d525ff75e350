//! # Bus request/response payloads
//!
//! The Round Coordinator never touches the Ledger's database directly —
//! the database is owned by the Ledger process; every
//! read goes through one of these requests over `sidechain-bus`.

use crate::entities::{Block, ContractRecord, Params, Schedule, WitnessRecord};
use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};

/// Requests the Coordinator (or an RPC client,) issues to
/// the Ledger process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerRequest {
    /// `getBlockInfo(n)`.
    GetBlock(u64),
    /// `getLatestBlockInfo()`.
    GetLatestBlock,
    /// A contiguous range of blocks, used to compute a round hash.
    GetBlockRange {
        /// First block number, inclusive.
        from: u64,
        /// Last block number, inclusive.
        to: u64,
    },
    /// `getContract(name)`.
    GetContract(String),
    /// `findInTable(c, t, q)` — `q` is an opaque canonical-JSON query.
    FindInTable {
        /// Owning contract.
        contract: String,
        /// Table name within the contract.
        table: String,
        /// Canonical-JSON query document.
        query: String,
    },
    /// The witnesses contract's `schedules` rows for one round.
    GetSchedule {
        /// The round number to fetch the schedule for.
        round: u64,
    },
    /// The witnesses contract's singleton `params` row.
    GetParams,
    /// A witness's registered signing key/IP.
    GetWitness {
        /// The witness account to look up.
        account: String,
    },
}

/// Responses to [`LedgerRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerResponse {
    /// A single block, if found.
    Block(Option<Block>),
    /// A contiguous range of blocks, in ascending order.
    BlockRange(Vec<Block>),
    /// A deployed contract's record, if found.
    Contract(Option<ContractRecord>),
    /// Matching documents, as canonical JSON strings.
    Documents(Vec<String>),
    /// Witnesses scheduled for a round.
    Schedule(Vec<Schedule>),
    /// The current global params.
    Params(Params),
    /// A witness's record, if registered.
    Witness(Option<WitnessRecord>),
    /// The request failed.
    Error(LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_json() {
        let req = LedgerRequest::GetBlockRange { from: 1, to: 10 };
        let json = serde_json::to_string(&req).unwrap();
        let back: LedgerRequest = serde_json::from_str(&json).unwrap();
        match back {
            LedgerRequest::GetBlockRange { from, to } => {
                assert_eq!((from, to), (1, 10));
            }
            _ => panic!("wrong variant"),
        }
    }
}
