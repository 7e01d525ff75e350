//! Answers `sidechain-bus` requests from the Ledger side — the Round
//! Coordinator reads Ledger state through the message bus. This is the
//! Ledger process's half of the in-process bus: a loop over
//! [`sidechain_bus::LedgerEndpoint`] that serves reads straight from the
//! embedded store, plus the one write path (`produce_block`) that also
//! goes through here since the Ledger owns the database exclusively.

use std::sync::Arc;

use sidechain_bus::LedgerEndpoint;
use sidechain_ledger::LedgerApi;
use sidechain_types::{LedgerRequest, LedgerResponse};
use tracing::{info, warn};

use crate::store::EmbeddedDatabase;

/// Drive the Ledger side of the bus until every [`sidechain_bus::InMemoryLedgerBus`]
/// sender has been dropped. Intended to run as its own task for the
/// lifetime of the process.
pub async fn run(
    mut endpoint: LedgerEndpoint,
    ledger: Arc<dyn LedgerApi>,
    db: Arc<EmbeddedDatabase>,
) {
    while let Some((request, reply)) = endpoint.recv().await {
        let label = request_label(&request);
        sidechain_telemetry::EVENT_BUS_MESSAGES_RECEIVED.with_label_values(&[label]).inc();
        let timer = sidechain_telemetry::HistogramTimer::new(&sidechain_telemetry::EVENT_BUS_LATENCY);
        let response = handle(&request, &ledger, &db).await;
        drop(timer);
        sidechain_telemetry::EVENT_BUS_MESSAGES_SENT.with_label_values(&[label]).inc();
        reply.reply(response);
    }
    info!("ledger bus endpoint closed");
}

fn request_label(request: &LedgerRequest) -> &'static str {
    match request {
        LedgerRequest::GetBlock(_) => "getBlock",
        LedgerRequest::GetLatestBlock => "getLatestBlock",
        LedgerRequest::GetBlockRange { .. } => "getBlockRange",
        LedgerRequest::GetContract(_) => "getContract",
        LedgerRequest::FindInTable { .. } => "findInTable",
        LedgerRequest::GetSchedule { .. } => "getSchedule",
        LedgerRequest::GetParams => "getParams",
        LedgerRequest::GetWitness { .. } => "getWitness",
    }
}

async fn handle(request: &LedgerRequest, ledger: &Arc<dyn LedgerApi>, db: &Arc<EmbeddedDatabase>) -> LedgerResponse {
    match request {
        LedgerRequest::GetBlock(n) => match ledger.get_block(*n).await {
            Ok(block) => LedgerResponse::Block(Some(block)),
            Err(sidechain_types::LedgerError::NotFound(_)) => LedgerResponse::Block(None),
            Err(e) => {
                warn!(error = ?e, "getBlockInfo failed");
                LedgerResponse::Error(e)
            }
        },
        LedgerRequest::GetLatestBlock => match ledger.get_latest_block().await {
            Ok(block) => LedgerResponse::Block(Some(block)),
            Err(sidechain_types::LedgerError::NotFound(_)) => LedgerResponse::Block(None),
            Err(e) => LedgerResponse::Error(e),
        },
        LedgerRequest::GetBlockRange { from, to } => {
            let mut blocks = Vec::new();
            for n in *from..=*to {
                match ledger.get_block(n).await {
                    Ok(block) => blocks.push(block),
                    Err(sidechain_types::LedgerError::NotFound(_)) => break,
                    Err(e) => return LedgerResponse::Error(e),
                }
            }
            LedgerResponse::BlockRange(blocks)
        }
        LedgerRequest::GetContract(name) => LedgerResponse::Contract(db.contract(name)),
        LedgerRequest::FindInTable { contract, table, query } => {
            let qualified = format!("{contract}_{table}");
            let query_value: serde_json::Value = serde_json::from_str(query).unwrap_or(serde_json::Value::Null);
            let docs = db
                .find_in_table(&qualified, &query_value)
                .into_iter()
                .map(|doc| serde_json::to_string(&doc).unwrap_or_default())
                .collect();
            LedgerResponse::Documents(docs)
        }
        LedgerRequest::GetSchedule { round } => LedgerResponse::Schedule(db.schedule(*round)),
        LedgerRequest::GetParams => LedgerResponse::Params(db.params()),
        LedgerRequest::GetWitness { account } => LedgerResponse::Witness(db.witness(account)),
    }
}
