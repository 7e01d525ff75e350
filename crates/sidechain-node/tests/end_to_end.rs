//! Wires the real `EmbeddedDatabase` adapter behind a `LedgerService` +
//! `ExecutorService` pair and drives the scenarios through
//! the actual ledger/executor/store stack, plus the RPC surface over a real
//! bound socket.

use std::sync::Arc;
use std::time::Duration;

use sidechain_executor::{ExecutorConfig, ExecutorService};
use sidechain_ledger::{GenesisConfig, LedgerApi, LedgerService};
use sidechain_node::rpc::{self, AppState};
use sidechain_node::store::EmbeddedDatabase;
use sidechain_types::Transaction;

fn base64(source: &str) -> String {
    const TABLE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in source.as_bytes().chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = *chunk.get(1).unwrap_or(&0) as u32;
        let b2 = *chunk.get(2).unwrap_or(&0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(TABLE[(triple >> 18 & 0x3F) as usize] as char);
        out.push(TABLE[(triple >> 12 & 0x3F) as usize] as char);
        out.push(if chunk.len() > 1 { TABLE[(triple >> 6 & 0x3F) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { TABLE[(triple & 0x3F) as usize] as char } else { '=' });
    }
    out
}

const TOKEN_CONTRACT: &str = "actions.createSSC = function() { db.createTable('balances'); };\n\
    actions.mint = function(payload) { const table = db.getTable('balances'); table.insert({account: sender, amount: payload.amount}); };";

async fn wire_node(dir: &std::path::Path) -> (Arc<dyn LedgerApi>, Arc<EmbeddedDatabase>) {
    let db = Arc::new(EmbeddedDatabase::open(dir.to_str().unwrap(), "db.json").unwrap());
    let executor = Arc::new(ExecutorService::new(db.clone(), db.clone(), ExecutorConfig::default()));
    let ledger: Arc<dyn LedgerApi> = Arc::new(
        LedgerService::new(
            db.clone(),
            executor,
            GenesisConfig { chain_id: "test-chain".to_string() },
            "2026-01-01T00:00:00Z".to_string(),
        )
        .await,
    );
    (ledger, db)
}

#[tokio::test]
async fn deploy_then_mint_lands_a_row_with_no_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, db) = wire_node(dir.path()).await;

    let deploy = Transaction::new(
        1,
        "deploy-tok",
        "alice",
        Some("contract".to_string()),
        Some("deploy".to_string()),
        Some(format!("{{\"name\":\"tok\",\"code\":\"{}\"}}", base64(TOKEN_CONTRACT))),
    );
    ledger.submit(deploy).await;
    let block = ledger.produce_block("2026-01-01T00:00:01Z".to_string()).await.unwrap();
    assert_eq!(block.block_number, 1);
    assert_eq!(block.transactions[0].logs, "{}");

    let mint = Transaction::new(
        1,
        "mint-1",
        "alice",
        Some("tok".to_string()),
        Some("mint".to_string()),
        Some("{\"amount\":\"5\"}".to_string()),
    );
    ledger.submit(mint).await;
    let block = ledger.produce_block("2026-01-01T00:00:02Z".to_string()).await.unwrap();
    assert_eq!(block.transactions[0].logs, "{}");

    let rows = db.find_in_table("tok_balances", &serde_json::json!({}));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["account"], "alice");
    assert_eq!(rows[0]["amount"], "5");
}

#[tokio::test]
async fn duplicate_deploy_is_rejected_without_aborting_the_block() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _db) = wire_node(dir.path()).await;

    let code = base64("actions.createSSC = function() {};");
    let payload = format!("{{\"name\":\"tok\",\"code\":\"{code}\"}}");

    ledger
        .submit(Transaction::new(1, "d1", "alice", Some("contract".to_string()), Some("deploy".to_string()), Some(payload.clone())))
        .await;
    ledger
        .submit(Transaction::new(1, "d2", "alice", Some("contract".to_string()), Some("deploy".to_string()), Some(payload)))
        .await;

    let block = ledger.produce_block("2026-01-01T00:00:01Z".to_string()).await.unwrap();
    assert_eq!(block.transactions.len(), 2);
    assert_eq!(block.transactions[0].logs, "{}");
    assert_eq!(block.transactions[1].logs, "{\"errors\":[\"contract already exists\"]}");
}

#[tokio::test]
async fn empty_block_has_an_empty_merkle_root() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _db) = wire_node(dir.path()).await;

    let block = ledger.produce_block("2026-01-01T00:00:01Z".to_string()).await.unwrap();
    assert_eq!(block.transactions.len(), 0);
    assert_eq!(block.merkle_root, "");
}

#[tokio::test]
async fn replay_reproduces_the_same_chain_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _db) = wire_node(dir.path()).await;

    ledger
        .submit(Transaction::new(1, "t1", "alice", Some("contract".to_string()), Some("deploy".to_string()), Some(format!(
            "{{\"name\":\"tok\",\"code\":\"{}\"}}",
            base64(TOKEN_CONTRACT)
        ))))
        .await;
    let first = ledger.produce_block("2026-01-01T00:00:01Z".to_string()).await.unwrap();

    ledger.submit(Transaction::new(1, "t2", "alice", Some("tok".to_string()), Some("mint".to_string()), Some("{\"amount\":\"1\"}".to_string()))).await;
    let second = ledger.produce_block("2026-01-01T00:00:02Z".to_string()).await.unwrap();

    ledger.replay().await.unwrap();

    let replayed_first = ledger.get_block(first.block_number).await.unwrap();
    let replayed_second = ledger.get_block(second.block_number).await.unwrap();
    assert_eq!(replayed_first.hash, first.hash);
    assert_eq!(replayed_second.hash, second.hash);
}

#[tokio::test]
async fn rpc_surface_round_trips_a_submitted_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, db) = wire_node(dir.path()).await;
    let state = Arc::new(AppState { ledger: ledger.clone(), db: db.clone() });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, rpc::router(state)).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let submit_body = serde_json::json!({
        "ref_anchor_block_number": 1,
        "transaction_id": "deploy-tok",
        "sender": "alice",
        "contract": "contract",
        "action": "deploy",
        "payload": format!("{{\"name\":\"tok\",\"code\":\"{}\"}}", base64(TOKEN_CONTRACT)),
    });
    let resp = client.post(format!("{base}/transactions")).json(&submit_body).send().await.unwrap();
    assert!(resp.status().is_success());

    ledger.produce_block("2026-01-01T00:00:01Z".to_string()).await.unwrap();

    let resp = client.get(format!("{base}/blocks/latest")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["block_number"], 1);

    let resp = client.get(format!("{base}/contracts/tok")).send().await.unwrap();
    assert!(resp.status().is_success());

    // give the handler a moment past the response before tearing the test down
    tokio::time::sleep(Duration::from_millis(10)).await;
}
