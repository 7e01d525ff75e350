//! Client-facing RPC surface, out of core scope but
//! contractually required: `getBlockInfo`, `getLatestBlockInfo`,
//! `findInTable`, `findOneInTable`, `getContract`, plus a `submitTransaction`
//! write path so a reference binary is actually usable end to end.
//!
//! An axum router/handler split: typed
//! extractors, a shared `Arc<AppState>`, JSON in and out.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use sidechain_ledger::LedgerApi;
use sidechain_types::Transaction;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::store::EmbeddedDatabase;

pub struct AppState {
    pub ledger: Arc<dyn LedgerApi>,
    pub db: Arc<EmbeddedDatabase>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/blocks/:number", get(get_block_info))
        .route("/blocks/latest", get(get_latest_block_info))
        .route("/contracts/:name", get(get_contract))
        .route("/contracts/:contract/tables/:table", get(find_in_table))
        .route("/contracts/:contract/tables/:table/one", get(find_one_in_table))
        .route("/transactions", post(submit_transaction))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn err(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

async fn get_block_info(State(state): State<Arc<AppState>>, Path(number): Path<u64>) -> axum::response::Response {
    match state.ledger.get_block(number).await {
        Ok(block) => Json(block).into_response(),
        Err(e) => err(StatusCode::NOT_FOUND, e.to_string()),
    }
}

async fn get_latest_block_info(State(state): State<Arc<AppState>>) -> axum::response::Response {
    match state.ledger.get_latest_block().await {
        Ok(block) => Json(block).into_response(),
        Err(e) => err(StatusCode::NOT_FOUND, e.to_string()),
    }
}

async fn get_contract(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> axum::response::Response {
    match state.db.contract(&name) {
        Some(record) => Json(record).into_response(),
        None => err(StatusCode::NOT_FOUND, format!("unknown contract {name}")),
    }
}

#[derive(Debug, Deserialize)]
struct TableQuery {
    /// Canonical-JSON query document, URL-encoded. Defaults to `{}`.
    query: Option<String>,
}

fn parse_query(raw: &Option<String>) -> serde_json::Value {
    raw.as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_else(|| serde_json::json!({}))
}

async fn find_in_table(
    State(state): State<Arc<AppState>>,
    Path((contract, table)): Path<(String, String)>,
    Query(params): Query<TableQuery>,
) -> axum::response::Response {
    let qualified = format!("{contract}_{table}");
    let query = parse_query(&params.query);
    Json(state.db.find_in_table(&qualified, &query)).into_response()
}

async fn find_one_in_table(
    State(state): State<Arc<AppState>>,
    Path((contract, table)): Path<(String, String)>,
    Query(params): Query<TableQuery>,
) -> axum::response::Response {
    let qualified = format!("{contract}_{table}");
    let query = parse_query(&params.query);
    match state.db.find_in_table(&qualified, &query).into_iter().next() {
        Some(doc) => Json(doc).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct SubmitTransactionBody {
    ref_anchor_block_number: u64,
    transaction_id: String,
    sender: String,
    contract: Option<String>,
    action: Option<String>,
    payload: Option<String>,
}

async fn submit_transaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitTransactionBody>,
) -> axum::response::Response {
    let tx = Transaction::new(
        body.ref_anchor_block_number,
        body.transaction_id,
        body.sender,
        body.contract,
        body.action,
        body.payload,
    );
    let hash = tx.hash.clone();
    state.ledger.submit(tx).await;
    Json(serde_json::json!({ "transactionId": hash })).into_response()
}
