//! Sidechain node entry point: loads configuration, initializes telemetry,
//! wires the Ledger/Executor/Coordinator behind the embedded store, and
//! serves the client RPC surface and peer transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sidechain_coordinator::{Coordinator, CoordinatorApi, CoordinatorConfig};
use sidechain_executor::{ExecutorConfig, ExecutorService};
use sidechain_ledger::{GenesisConfig, LedgerApi, LedgerService};
use sidechain_node::anchor_client::RpcAnchorClient;
use sidechain_node::config::NodeConfig;
use sidechain_node::ledger_bus;
use sidechain_node::peer_transport::{self, WsPeerTransport};
use sidechain_node::rpc::{self, AppState};
use sidechain_node::store::{spawn_autosave, EmbeddedDatabase};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_env();

    let telemetry_config = sidechain_telemetry::TelemetryConfig::from_env();
    let _telemetry = sidechain_telemetry::init_telemetry(telemetry_config)
        .await
        .map_err(|e| anyhow::anyhow!("telemetry init failed: {e}"))?;

    info!(chain_id = %config.chain_id, "starting sidechain node");

    let db = Arc::new(EmbeddedDatabase::open(&config.data_dir, &config.database_file)?);
    if let Some(witness) = &config.witness {
        db.seed_witness(&witness.account, &witness.keypair()?.public_key().to_hex());
    }
    if let Some(interval) = config.autosave_interval {
        spawn_autosave(db.clone(), interval);
    }

    let registry: Arc<dyn sidechain_executor::ports::outbound::ContractRegistry> = db.clone();
    let document_store: Arc<dyn sidechain_executor::ports::outbound::DocumentStore> = db.clone();
    let executor = Arc::new(ExecutorService::new(
        document_store,
        registry,
        ExecutorConfig { vm_timeout: config.vm_timeout, ..ExecutorConfig::default() },
    ));

    let chain_store: Arc<dyn sidechain_ledger::ChainStore> = db.clone();
    let ledger = Arc::new(
        LedgerService::new(chain_store, executor, GenesisConfig { chain_id: config.chain_id.clone() }, current_timestamp())
            .await,
    );
    let ledger_api: Arc<dyn LedgerApi> = ledger.clone();

    let (bus, endpoint) = sidechain_bus::InMemoryLedgerBus::new(64);
    tokio::spawn(ledger_bus::run(endpoint, ledger_api.clone(), db.clone()));

    let rpc_state = Arc::new(AppState { ledger: ledger_api.clone(), db: db.clone() });
    let rpc_router = rpc::router(rpc_state);
    let rpc_addr = SocketAddr::from(([0, 0, 0, 0], config.rpc_port));
    let rpc_listener = tokio::net::TcpListener::bind(rpc_addr).await?;
    info!(addr = %rpc_addr, "rpc surface listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(rpc_listener, rpc_router).await {
            error!(error = %e, "rpc server exited");
        }
    });

    if let Some(witness) = &config.witness {
        let handshake = peer_transport::build_handshake(&witness.account, &witness.keypair()?)?;

        let coordinator_config = CoordinatorConfig {
            account: witness.account.clone(),
            signing_key: witness.keypair()?,
            chain_id: config.chain_id.clone(),
        };
        let anchor: Arc<dyn sidechain_coordinator::AnchorClient> = Arc::new(RpcAnchorClient::new(config.stream_nodes.clone()));
        let peers: Arc<dyn sidechain_coordinator::PeerTransport> =
            Arc::new(WsPeerTransport::new(config.peers.clone(), handshake, config.block_interval));

        let coordinator: Arc<dyn CoordinatorApi> = Arc::new(Coordinator::new(coordinator_config, Arc::new(bus), anchor, peers));

        let peer_router = peer_transport::router(coordinator.clone());
        let p2p_addr = SocketAddr::from(([0, 0, 0, 0], config.p2p_port));
        let p2p_listener = tokio::net::TcpListener::bind(p2p_addr).await?;
        info!(addr = %p2p_addr, "peer transport listening");
        tokio::spawn(async move {
            let service = peer_router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(p2p_listener, service).await {
                error!(error = %e, "peer transport server exited");
            }
        });

        let tick_coordinator = coordinator;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sidechain_coordinator::config::TICK_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = tick_coordinator.on_tick().await {
                    error!(error = %e, "coordinator tick failed");
                }
            }
        });
    } else {
        info!("no witness identity configured, round coordinator disabled");
    }

    run_block_production(ledger_api, db, config.block_interval).await;
    Ok(())
}

/// Drain pending transactions into a new block on a fixed cadence. Not a
/// protocol requirement (the reference leaves block cadence to the
/// operator), but a single-process reference binary needs some driver.
async fn run_block_production(ledger: Arc<dyn LedgerApi>, db: Arc<EmbeddedDatabase>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let _timer = sidechain_telemetry::HistogramTimer::new(&sidechain_telemetry::BLOCK_PRODUCTION_DURATION);
        match ledger.produce_block(current_timestamp()).await {
            Ok(block) => {
                info!(block_number = block.block_number, transactions = block.transactions.len(), "block produced");
                sidechain_telemetry::BLOCKS_PRODUCED.inc();
                sidechain_telemetry::CHAIN_HEIGHT.set(block.block_number as f64);
                advance_round_if_due(&db, block.block_number);
            }
            Err(e) => error!(error = %e, "block production failed"),
        }
    }
}

/// Advance the witness schedule once new blocks exist past the last
/// scheduled round (params track `lastBlockRound`).
fn advance_round_if_due(db: &Arc<EmbeddedDatabase>, latest_block: u64) {
    let params = db.params();
    if params.current_witness.is_empty() || latest_block <= params.last_block_round {
        return;
    }
    db.advance_round(latest_block, &params.current_witness);
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
