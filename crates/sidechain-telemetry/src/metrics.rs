//! Prometheus metrics for the sidechain node.
//!
//! All metrics follow the naming convention: `sidechain_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., blocks_produced_total)
//! - **Gauge**: Value that can go up or down (e.g., chain_height)
//! - **Histogram**: Distribution of values (e.g., contract_call_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LEDGER METRICS
    // =========================================================================

    /// Total blocks produced
    pub static ref BLOCKS_PRODUCED: Counter = Counter::new(
        "sidechain_ledger_blocks_produced_total",
        "Total number of blocks produced"
    ).expect("metric creation failed");

    /// Current chain height
    pub static ref CHAIN_HEIGHT: Gauge = Gauge::new(
        "sidechain_ledger_chain_height",
        "Height of the latest block in the chain"
    ).expect("metric creation failed");

    /// Block production duration
    pub static ref BLOCK_PRODUCTION_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "sidechain_ledger_block_production_duration_seconds",
            "Time spent assembling and persisting a block"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // EXECUTOR METRICS
    // =========================================================================

    /// Total transactions executed
    pub static ref TRANSACTIONS_EXECUTED: CounterVec = CounterVec::new(
        Opts::new("sidechain_executor_transactions_executed_total", "Total transactions executed"),
        &["outcome"]  // outcome: ok/error
    ).expect("metric creation failed");

    /// Contract deployments
    pub static ref CONTRACTS_DEPLOYED: Counter = Counter::new(
        "sidechain_executor_contracts_deployed_total",
        "Total number of contracts deployed"
    ).expect("metric creation failed");

    /// VM timeouts (contract calls aborted for running past budget)
    pub static ref VM_TIMEOUTS: Counter = Counter::new(
        "sidechain_executor_vm_timeouts_total",
        "Total number of contract calls aborted for exceeding their time budget"
    ).expect("metric creation failed");

    /// Contract call duration
    pub static ref CONTRACT_CALL_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "sidechain_executor_contract_call_duration_seconds",
            "Time spent executing a single contract call"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap()),
        &["contract"]
    ).expect("metric creation failed");

    // =========================================================================
    // ROUND COORDINATOR METRICS
    // =========================================================================

    /// Round proposals initiated by this witness
    pub static ref ROUND_PROPOSALS: Counter = Counter::new(
        "sidechain_coordinator_round_proposals_total",
        "Total number of rounds this witness proposed"
    ).expect("metric creation failed");

    /// Round submissions reaching quorum and anchored
    pub static ref ROUND_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("sidechain_coordinator_round_submissions_total", "Rounds submitted to the anchor chain"),
        &["outcome"]  // outcome: success/failure
    ).expect("metric creation failed");

    /// Peer handshake failures
    pub static ref HANDSHAKE_FAILURES: Counter = Counter::new(
        "sidechain_coordinator_handshake_failures_total",
        "Total number of rejected peer handshakes"
    ).expect("metric creation failed");

    /// Round proposal round-trip latency to a single peer
    pub static ref PEER_PROPOSAL_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "sidechain_coordinator_peer_proposal_duration_seconds",
            "Round-trip time for a proposeRound call to a peer"
        ).buckets(exponential_buckets(0.001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // LEDGER BUS METRICS (in-process IPC between Ledger and Coordinator)
    // =========================================================================

    /// Messages sent via the ledger bus
    pub static ref EVENT_BUS_MESSAGES_SENT: CounterVec = CounterVec::new(
        Opts::new("sidechain_bus_messages_sent_total", "Messages sent via the ledger bus"),
        &["request_type"]
    ).expect("metric creation failed");

    /// Messages received via the ledger bus
    pub static ref EVENT_BUS_MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("sidechain_bus_messages_received_total", "Messages received from the ledger bus"),
        &["request_type"]
    ).expect("metric creation failed");

    /// Ledger bus round-trip latency
    pub static ref EVENT_BUS_LATENCY: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "sidechain_bus_delivery_latency_seconds",
            "Time for a request/reply round trip over the ledger bus"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Errors by area and type
    pub static ref SUBSYSTEM_ERRORS: CounterVec = CounterVec::new(
        Opts::new("sidechain_errors_total", "Errors by area and type"),
        &["area", "error_type"]
    ).expect("metric creation failed");
}

/// Handle for the metrics server
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Ledger
        Box::new(BLOCKS_PRODUCED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(BLOCK_PRODUCTION_DURATION.clone()),
        // Executor
        Box::new(TRANSACTIONS_EXECUTED.clone()),
        Box::new(CONTRACTS_DEPLOYED.clone()),
        Box::new(VM_TIMEOUTS.clone()),
        Box::new(CONTRACT_CALL_DURATION.clone()),
        // Coordinator
        Box::new(ROUND_PROPOSALS.clone()),
        Box::new(ROUND_SUBMISSIONS.clone()),
        Box::new(HANDSHAKE_FAILURES.clone()),
        Box::new(PEER_PROPOSAL_DURATION.clone()),
        // Ledger bus
        Box::new(EVENT_BUS_MESSAGES_SENT.clone()),
        Box::new(EVENT_BUS_MESSAGES_RECEIVED.clone()),
        Box::new(EVENT_BUS_LATENCY.clone()),
        // Errors
        Box::new(SUBSYSTEM_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
