//! # Executor service
//!
//! Wires the sandbox ([`crate::sandbox`]) to the outbound ports
//! ([`crate::ports::outbound`]), enforces the wall-clock budget and the
//! reentrancy depth limit (the design notes), and adapts the
//! result to `sidechain-ledger`'s [`sidechain_ledger::ContractExecutor`]
//! port so the Ledger never has to know a sandbox is involved at all.
//!
//! The call tree below [`deploy_core`]/[`execute_core`] is entirely
//! synchronous Rust, because `boa_engine` has no `async` story: a contract
//! calling `executeSmartContract` must get a synchronous answer before
//! control returns to the interpreter. The async boundary is exactly one
//! layer up — [`ExecutorService::deploy`]/[`execute`] run the whole
//! synchronous tree inside [`tokio::task::spawn_blocking`], racing it
//! against `vm_timeout`.

use crate::domain::validation::is_valid_contract_name;
use crate::domain::wrapping::decode_submitted_code;
use crate::domain::Logs;
use crate::host::{HostEnv, Mode, ReentryFn};
use crate::ports::inbound::{DeployRequest, ExecuteRequest, ExecutorApi};
use crate::ports::outbound::{ContractRegistry, DocumentStore};
use crate::sandbox;
use async_trait::async_trait;
use sidechain_types::{ContractRecord, ExecutorError, Transaction};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The meta-contract name and action the reference uses to route a deploy
/// transaction: `contract: "contract", action: "deploy"`, with `payload`
/// carrying `{name, code, params}`.
pub const DEPLOY_CONTRACT: &str = "contract";
/// See [`DEPLOY_CONTRACT`].
pub const DEPLOY_ACTION: &str = "deploy";

/// Tunables governing a single invocation's sandbox budget and call depth.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Per-transaction wall-clock budget (`jsVMTimeout`).
    pub vm_timeout: Duration,
    /// `executeSmartContract` recursion depth limit (Design Notes §9: "not
    /// present in the reference — strongly recommended to add").
    pub max_call_depth: u8,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            vm_timeout: Duration::from_millis(10_000),
            max_call_depth: 4,
        }
    }
}

/// Shape of a deploy transaction's decoded payload.
#[derive(Debug, serde::Deserialize)]
struct DeployPayload {
    name: String,
    code: String,
    #[serde(default)]
    params: Option<String>,
}

/// The Executor: owns no sandbox state between calls, only the ports a
/// sandboxed contract reaches through `db.*`.
pub struct ExecutorService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<dyn ContractRegistry>,
    config: ExecutorConfig,
}

impl ExecutorService {
    /// Wire an Executor over the given store/registry.
    pub fn new(store: Arc<dyn DocumentStore>, registry: Arc<dyn ContractRegistry>, config: ExecutorConfig) -> Self {
        Self { store, registry, config }
    }
}

fn parse_optional_json(payload: &Option<String>) -> Result<Option<serde_json::Value>, ExecutorError> {
    match payload {
        None => Ok(None),
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| ExecutorError::Validation(format!("invalid JSON payload: {e}"))),
    }
}

/// Build the `executeSmartContract` re-entry callback for one invocation.
///
/// The caller's `amountSTEEMSBD`/`recipient`/
/// `isSignedWithActiveKey` fields, when present, are copied into the
/// callee's sanitized params, overriding any conflicting value; `sender`
/// of the inner call is the *outer* sender, unchanged across hops.
fn build_reentry(
    store: Arc<dyn DocumentStore>,
    registry: Arc<dyn ContractRegistry>,
    depth: u8,
    max_depth: u8,
    sender: String,
    ref_anchor_block_number: u64,
    outer_payload: Option<serde_json::Value>,
) -> Rc<ReentryFn> {
    const FORWARDED_FIELDS: [&str; 3] = ["amountSTEEMSBD", "recipient", "isSignedWithActiveKey"];

    Rc::new(move |contract: String, action: String, params_json: Option<String>| -> Result<Logs, ExecutorError> {
        if depth + 1 > max_depth {
            return Err(ExecutorError::CallDepthExceeded);
        }

        let mut params_value = params_json
            .as_deref()
            .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        if let Some(outer_obj) = outer_payload.as_ref().and_then(|v| v.as_object()) {
            if let Some(params_obj) = params_value.as_object_mut() {
                for field in FORWARDED_FIELDS {
                    if let Some(value) = outer_obj.get(field) {
                        params_obj.insert(field.to_string(), value.clone());
                    }
                }
            }
        }

        let sanitized = serde_json::to_string(&params_value).ok();

        execute_core(
            &store,
            &registry,
            depth + 1,
            max_depth,
            ExecuteRequest {
                sender: sender.clone(),
                ref_anchor_block_number,
                contract,
                action,
                payload: sanitized,
            },
        )
    })
}

/// Synchronous deploy path: validate, register (write-once), wrap, run
/// `createSSC`.
fn deploy_core(
    store: &Arc<dyn DocumentStore>,
    registry: &Arc<dyn ContractRegistry>,
    max_depth: u8,
    request: DeployRequest,
) -> Result<Logs, ExecutorError> {
    if request.name.is_empty() || request.code.is_empty() {
        return Err(ExecutorError::Validation("name and code are required".to_string()));
    }
    if !is_valid_contract_name(&request.name) {
        return Err(ExecutorError::Validation(format!("invalid contract name: {}", request.name)));
    }
    if registry.get(&request.name).is_some() {
        return Err(ExecutorError::DuplicateContract);
    }

    let decoded = decode_submitted_code(&request.code).map_err(|e| ExecutorError::Validation(e.to_string()))?;
    let wrapped = sandbox::wrap_for_deploy(&decoded);

    let record = ContractRecord {
        name: request.name.clone(),
        owner: request.sender.clone(),
        code: wrapped.clone(),
        tables: BTreeSet::new(),
    };
    if !registry.put_if_absent(record) {
        // Lost a race against a concurrent deploy of the same name.
        return Err(ExecutorError::DuplicateContract);
    }

    let payload = parse_optional_json(&request.params)?;
    let reentry = build_reentry(
        store.clone(),
        registry.clone(),
        0,
        max_depth,
        request.sender.clone(),
        request.ref_anchor_block_number,
        payload.clone(),
    );

    let env = HostEnv {
        sender: request.sender.clone(),
        owner: request.sender,
        ref_anchor_block_number: request.ref_anchor_block_number,
        action: "createSSC".to_string(),
        contract: request.name,
        mode: Mode::Deploy,
        payload,
        store: store.clone(),
        registry: registry.clone(),
        logs: Rc::new(RefCell::new(Logs::new())),
        reentry,
    };

    sandbox::run(&wrapped, env)
}

/// Synchronous execute path, used both for the top-level `execute` entry
/// point and for every nested `executeSmartContract` hop.
fn execute_core(
    store: &Arc<dyn DocumentStore>,
    registry: &Arc<dyn ContractRegistry>,
    depth: u8,
    max_depth: u8,
    request: ExecuteRequest,
) -> Result<Logs, ExecutorError> {
    if request.action == "createSSC" {
        return Err(ExecutorError::CreateSscForbidden);
    }
    if depth > max_depth {
        return Err(ExecutorError::CallDepthExceeded);
    }

    let Some(record) = registry.get(&request.contract) else {
        return Err(ExecutorError::UnknownContract);
    };

    let payload = parse_optional_json(&request.payload)?;
    let reentry = build_reentry(
        store.clone(),
        registry.clone(),
        depth,
        max_depth,
        request.sender.clone(),
        request.ref_anchor_block_number,
        payload.clone(),
    );

    let env = HostEnv {
        sender: request.sender,
        owner: record.owner,
        ref_anchor_block_number: request.ref_anchor_block_number,
        action: request.action,
        contract: request.contract,
        mode: Mode::Execute,
        payload,
        store: store.clone(),
        registry: registry.clone(),
        logs: Rc::new(RefCell::new(Logs::new())),
        reentry,
    };

    sandbox::run(&record.code, env)
}

/// Race a blocking sandbox call tree against `timeout`, mapping a missed
/// deadline to [`ExecutorError::Timeout`]. The spawned task is not actually
/// killed on timeout (no preemption point exists inside `boa_engine`'s
/// tight interpreter loop) — this mirrors the reference implementation,
/// which has the same caveat with its own VM isolate.
async fn with_timeout<F>(timeout: Duration, task: F) -> Result<Logs, ExecutorError>
where
    F: FnOnce() -> Result<Logs, ExecutorError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(_join_error)) => Err(ExecutorError::Contract {
            kind: "PanicError".to_string(),
            message: "sandbox task did not complete normally".to_string(),
        }),
        Err(_elapsed) => Err(ExecutorError::Timeout(timeout.as_millis() as u64)),
    }
}

#[async_trait]
impl ExecutorApi for ExecutorService {
    #[instrument(skip(self, request), fields(contract = %request.name, sender = %request.sender))]
    async fn deploy(&self, request: DeployRequest) -> Result<Logs, ExecutorError> {
        let store = self.store.clone();
        let registry = self.registry.clone();
        let max_depth = self.config.max_call_depth;
        let result = with_timeout(self.config.vm_timeout, move || deploy_core(&store, &registry, max_depth, request)).await;
        match &result {
            Ok(_) => sidechain_telemetry::CONTRACTS_DEPLOYED.inc(),
            Err(ExecutorError::Timeout(ms)) => {
                warn!(timeout_ms = ms, "contract deploy exceeded the VM timeout");
                sidechain_telemetry::VM_TIMEOUTS.inc();
            }
            Err(_) => {}
        }
        result
    }

    #[instrument(skip(self, request), fields(contract = %request.contract, action = %request.action, sender = %request.sender))]
    async fn execute(&self, request: ExecuteRequest) -> Result<Logs, ExecutorError> {
        let store = self.store.clone();
        let registry = self.registry.clone();
        let max_depth = self.config.max_call_depth;
        let contract_label = request.contract.clone();
        let timer = sidechain_telemetry::HistogramTimer::new(
            &sidechain_telemetry::CONTRACT_CALL_DURATION.with_label_values(&[&contract_label]),
        );
        let result = with_timeout(self.config.vm_timeout, move || execute_core(&store, &registry, 0, max_depth, request)).await;
        drop(timer);
        match &result {
            Ok(_) => sidechain_telemetry::TRANSACTIONS_EXECUTED.with_label_values(&["ok"]).inc(),
            Err(ExecutorError::Timeout(ms)) => {
                warn!(timeout_ms = ms, "contract execution exceeded the VM timeout");
                sidechain_telemetry::VM_TIMEOUTS.inc();
                sidechain_telemetry::TRANSACTIONS_EXECUTED.with_label_values(&["error"]).inc();
            }
            Err(_) => sidechain_telemetry::TRANSACTIONS_EXECUTED.with_label_values(&["error"]).inc(),
        }
        result
    }
}

/// Adapter onto `sidechain-ledger`'s outbound port: the Ledger calls this
/// once per transaction and never sees a sandbox, a boa `Context`, or an
/// `ExecutorError` directly — only the canonical-JSON logs that
/// `Transaction.logs` holds.
#[async_trait]
impl sidechain_ledger::ContractExecutor for ExecutorService {
    async fn execute(&self, tx: &Transaction) -> Result<String, ExecutorError> {
        let is_deploy = tx.contract.as_deref() == Some(DEPLOY_CONTRACT) && tx.action.as_deref() == Some(DEPLOY_ACTION);

        let outcome = if is_deploy {
            match parse_deploy_payload(tx) {
                Ok(payload) => {
                    ExecutorApi::deploy(
                        self,
                        DeployRequest {
                            sender: tx.sender.clone(),
                            ref_anchor_block_number: tx.ref_anchor_block_number,
                            name: payload.name,
                            code: payload.code,
                            params: payload.params,
                        },
                    )
                    .await
                }
                Err(e) => Err(e),
            }
        } else {
            match (&tx.contract, &tx.action) {
                (Some(contract), Some(action)) => {
                    ExecutorApi::execute(
                        self,
                        ExecuteRequest {
                            sender: tx.sender.clone(),
                            ref_anchor_block_number: tx.ref_anchor_block_number,
                            contract: contract.clone(),
                            action: action.clone(),
                            payload: tx.payload.clone(),
                        },
                    )
                    .await
                }
                _ => Err(ExecutorError::Validation("transaction has no contract/action".to_string())),
            }
        };

        let logs = match outcome {
            Ok(logs) => logs,
            Err(e) => {
                let mut logs = Logs::new();
                logs.push_error(e.to_string());
                logs
            }
        };

        info!(tx = %tx.transaction_id, has_errors = !logs.errors.is_empty(), "transaction executed");
        Ok(logs.into_json())
    }

    async fn reset(&self) {
        self.store.reset();
        self.registry.reset();
    }
}

fn parse_deploy_payload(tx: &Transaction) -> Result<DeployPayload, ExecutorError> {
    let raw = tx
        .payload
        .as_deref()
        .ok_or_else(|| ExecutorError::Validation("deploy requires a payload".to_string()))?;
    serde_json::from_str(raw).map_err(|e| ExecutorError::Validation(format!("invalid deploy payload: {e}")))
}
