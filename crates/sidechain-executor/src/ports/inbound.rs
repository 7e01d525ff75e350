//! # Inbound port
//!
//! The two entry points: `deploy` and `execute`. The
//! Ledger drives these once per transaction; `sidechain-ledger`'s
//! `ContractExecutor` adapter (see [`crate::service::ExecutorService`]'s
//! impl of that trait) is how it actually reaches them without depending on
//! the sandbox directly.

use crate::domain::Logs;
use async_trait::async_trait;
use sidechain_types::ExecutorError;

/// A `deploy` invocation: the submitted code has not yet been wrapped or
/// validated.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// The deploying account; becomes the contract's `owner`.
    pub sender: String,
    /// The anchor block number the deploying transaction referenced.
    pub ref_anchor_block_number: u64,
    /// The contract name to register.
    pub name: String,
    /// Base64-encoded contract source (pre-wrapping).
    pub code: String,
    /// Canonical-JSON params passed to `createSSC`.
    pub params: Option<String>,
}

/// An `execute` invocation against an already-deployed contract.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    /// The transaction's sender.
    pub sender: String,
    /// The anchor block number the transaction referenced.
    pub ref_anchor_block_number: u64,
    /// Target contract name.
    pub contract: String,
    /// Target action name.
    pub action: String,
    /// Canonical-JSON payload.
    pub payload: Option<String>,
}

/// The Executor's two entry points.
#[async_trait]
pub trait ExecutorApi: Send + Sync {
    /// Wrap `request.code`, register it under `request.name`, and run
    /// `createSSC` once. Fails with
    /// [`ExecutorError::DuplicateContract`] if the name is already taken.
    async fn deploy(&self, request: DeployRequest) -> Result<Logs, ExecutorError>;

    /// Run `request.action` against an already-deployed contract. Fails
    /// with [`ExecutorError::UnknownContract`] if the contract does not
    /// exist, or [`ExecutorError::CreateSscForbidden`] if `action ==
    /// "createSSC"`.
    async fn execute(&self, request: ExecuteRequest) -> Result<Logs, ExecutorError>;
}
