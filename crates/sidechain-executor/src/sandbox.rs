//! # Sandbox
//!
//! One `boa_engine::Context` per invocation — no
//! cross-invocation state leak. `run` builds a fresh interpreter, registers
//! the host API from [`crate::host`], evaluates the wrapped contract
//! source, and returns whatever logs were accumulated along the way.
//!
//! Determinism falls out of what is *not* registered here:
//! no `Date`, no `Math.random`, no filesystem/network bindings — `boa_engine`
//! ships none of those by default, so the absence is free.

use crate::domain::wrapping::wrap_contract_code;
use crate::domain::Logs;
use crate::host::{register_host_api, HostEnv};
use boa_engine::{Context, Source};
use sidechain_types::ExecutorError;

/// Run `wrapped_source` (already produced by [`wrap_contract_code`], or the
/// raw wrapped code stored on a [`sidechain_types::ContractRecord`]) inside
/// a fresh isolate, returning the logs accumulated during the run.
///
/// Uncaught sandbox errors become [`ExecutorError::Contract`]; nothing ever
/// escapes as a Rust panic across this boundary (a `boa_engine` internal
/// panic would still abort the host process — the wall-clock budget in
/// [`crate::service`] is the backstop for runaway scripts, not memory
/// safety, since `boa_engine` is pure-Rust with no unsafe FFI surface to
/// begin with).
pub fn run(wrapped_source: &str, env: HostEnv) -> Result<Logs, ExecutorError> {
    let logs_handle = env.logs.clone();
    let mut context = Context::default();

    register_host_api(&mut context, env).map_err(|e| ExecutorError::Contract {
        kind: "HostSetupError".to_string(),
        message: e.to_string(),
    })?;

    let source = Source::from_bytes(wrapped_source.as_bytes());
    match context.eval(source) {
        Ok(_) => Ok(logs_handle.borrow().clone()),
        Err(err) => {
            let (kind, message) = classify_eval_error(&err);
            Err(ExecutorError::Contract { kind, message })
        }
    }
}

/// Build the wrapped source for a deploy, from the raw (already
/// base64-decoded) user code.
pub fn wrap_for_deploy(decoded_user_code: &str) -> String {
    wrap_contract_code(decoded_user_code)
}

fn classify_eval_error(err: &boa_engine::JsError) -> (String, String) {
    if let Some(native) = err.as_native() {
        (format!("{:?}", native.kind()), native.to_string())
    } else {
        ("Error".to_string(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Mode;
    use crate::ports::outbound::{InMemoryContractRegistry, InMemoryDocumentStore};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn base_env(action: &str, mode: Mode) -> HostEnv {
        let store = Arc::new(InMemoryDocumentStore::new());
        let registry = Arc::new(InMemoryContractRegistry::new());
        HostEnv {
            sender: "alice".into(),
            owner: "alice".into(),
            ref_anchor_block_number: 1,
            action: action.into(),
            contract: "tok".into(),
            mode,
            payload: None,
            store,
            registry,
            logs: Rc::new(RefCell::new(Logs::new())),
            reentry: Rc::new(|_, _, _| Ok(Logs::new())),
        }
    }

    #[test]
    fn emit_is_recorded_in_logs() {
        let source = wrap_for_deploy("actions.createSSC = function() { emit('ready', {}); };");
        let logs = run(&source, base_env("createSSC", Mode::Deploy)).unwrap();
        assert_eq!(logs.events.len(), 1);
        assert_eq!(logs.events[0].event, "ready");
    }

    #[test]
    fn assert_false_records_error_but_does_not_halt() {
        let source = wrap_for_deploy(
            "actions.createSSC = function() { assert(false, 'nope'); emit('still-ran', {}); };",
        );
        let logs = run(&source, base_env("createSSC", Mode::Deploy)).unwrap();
        assert_eq!(logs.errors, vec!["nope"]);
        assert_eq!(logs.events.len(), 1);
    }

    #[test]
    fn uncaught_throw_becomes_contract_error() {
        let source = wrap_for_deploy("actions.createSSC = function() { throw new Error('boom'); };");
        let err = run(&source, base_env("createSSC", Mode::Deploy)).unwrap_err();
        assert!(matches!(err, ExecutorError::Contract { .. }));
    }
}
