//! # Host API registration
//!
//! the host API table, wired into a fresh `boa_engine::Context`
//! per invocation. Every function here is a capability: the sandbox has no
//! ambient access to anything not registered through
//! [`register_host_api`] — no clock, no RNG, no filesystem, no network,
//! matching the determinism requirements in §4.2.

pub mod currency;

use crate::domain::Logs;
use crate::ports::outbound::{ContractRegistry, DocumentStore};
use boa_engine::object::builtins::JsArray;
use boa_engine::object::FunctionObjectBuilder;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsError, JsNativeError, JsResult, JsValue, NativeFunction};
use sidechain_types::ExecutorError;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Whether the sandbox is running `createSSC` (deploy) or an ordinary
/// action (execute) — gates `db.createTable` vs. `db.getTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Running at deploy time: `db.createTable` is available, `db.getTable`
    /// is not.
    Deploy,
    /// Running an ordinary action: `db.getTable` is available,
    /// `db.createTable` is not.
    Execute,
}

/// Re-entry callback used by the `executeSmartContract` host function.
/// `sidechain_executor::service` builds this closure so `host` never needs
/// to know about `ExecutorService` directly.
pub type ReentryFn = dyn Fn(String, String, Option<String>) -> Result<Logs, ExecutorError>;

/// Everything the host API needs for one sandboxed invocation.
pub struct HostEnv {
    /// The transaction's sender (or, for a nested call, the *outer*
    /// sender — "intentional: contracts act as
    /// intermediaries, not principals").
    pub sender: String,
    /// The contract's deployer.
    pub owner: String,
    /// The anchor block the invoking transaction referenced.
    pub ref_anchor_block_number: u64,
    /// `"createSSC"` at deploy time, the requested action at execute time.
    pub action: String,
    /// The contract this invocation is running inside.
    pub contract: String,
    /// Deploy vs. execute — gates which `db.*` methods are registered.
    pub mode: Mode,
    /// The decoded JSON payload, or `None`.
    pub payload: Option<serde_json::Value>,
    /// The document store backing `db.*`.
    pub store: Arc<dyn DocumentStore>,
    /// The contract registry backing `db.getTable`'s ownership check.
    pub registry: Arc<dyn ContractRegistry>,
    /// Accumulates `emit`/`assert`/propagated nested logs.
    pub logs: Rc<RefCell<Logs>>,
    /// Re-entry into the Executor for `executeSmartContract`.
    pub reentry: Rc<ReentryFn>,
}

fn js_err(message: impl Into<String>) -> JsError {
    JsNativeError::typ().with_message(message.into()).into()
}

/// Register every host binding as a global in `context`.
pub fn register_host_api(context: &mut Context, env: HostEnv) -> JsResult<()> {
    let env = Rc::new(env);

    context.register_global_property(
        js_string!("sender"),
        js_string!(env.sender.clone()),
        Attribute::all(),
    )?;
    context.register_global_property(js_string!("owner"), js_string!(env.owner.clone()), Attribute::all())?;
    let ref_anchor = JsValue::from(env.ref_anchor_block_number as f64);
    context.register_global_property(js_string!("refAnchorBlockNumber"), ref_anchor.clone(), Attribute::all())?;
    context.register_global_property(js_string!("refSteemBlockNumber"), ref_anchor, Attribute::all())?;
    context.register_global_property(js_string!("action"), js_string!(env.action.clone()), Attribute::all())?;

    let payload_value = match &env.payload {
        Some(json) => JsValue::from_json(json, context)?,
        None => JsValue::null(),
    };
    context.register_global_property(js_string!("payload"), payload_value, Attribute::all())?;

    register_debug(context)?;
    register_emit(context, &env)?;
    register_assert(context, &env)?;
    register_db(context, &env)?;
    register_currency(context)?;
    register_execute_smart_contract(context, &env)?;

    Ok(())
}

fn register_debug(context: &mut Context) -> JsResult<()> {
    let func = NativeFunction::from_copy_closure(|_this, args, _context| {
        if let Some(message) = args.first() {
            tracing::debug!(target: "sidechain_executor::contract", message = %message.display());
        }
        Ok(JsValue::undefined())
    });
    let debug_fn = FunctionObjectBuilder::new(context.realm(), func).name(js_string!("debug")).length(1).build();
    context.register_global_property(js_string!("debug"), debug_fn, Attribute::all())
}

fn register_emit(context: &mut Context, env: &Rc<HostEnv>) -> JsResult<()> {
    let logs = env.logs.clone();
    let func = NativeFunction::from_closure(move |_this, args, context| {
        let Some(event) = args.first().and_then(|v| v.as_string()) else {
            // emit is a no-op unless `event` is a string.
            return Ok(JsValue::undefined());
        };
        let data = args.get(1).cloned().unwrap_or(JsValue::undefined());
        let json = data.to_json(context)?.unwrap_or(serde_json::Value::Null);
        logs.borrow_mut().push_event(event.to_std_string_escaped(), json.to_string());
        Ok(JsValue::undefined())
    });
    let emit_fn = FunctionObjectBuilder::new(context.realm(), func).name(js_string!("emit")).length(2).build();
    context.register_global_property(js_string!("emit"), emit_fn, Attribute::all())
}

fn register_assert(context: &mut Context, env: &Rc<HostEnv>) -> JsResult<()> {
    let logs = env.logs.clone();
    let func = NativeFunction::from_closure(move |_this, args, _context| {
        let cond = args.first().map(|v| v.to_boolean()).unwrap_or(false);
        if !cond {
            if let Some(message) = args.get(1).and_then(|v| v.as_string()) {
                logs.borrow_mut().push_error(message.to_std_string_escaped());
            }
        }
        Ok(JsValue::from(cond))
    });
    let assert_fn = FunctionObjectBuilder::new(context.realm(), func).name(js_string!("assert")).length(2).build();
    context.register_global_property(js_string!("assert"), assert_fn, Attribute::all())
}

fn register_db(context: &mut Context, env: &Rc<HostEnv>) -> JsResult<()> {
    let db_object = boa_engine::object::JsObject::with_null_proto();

    if env.mode == Mode::Deploy {
        let contract = env.contract.clone();
        let registry = env.registry.clone();
        let store = env.store.clone();
        let create_table = NativeFunction::from_closure(move |_this, args, context| {
            let Some(name) = args.first().and_then(|v| v.as_string()).map(|s| s.to_std_string_escaped()) else {
                return Err(js_err("createTable requires a name"));
            };
            if !crate::domain::validation::is_valid_table_name(&name) {
                return Err(js_err("invalid table name"));
            }
            let qualified = crate::domain::validation::qualified_table_name(&contract, &name);
            store.create_table(&qualified);
            registry.add_table(&contract, &qualified);
            Ok(JsValue::from(js_string!(qualified)))
        });
        let create_table_fn = FunctionObjectBuilder::new(context.realm(), create_table)
            .name(js_string!("createTable"))
            .length(1)
            .build();
        db_object.set(js_string!("createTable"), create_table_fn, false, context)?;
    }

    if env.mode == Mode::Execute {
        let contract = env.contract.clone();
        let registry = env.registry.clone();
        let store_for_get = env.store.clone();
        let get_table = NativeFunction::from_closure(move |_this, args, context| {
            let Some(name) = args.first().and_then(|v| v.as_string()).map(|s| s.to_std_string_escaped()) else {
                return Ok(JsValue::null());
            };
            let qualified = crate::domain::validation::qualified_table_name(&contract, &name);
            let Some(record) = registry.get(&contract) else {
                return Ok(JsValue::null());
            };
            if !record.tables.contains(&qualified) {
                return Ok(JsValue::null());
            }
            build_table_handle(context, store_for_get.clone(), qualified)
        });
        let get_table_fn = FunctionObjectBuilder::new(context.realm(), get_table)
            .name(js_string!("getTable"))
            .length(1)
            .build();
        db_object.set(js_string!("getTable"), get_table_fn, false, context)?;
    }

    let store_find = env.store.clone();
    let find_in_table = NativeFunction::from_closure(move |_this, args, context| {
        let (contract, table, query) = read_cross_table_args(args, context)?;
        let qualified = crate::domain::validation::qualified_table_name(&contract, &table);
        let docs = store_find.find(&qualified, &query);
        documents_to_js_array(context, docs)
    });
    let find_fn = FunctionObjectBuilder::new(context.realm(), find_in_table)
        .name(js_string!("findInTable"))
        .length(3)
        .build();
    db_object.set(js_string!("findInTable"), find_fn, false, context)?;

    let store_find_one = env.store.clone();
    let find_one_in_table = NativeFunction::from_closure(move |_this, args, context| {
        let (contract, table, query) = read_cross_table_args(args, context)?;
        let qualified = crate::domain::validation::qualified_table_name(&contract, &table);
        match store_find_one.find_one(&qualified, &query) {
            Some(doc) => JsValue::from_json(&doc, context),
            None => Ok(JsValue::null()),
        }
    });
    let find_one_fn = FunctionObjectBuilder::new(context.realm(), find_one_in_table)
        .name(js_string!("findOneInTable"))
        .length(3)
        .build();
    db_object.set(js_string!("findOneInTable"), find_one_fn, false, context)?;

    context.register_global_property(js_string!("db"), db_object, Attribute::all())
}

fn read_cross_table_args(args: &[JsValue], context: &mut Context) -> JsResult<(String, String, serde_json::Value)> {
    let contract = args.first().and_then(|v| v.as_string()).map(|s| s.to_std_string_escaped()).unwrap_or_default();
    let table = args.get(1).and_then(|v| v.as_string()).map(|s| s.to_std_string_escaped()).unwrap_or_default();
    let query = args
        .get(2)
        .cloned()
        .unwrap_or(JsValue::undefined())
        .to_json(context)?
        .unwrap_or(serde_json::Value::Object(Default::default()));
    Ok((contract, table, query))
}

fn documents_to_js_array(context: &mut Context, docs: Vec<serde_json::Value>) -> JsResult<JsValue> {
    let values: Result<Vec<JsValue>, JsError> = docs.iter().map(|d| JsValue::from_json(d, context)).collect();
    let array = JsArray::from_iter(values?, context);
    Ok(array.into())
}

/// A table handle returned by `db.getTable`: a plain object exposing
/// `insert`/`find`/`findOne` bound to one qualified table name, so
/// contracts never see the `<contract>_<table>` prefix.
fn build_table_handle(context: &mut Context, store: Arc<dyn DocumentStore>, qualified: String) -> JsResult<JsValue> {
    let handle = boa_engine::object::JsObject::with_null_proto();

    let insert_store = store.clone();
    let insert_table = qualified.clone();
    let insert = NativeFunction::from_closure(move |_this, args, context| {
        let doc = args
            .first()
            .cloned()
            .unwrap_or(JsValue::undefined())
            .to_json(context)?
            .unwrap_or(serde_json::Value::Object(Default::default()));
        let stored = insert_store.insert(&insert_table, doc);
        JsValue::from_json(&stored, context)
    });
    let insert_fn = FunctionObjectBuilder::new(context.realm(), insert).name(js_string!("insert")).length(1).build();
    handle.set(js_string!("insert"), insert_fn, false, context)?;

    let find_store = store.clone();
    let find_table = qualified.clone();
    let find = NativeFunction::from_closure(move |_this, args, context| {
        let query = args
            .first()
            .cloned()
            .unwrap_or(JsValue::undefined())
            .to_json(context)?
            .unwrap_or(serde_json::Value::Object(Default::default()));
        let docs = find_store.find(&find_table, &query);
        documents_to_js_array(context, docs)
    });
    let find_fn = FunctionObjectBuilder::new(context.realm(), find).name(js_string!("find")).length(1).build();
    handle.set(js_string!("find"), find_fn, false, context)?;

    let find_one_store = store;
    let find_one_table = qualified;
    let find_one = NativeFunction::from_closure(move |_this, args, context| {
        let query = args
            .first()
            .cloned()
            .unwrap_or(JsValue::undefined())
            .to_json(context)?
            .unwrap_or(serde_json::Value::Object(Default::default()));
        match find_one_store.find_one(&find_one_table, &query) {
            Some(doc) => JsValue::from_json(&doc, context),
            None => Ok(JsValue::null()),
        }
    });
    let find_one_fn =
        FunctionObjectBuilder::new(context.realm(), find_one).name(js_string!("findOne")).length(1).build();
    handle.set(js_string!("findOne"), find_one_fn, false, context)?;

    Ok(handle.into())
}

fn register_currency(context: &mut Context) -> JsResult<()> {
    let currency_object = boa_engine::object::JsObject::with_null_proto();

    macro_rules! binary_op {
        ($name:literal, $op:path) => {{
            let func = NativeFunction::from_copy_closure(|_this, args, context| {
                let a = arg_string(args, 0);
                let b = arg_string(args, 1);
                let precision = args.get(2).map(|v| v.to_number(context).unwrap_or(8.0) as u32).unwrap_or(8);
                $op(&a, &b, precision).map(|s| JsValue::from(js_string!(s))).map_err(js_err)
            });
            FunctionObjectBuilder::new(context.realm(), func).name(js_string!($name)).length(3).build()
        }};
    }

    let add_fn = binary_op!("add", currency::add);
    currency_object.set(js_string!("add"), add_fn, false, context)?;
    let subtract_fn = binary_op!("subtract", currency::subtract);
    currency_object.set(js_string!("subtract"), subtract_fn, false, context)?;
    let multiply_fn = binary_op!("multiply", currency::multiply);
    currency_object.set(js_string!("multiply"), multiply_fn, false, context)?;
    let divide_fn = binary_op!("divide", currency::divide);
    currency_object.set(js_string!("divide"), divide_fn, false, context)?;

    let to_fixed = NativeFunction::from_copy_closure(|_this, args, context| {
        let value = arg_string(args, 0);
        let precision = args.get(1).map(|v| v.to_number(context).unwrap_or(8.0) as u32).unwrap_or(8);
        currency::to_fixed(&value, precision).map(|s| JsValue::from(js_string!(s))).map_err(js_err)
    });
    let to_fixed_fn = FunctionObjectBuilder::new(context.realm(), to_fixed).name(js_string!("toFixed")).length(2).build();
    currency_object.set(js_string!("toFixed"), to_fixed_fn, false, context)?;

    macro_rules! comparison {
        ($name:literal, $op:path) => {{
            let func = NativeFunction::from_copy_closure(|_this, args, _context| {
                let a = arg_string(args, 0);
                let b = arg_string(args, 1);
                $op(&a, &b).map(JsValue::from).map_err(js_err)
            });
            FunctionObjectBuilder::new(context.realm(), func).name(js_string!($name)).length(2).build()
        }};
    }

    let equals_fn = comparison!("equals", currency::equals);
    currency_object.set(js_string!("equals"), equals_fn, false, context)?;
    let greater_than_fn = comparison!("greaterThan", currency::greater_than);
    currency_object.set(js_string!("greaterThan"), greater_than_fn, false, context)?;

    context.register_global_property(js_string!("currency"), currency_object, Attribute::all())
}

fn arg_string(args: &[JsValue], index: usize) -> String {
    args.get(index).and_then(|v| v.as_string()).map(|s| s.to_std_string_escaped()).unwrap_or_default()
}

fn register_execute_smart_contract(context: &mut Context, env: &Rc<HostEnv>) -> JsResult<()> {
    let logs = env.logs.clone();
    let reentry = env.reentry.clone();
    let func = NativeFunction::from_closure(move |_this, args, context| {
        let contract = arg_string(args, 0);
        let action = arg_string(args, 1);
        if action == "createSSC" {
            // "createSSC may never be invoked via
            // executeSmartContract".
            let error_array = JsArray::from_iter(
                [JsValue::from(js_string!("you cannot trigger the createSSC action"))],
                context,
            );
            let result = boa_engine::object::JsObject::with_null_proto();
            result.set(js_string!("errors"), error_array, false, context)?;
            return Ok(result.into());
        }

        let params_json = args.get(2).and_then(|v| v.as_string()).map(|s| s.to_std_string_escaped());

        match (reentry)(contract, action, params_json) {
            Ok(inner_logs) => {
                let result = boa_engine::object::JsObject::with_null_proto();
                if !inner_logs.errors.is_empty() {
                    let arr = JsArray::from_iter(
                        inner_logs.errors.iter().map(|e| JsValue::from(js_string!(e.clone()))),
                        context,
                    );
                    result.set(js_string!("errors"), arr, false, context)?;
                }
                if !inner_logs.events.is_empty() {
                    let values: Result<Vec<JsValue>, JsError> = inner_logs
                        .events
                        .iter()
                        .map(|e| {
                            let obj = boa_engine::object::JsObject::with_null_proto();
                            obj.set(js_string!("event"), js_string!(e.event.clone()), false, context)?;
                            let data_value: serde_json::Value =
                                serde_json::from_str(&e.data).unwrap_or(serde_json::Value::Null);
                            let data_js = JsValue::from_json(&data_value, context)?;
                            obj.set(js_string!("data"), data_js, false, context)?;
                            Ok(obj.into())
                        })
                        .collect();
                    let arr = JsArray::from_iter(values?, context);
                    result.set(js_string!("events"), arr, false, context)?;
                }
                logs.borrow_mut().extend(inner_logs);
                Ok(result.into())
            }
            Err(ExecutorError::CallDepthExceeded) => Err(js_err("call depth exceeded")),
            Err(e) => {
                let result = boa_engine::object::JsObject::with_null_proto();
                let arr = JsArray::from_iter([JsValue::from(js_string!(e.to_string()))], context);
                result.set(js_string!("errors"), arr, false, context)?;
                Ok(result.into())
            }
        }
    });
    let call_fn = FunctionObjectBuilder::new(context.realm(), func)
        .name(js_string!("executeSmartContract"))
        .length(3)
        .build();
    context.register_global_property(js_string!("executeSmartContract"), call_fn, Attribute::all())
}
