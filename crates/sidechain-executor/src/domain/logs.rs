//! # Transaction logs
//!
//! A transaction's `logs` field is the canonical JSON of
//! `{errors?, events?}`, populated exactly once, after execution. `Logs` is
//! the in-sandbox accumulator `emit`/`assert` append to; [`Logs::into_json`]
//! produces the string that becomes `Transaction.logs`.

use serde::{Deserialize, Serialize};

/// One `emit(event, data)` call recorded during execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// The event name the contract chose.
    pub event: String,
    /// The event payload, as canonical JSON.
    pub data: String,
}

/// Errors and events accumulated over one `deploy`/`execute` invocation,
/// including everything propagated up from nested `executeSmartContract`
/// calls ("the callee's errors and events are appended to
/// the outer contract's logs").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Logs {
    /// Messages appended by `assert(false, msg)` or an uncaught sandbox
    /// error.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
    /// Events appended by `emit(event, data)`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<Event>,
}

impl Logs {
    /// An empty log set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error message.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Append an event, iff `event` is a non-empty string — mirrors
    /// `emit`'s "iff `event` is a string" contract.
    pub fn push_event(&mut self, event: String, data: String) {
        self.events.push(Event { event, data });
    }

    /// Merge another invocation's logs into this one, preserving order
    /// (errors first, then events, in the order each batch was produced).
    pub fn extend(&mut self, other: Logs) {
        self.errors.extend(other.errors);
        self.events.extend(other.events);
    }

    /// `true` if neither `errors` nor `events` has any entries.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.events.is_empty()
    }

    /// Render as the canonical JSON stored on `Transaction.logs`. Empty
    /// logs render as `"{}"`, matching "omit empty keys" rather than
    /// serializing `null`.
    pub fn into_json(self) -> String {
        serde_json::to_string(&self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_logs_render_as_empty_object() {
        assert_eq!(Logs::new().into_json(), "{}");
    }

    #[test]
    fn errors_and_events_round_trip() {
        let mut logs = Logs::new();
        logs.push_error("boom");
        logs.push_event("transfer".into(), "{\"amount\":\"1\"}".into());
        let json = logs.into_json();
        assert!(json.contains("\"errors\":[\"boom\"]"));
        assert!(json.contains("\"events\":[{"));
    }

    #[test]
    fn extend_preserves_order() {
        let mut outer = Logs::new();
        outer.push_error("outer-error");
        let mut inner = Logs::new();
        inner.push_error("inner-error");
        outer.extend(inner);
        assert_eq!(outer.errors, vec!["outer-error", "inner-error"]);
    }
}
