//! # Outbound ports
//!
//! The embedded document store itself is out of scope here
//! (`findInTable`, `getCollection`, `insert`, disk persistence); these
//! traits are only the seam the sandbox's `db` host object calls through.
//!
//! Both ports are deliberately **synchronous**: the sandbox (`boa_engine`)
//! has no notion of `async`, so every `db.*`/`executeSmartContract` call a
//! contract makes must resolve before control returns to the interpreter.
//! The async boundary lives one layer up, at
//! [`crate::service::ExecutorService::deploy`]/`execute`, which run the
//! whole synchronous call tree inside `tokio::task::spawn_blocking`.

use sidechain_types::ContractRecord;
use std::collections::HashMap;
use std::sync::RwLock;

/// A single stored document, keyed by an opaque `_id` the store assigns on
/// insert.
pub type Document = serde_json::Value;

/// The embedded document store's contract-facing surface: table creation,
/// and the read/write operations `db.*` exposes to a sandboxed contract.
pub trait DocumentStore: Send + Sync {
    /// Create `<contract>_<table>` if it does not already exist.
    /// Idempotent: returns `Ok(())` whether or not the table was freshly
    /// created, matching `db.createTable`'s "idempotent" contract.
    fn create_table(&self, qualified_name: &str);

    /// `true` iff `qualified_name` has been created.
    fn table_exists(&self, qualified_name: &str) -> bool;

    /// Insert `doc`, assigning it an `_id`, and return the stored document
    /// (including the assigned `_id`).
    fn insert(&self, qualified_name: &str, doc: Document) -> Document;

    /// All documents in `qualified_name` matching every key in `query`
    /// (an empty query matches every document).
    fn find(&self, qualified_name: &str, query: &Document) -> Vec<Document>;

    /// The first document matching `query`, if any.
    fn find_one(&self, qualified_name: &str, query: &Document) -> Option<Document> {
        self.find(qualified_name, query).into_iter().next()
    }

    /// Discard every table and document, and rewind the id counter back to
    /// zero. Used when replaying the chain from genesis.
    fn reset(&self);
}

/// Contract metadata storage: write-once registration, keyed by name.
pub trait ContractRegistry: Send + Sync {
    /// Look up a deployed contract's record.
    fn get(&self, name: &str) -> Option<ContractRecord>;

    /// Register a new contract. `false` if `name` is already taken — the
    /// caller turns that into [`sidechain_types::ExecutorError::DuplicateContract`].
    fn put_if_absent(&self, record: ContractRecord) -> bool;

    /// Record a newly created table against an already-registered
    /// contract, so later `db.getTable` calls can check ownership.
    fn add_table(&self, contract: &str, qualified_name: &str);

    /// Discard every registered contract.
    fn reset(&self);
}

/// Reference in-memory [`DocumentStore`]. Production wiring is a
/// `sidechain-node` adapter over the real embedded store; every Executor
/// test in this crate runs against this one.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    tables: RwLock<HashMap<String, Vec<Document>>>,
    next_id: RwLock<u64>,
}

impl InMemoryDocumentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        let mut guard = self.next_id.write().expect("lock not poisoned");
        let id = *guard;
        *guard += 1;
        id
    }
}

fn document_matches(doc: &Document, query: &Document) -> bool {
    let Some(query_obj) = query.as_object() else {
        return true;
    };
    let Some(doc_obj) = doc.as_object() else {
        return query_obj.is_empty();
    };
    query_obj.iter().all(|(key, value)| doc_obj.get(key) == Some(value))
}

impl DocumentStore for InMemoryDocumentStore {
    fn create_table(&self, qualified_name: &str) {
        self.tables
            .write()
            .expect("lock not poisoned")
            .entry(qualified_name.to_string())
            .or_default();
    }

    fn table_exists(&self, qualified_name: &str) -> bool {
        self.tables.read().expect("lock not poisoned").contains_key(qualified_name)
    }

    fn insert(&self, qualified_name: &str, mut doc: Document) -> Document {
        let id = self.next_id();
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("_id".to_string(), serde_json::json!(id));
        }
        self.tables
            .write()
            .expect("lock not poisoned")
            .entry(qualified_name.to_string())
            .or_default()
            .push(doc.clone());
        doc
    }

    fn find(&self, qualified_name: &str, query: &Document) -> Vec<Document> {
        self.tables
            .read()
            .expect("lock not poisoned")
            .get(qualified_name)
            .map(|docs| docs.iter().filter(|d| document_matches(d, query)).cloned().collect())
            .unwrap_or_default()
    }

    fn reset(&self) {
        self.tables.write().expect("lock not poisoned").clear();
        *self.next_id.write().expect("lock not poisoned") = 0;
    }
}

/// Reference in-memory [`ContractRegistry`].
#[derive(Default)]
pub struct InMemoryContractRegistry {
    contracts: RwLock<HashMap<String, ContractRecord>>,
}

impl InMemoryContractRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContractRegistry for InMemoryContractRegistry {
    fn get(&self, name: &str) -> Option<ContractRecord> {
        self.contracts.read().expect("lock not poisoned").get(name).cloned()
    }

    fn put_if_absent(&self, record: ContractRecord) -> bool {
        let mut guard = self.contracts.write().expect("lock not poisoned");
        if guard.contains_key(&record.name) {
            return false;
        }
        guard.insert(record.name.clone(), record);
        true
    }

    fn add_table(&self, contract: &str, qualified_name: &str) {
        if let Some(record) = self.contracts.write().expect("lock not poisoned").get_mut(contract) {
            record.tables.insert(qualified_name.to_string());
        }
    }

    fn reset(&self) {
        self.contracts.write().expect("lock not poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        store.create_table("tok_balances");
        store.create_table("tok_balances");
        assert!(store.table_exists("tok_balances"));
    }

    #[test]
    fn insert_assigns_an_id() {
        let store = InMemoryDocumentStore::new();
        store.create_table("tok_balances");
        let doc = store.insert("tok_balances", serde_json::json!({"account": "alice"}));
        assert!(doc.get("_id").is_some());
    }

    #[test]
    fn find_filters_by_query_fields() {
        let store = InMemoryDocumentStore::new();
        store.create_table("tok_balances");
        store.insert("tok_balances", serde_json::json!({"account": "alice", "amount": "5"}));
        store.insert("tok_balances", serde_json::json!({"account": "bob", "amount": "1"}));

        let matches = store.find("tok_balances", &serde_json::json!({"account": "alice"}));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["account"], "alice");
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let registry = InMemoryContractRegistry::new();
        let record = ContractRecord {
            name: "tok".into(),
            owner: "alice".into(),
            code: "wrapped".into(),
            tables: Default::default(),
        };
        assert!(registry.put_if_absent(record.clone()));
        assert!(!registry.put_if_absent(record));
    }
}
