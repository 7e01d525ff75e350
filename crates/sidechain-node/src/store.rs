//! The embedded document store: its interface is stated upstream but its
//! implementation is not, so this is the one seam the core asks a host
//! process to fill in: a single JSON file at `<dataDir>/<databaseFile>`
//! holding the `chain`, `contracts`, and `<contract>_<table>` collections,
//! plus the witness/schedule/params rows the Round Coordinator reads
//! through the bus.
//!
//! A file-adapter split: one in-memory
//! representation behind a lock, flushed to disk on explicit `save()` and
//! on an autosave tick.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sidechain_executor::ports::outbound::{ContractRegistry, Document, DocumentStore};
use sidechain_ledger::ChainStore;
use sidechain_types::{Block, ContractRecord, Params, Schedule, WitnessRecord};
use tracing::{info, warn};

/// Everything persisted to `<dataDir>/<databaseFile>`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DbState {
    chain: Vec<Block>,
    contracts: HashMap<String, ContractRecord>,
    tables: HashMap<String, Vec<Value>>,
    #[serde(default)]
    next_doc_id: u64,
    witnesses: HashMap<String, WitnessRecord>,
    schedules: Vec<Schedule>,
    params: Params,
}

/// The embedded store: chain collection, contract registry, per-contract
/// tables, and the witness directory — all the collections living in one
/// database file.
pub struct EmbeddedDatabase {
    path: PathBuf,
    state: RwLock<DbState>,
}

impl EmbeddedDatabase {
    /// Load `<data_dir>/<database_file>` if it exists, else start empty.
    pub fn open(data_dir: &str, database_file: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = Path::new(data_dir).join(database_file);
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            DbState::default()
        };
        Ok(Self { path, state: RwLock::new(state) })
    }

    /// Flush the current in-memory state to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let state = self.state.read().expect("lock not poisoned");
        let raw = serde_json::to_string_pretty(&*state)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Seed the witness directory and initial schedule/params for a single
    /// witness identity at process startup. Idempotent: existing witness
    /// rows are untouched.
    pub fn seed_witness(&self, account: &str, signing_key_hex: &str) {
        let mut state = self.state.write().expect("lock not poisoned");
        state.witnesses.entry(account.to_string()).or_insert_with(|| WitnessRecord {
            account: account.to_string(),
            signing_key: signing_key_hex.to_string(),
            ip: None,
            enabled: true,
        });
        if state.params.current_witness.is_empty() {
            state.params.current_witness = account.to_string();
            state.params.round = 1;
        }
        if !state.schedules.iter().any(|s| s.witness == account && s.round == state.params.round) {
            let round = state.params.round;
            state.schedules.push(Schedule { round, witness: account.to_string() });
        }
    }

    /// Register a peer witness (test/ops helper — the real directory is
    /// the on-chain `witnesses` contract, out of core scope per §1).
    pub fn register_witness(&self, record: WitnessRecord) {
        self.state.write().expect("lock not poisoned").witnesses.insert(record.account.clone(), record);
    }

    /// Advance `params` to a fresh round spanning every block produced
    /// since the last one, scheduling every enabled witness to verify it.
    pub fn advance_round(&self, latest_block: u64, next_current_witness: &str) {
        let mut state = self.state.write().expect("lock not poisoned");
        state.params.last_verified_block_number = state.params.last_block_round;
        state.params.last_block_round = latest_block;
        state.params.round += 1;
        state.params.current_witness = next_current_witness.to_string();
        let round = state.params.round;
        let scheduled: Vec<String> = state.witnesses.values().filter(|w| w.enabled).map(|w| w.account.clone()).collect();
        for witness in scheduled {
            state.schedules.push(Schedule { round, witness });
        }
    }

    pub fn contract(&self, name: &str) -> Option<ContractRecord> {
        self.state.read().expect("lock not poisoned").contracts.get(name).cloned()
    }

    pub fn find_in_table(&self, qualified_name: &str, query: &Value) -> Vec<Value> {
        DocumentStore::find(self, qualified_name, query)
    }

    pub fn schedule(&self, round: u64) -> Vec<Schedule> {
        self.state.read().expect("lock not poisoned").schedules.iter().filter(|s| s.round == round).cloned().collect()
    }

    pub fn params(&self) -> Params {
        self.state.read().expect("lock not poisoned").params.clone()
    }

    pub fn witness(&self, account: &str) -> Option<WitnessRecord> {
        self.state.read().expect("lock not poisoned").witnesses.get(account).cloned()
    }
}

#[async_trait]
impl ChainStore for EmbeddedDatabase {
    async fn put(&self, block: Block) {
        self.state.write().expect("lock not poisoned").chain.push(block);
    }

    async fn get(&self, block_number: u64) -> Option<Block> {
        self.state.read().expect("lock not poisoned").chain.get(block_number as usize).cloned()
    }

    async fn latest(&self) -> Option<Block> {
        self.state.read().expect("lock not poisoned").chain.last().cloned()
    }

    async fn len(&self) -> u64 {
        self.state.read().expect("lock not poisoned").chain.len() as u64
    }

    async fn clear(&self) {
        self.state.write().expect("lock not poisoned").chain.clear();
    }
}

impl DocumentStore for EmbeddedDatabase {
    fn create_table(&self, qualified_name: &str) {
        self.state.write().expect("lock not poisoned").tables.entry(qualified_name.to_string()).or_default();
    }

    fn table_exists(&self, qualified_name: &str) -> bool {
        self.state.read().expect("lock not poisoned").tables.contains_key(qualified_name)
    }

    fn insert(&self, qualified_name: &str, mut doc: Document) -> Document {
        let mut state = self.state.write().expect("lock not poisoned");
        let id = state.next_doc_id;
        state.next_doc_id += 1;
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("_id".to_string(), serde_json::json!(id));
        }
        state.tables.entry(qualified_name.to_string()).or_default().push(doc.clone());
        doc
    }

    fn find(&self, qualified_name: &str, query: &Document) -> Vec<Document> {
        let query_obj = query.as_object();
        self.state
            .read()
            .expect("lock not poisoned")
            .tables
            .get(qualified_name)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| match (query_obj, doc.as_object()) {
                        (None, _) => true,
                        (Some(q), Some(d)) => q.iter().all(|(k, v)| d.get(k) == Some(v)),
                        (Some(q), None) => q.is_empty(),
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn reset(&self) {
        let mut state = self.state.write().expect("lock not poisoned");
        state.tables.clear();
        state.next_doc_id = 0;
    }
}

impl ContractRegistry for EmbeddedDatabase {
    fn get(&self, name: &str) -> Option<ContractRecord> {
        self.state.read().expect("lock not poisoned").contracts.get(name).cloned()
    }

    fn put_if_absent(&self, record: ContractRecord) -> bool {
        let mut state = self.state.write().expect("lock not poisoned");
        if state.contracts.contains_key(&record.name) {
            return false;
        }
        state.contracts.insert(record.name.clone(), record);
        true
    }

    fn add_table(&self, contract: &str, qualified_name: &str) {
        let mut state = self.state.write().expect("lock not poisoned");
        if let Some(record) = state.contracts.get_mut(contract) {
            record.tables.insert(qualified_name.to_string());
        }
    }

    fn reset(&self) {
        self.state.write().expect("lock not poisoned").contracts.clear();
    }
}

/// Spawn the periodic autosave task (§6 `autosaveInterval`). Returns
/// immediately; the task runs until the process exits.
pub fn spawn_autosave(db: std::sync::Arc<EmbeddedDatabase>, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match db.save() {
                Ok(()) => info!("autosave completed"),
                Err(e) => warn!(error = %e, "autosave failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_store_has_no_witness() {
        let dir = tempdir().unwrap();
        let db = EmbeddedDatabase::open(dir.path().to_str().unwrap(), "db.json").unwrap();
        assert!(db.witness("alice").is_none());
    }

    #[test]
    fn seed_witness_schedules_round_one() {
        let dir = tempdir().unwrap();
        let db = EmbeddedDatabase::open(dir.path().to_str().unwrap(), "db.json").unwrap();
        db.seed_witness("alice", &"aa".repeat(33));
        assert_eq!(db.params().round, 1);
        assert_eq!(db.params().current_witness, "alice");
        assert_eq!(db.schedule(1).len(), 1);
    }

    #[test]
    fn save_then_reopen_round_trips_contracts() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        {
            let db = EmbeddedDatabase::open(path, "db.json").unwrap();
            ContractRegistry::put_if_absent(
                &db,
                ContractRecord { name: "tok".into(), owner: "alice".into(), code: "wrapped".into(), tables: BTreeSet::new() },
            );
            db.save().unwrap();
        }
        let reopened = EmbeddedDatabase::open(path, "db.json").unwrap();
        assert!(reopened.contract("tok").is_some());
    }
}
