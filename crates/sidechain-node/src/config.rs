//! Node configuration: loaded from environment variables,
//! covering chain id, autosave interval, VM timeout, ports, stream nodes,
//! data directory, and witness identity. CLI/file parsing is explicitly out
//! of scope; this only fixes the typed shape the rest of the process is
//! built against.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use sidechain_crypto::Secp256k1KeyPair;

/// This witness's participation credentials, present only if both
/// `ACCOUNT` and `ACTIVE_SIGNING_KEY` are set (§6: "absence disables the
/// Coordinator").
#[derive(Debug)]
pub struct WitnessIdentity {
    /// This witness's account name.
    pub account: String,
    /// Raw 32-byte signing key, hex-encoded in `ACTIVE_SIGNING_KEY`.
    pub signing_key_hex: String,
}

impl WitnessIdentity {
    /// Parse the configured signing key into a usable keypair.
    pub fn keypair(&self) -> anyhow::Result<Secp256k1KeyPair> {
        let raw = hex::decode(&self.signing_key_hex)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| anyhow::anyhow!("ACTIVE_SIGNING_KEY must be 32 bytes hex-encoded"))?;
        Ok(Secp256k1KeyPair::from_bytes(bytes)?)
    }
}

/// Typed node configuration, loaded from environment
#[derive(Debug)]
pub struct NodeConfig {
    /// Mixed into the genesis block and the anchor envelope id.
    pub chain_id: String,
    /// Autosave cadence for the embedded store; `None` disables periodic
    /// autosave (explicit saves on every block commit still happen).
    pub autosave_interval: Option<Duration>,
    /// Per-contract-invocation sandbox wall-clock budget.
    pub vm_timeout: Duration,
    /// Port the peer WebSocket server listens on.
    pub p2p_port: u16,
    /// Port the client-facing HTTP RPC surface listens on.
    pub rpc_port: u16,
    /// Anchor-chain RPC endpoints, tried round-robin.
    pub stream_nodes: Vec<String>,
    /// Directory the embedded database file lives under.
    pub data_dir: String,
    /// Filename of the embedded database within `data_dir`.
    pub database_file: String,
    /// Cadence at which the Ledger drains pending transactions into a new
    /// block. Not part of the reference's explicit API surface, but a
    /// single-process reference binary needs *some* driver for
    /// `produce_block` (§4.1); callers that want block-per-submission
    /// semantics can set this very low.
    pub block_interval: Duration,
    /// This witness's identity, if configured.
    pub witness: Option<WitnessIdentity>,
    /// Scheduled peer witnesses' WebSocket endpoints, keyed by account.
    pub peers: HashMap<String, String>,
}

fn env_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl NodeConfig {
    /// Load configuration from the process environment, falling back to
    /// sensible development defaults for everything but the witness
    /// identity (which must be absent unless both variables are set).
    pub fn from_env() -> Self {
        let autosave_ms = env_u64("AUTOSAVE_INTERVAL", 10_000);
        let stream_nodes = env::var("STREAM_NODES")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_else(|_| vec!["https://anchor.example.invalid/rpc".to_string()]);

        let witness = match (env::var("ACCOUNT"), env::var("ACTIVE_SIGNING_KEY")) {
            (Ok(account), Ok(signing_key_hex)) => Some(WitnessIdentity { account, signing_key_hex }),
            _ => None,
        };

        let peers = env::var("PEER_ENDPOINTS")
            .map(|v| {
                v.split(',')
                    .filter_map(|entry| entry.trim().split_once('='))
                    .map(|(account, url)| (account.to_string(), url.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            chain_id: env_var("CHAIN_ID", "ssc-dev"),
            autosave_interval: if autosave_ms == 0 { None } else { Some(Duration::from_millis(autosave_ms)) },
            vm_timeout: Duration::from_millis(env_u64("JS_VM_TIMEOUT", 10_000)),
            p2p_port: env_u16("P2P_PORT", 5100),
            rpc_port: env_u16("RPC_PORT", 5101),
            stream_nodes,
            data_dir: env_var("DATA_DIR", "./data"),
            database_file: env_var("DATABASE_FILE", "database.json"),
            block_interval: Duration::from_millis(env_u64("BLOCK_INTERVAL", 3_000)),
            witness,
            peers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_autosave_interval_disables_periodic_autosave() {
        // SAFETY: sequential test, not touching shared mutable globals beyond env.
        env::set_var("AUTOSAVE_INTERVAL", "0");
        let config = NodeConfig::from_env();
        assert!(config.autosave_interval.is_none());
        env::remove_var("AUTOSAVE_INTERVAL");
    }

    #[test]
    fn missing_witness_env_disables_coordinator_identity() {
        env::remove_var("ACCOUNT");
        env::remove_var("ACTIVE_SIGNING_KEY");
        let config = NodeConfig::from_env();
        assert!(config.witness.is_none());
    }
}
