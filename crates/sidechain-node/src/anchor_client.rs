//! Anchor-chain RPC client: anchor RPC endpoints are tried
//! in round-robin via an endpoint queue. Posts the quorum-signed custom
//! JSON envelope as a broadcast-transaction call against whichever
//! `streamNodes` endpoint answers first, rotating the queue on failure so a
//! dead node doesn't get retried first on the next submission.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sidechain_coordinator::ports::outbound::AnchorClient;
use sidechain_coordinator::wire::AnchorCustomJson;
use sidechain_types::CoordinatorError;
use tracing::warn;

pub struct RpcAnchorClient {
    client: Client,
    endpoints: Mutex<Vec<String>>,
}

impl RpcAnchorClient {
    pub fn new(endpoints: Vec<String>) -> Self {
        let client = Client::builder().timeout(Duration::from_secs(10)).build().expect("reqwest client builds");
        Self { client, endpoints: Mutex::new(endpoints) }
    }

    fn rotate(&self) {
        let mut endpoints = self.endpoints.lock().expect("poisoned");
        if endpoints.len() > 1 {
            endpoints.rotate_left(1);
        }
    }

    fn current(&self) -> Option<String> {
        self.endpoints.lock().expect("poisoned").first().cloned()
    }
}

#[async_trait]
impl AnchorClient for RpcAnchorClient {
    async fn submit(&self, envelope: AnchorCustomJson) -> Result<(), CoordinatorError> {
        let endpoint = self
            .current()
            .ok_or_else(|| CoordinatorError::Transport("no anchor endpoints configured".to_string()))?;

        let result = self
            .client
            .post(format!("{endpoint}/broadcast_transaction"))
            .json(&envelope)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status();
                self.rotate();
                Err(CoordinatorError::Transport(format!("anchor node {endpoint} returned {status}")))
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "anchor submission failed, rotating endpoint");
                self.rotate();
                Err(CoordinatorError::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_moves_the_head_endpoint_to_the_back() {
        let client = RpcAnchorClient::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(client.current().as_deref(), Some("a"));
        client.rotate();
        assert_eq!(client.current().as_deref(), Some("b"));
    }

    #[test]
    fn single_endpoint_is_not_rotated() {
        let client = RpcAnchorClient::new(vec!["only".to_string()]);
        client.rotate();
        assert_eq!(client.current().as_deref(), Some("only"));
    }
}
