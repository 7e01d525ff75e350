//! Peer wire protocol and anchor envelope shapes : the JSON
//! frames exchanged over the witness P2P transport and the custom-JSON
//! envelope posted to the anchor chain. Transport framing itself (WebSocket
//! upgrade, TCP framing) is out of scope; only the message shapes are fixed.

use serde::{Deserialize, Serialize};
use sidechain_types::CoordinatorError;

/// `handshake` request/ack: `{authToken(32), signature:hex(130), account}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeMessage {
    pub auth_token: String,
    pub signature: String,
    pub account: String,
}

/// The JSON object a handshake signature is computed over: `{authToken}`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthChallenge<'a> {
    #[serde(rename = "authToken")]
    pub auth_token: &'a str,
}

/// `proposeRound` request: `{round, roundHash:hex(64), signature:hex(130)}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeRoundRequest {
    pub round: u64,
    pub round_hash: String,
    pub signature: String,
}

/// `proposeRound` ack: either a verifying reply or a rejection reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProposeRoundAck {
    Ok {
        round: u64,
        round_hash: String,
        signature: String,
    },
    Err {
        error: String,
    },
}

/// The quorum-signed payload submitted to the `witnesses` contract once a
/// round reaches quorum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeRoundPayload {
    pub round: u64,
    pub round_hash: String,
    pub signatures: Vec<(String, String)>,
}

/// Anchor custom-JSON envelope: `{required_auths, required_posting_auths,
/// id:"ssc-<chainId>", json:<stringified>{contractName, contractAction,
/// contractPayload}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorCustomJson {
    pub required_auths: Vec<String>,
    pub required_posting_auths: Vec<String>,
    pub id: String,
    pub json: String,
}

#[derive(Debug, Clone, Serialize)]
struct ContractJson {
    #[serde(rename = "contractName")]
    contract_name: String,
    #[serde(rename = "contractAction")]
    contract_action: String,
    #[serde(rename = "contractPayload")]
    contract_payload: ProposeRoundPayload,
}

impl AnchorCustomJson {
    /// Build the `proposeRound` custom JSON envelope for `chain_id`,
    /// signed by `account`.
    pub fn propose_round(chain_id: &str, account: &str, payload: ProposeRoundPayload) -> Self {
        let contract_json = ContractJson {
            contract_name: "witnesses".to_string(),
            contract_action: "proposeRound".to_string(),
            contract_payload: payload,
        };
        Self {
            required_auths: vec![account.to_string()],
            required_posting_auths: Vec::new(),
            id: format!("ssc-{chain_id}"),
            json: serde_json::to_string(&contract_json).unwrap_or_default(),
        }
    }
}

/// Reject malformed wire fields before they reach domain logic: a round
/// hash must be 64 lowercase hex chars, a signature 130.
pub fn validate_round_hash(value: &str) -> Result<(), CoordinatorError> {
    if value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(CoordinatorError::Malformed("roundHash"))
    }
}

/// See [`validate_round_hash`]; signatures are 130 hex chars.
pub fn validate_signature(value: &str) -> Result<(), CoordinatorError> {
    if value.len() == 130 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(CoordinatorError::Malformed("signature"))
    }
}

/// See [`validate_round_hash`]; `authToken` is exactly
/// [`crate::config::AUTH_TOKEN_LEN`] alphanumeric characters.
pub fn validate_auth_token(value: &str) -> Result<(), CoordinatorError> {
    if value.len() == crate::config::AUTH_TOKEN_LEN && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(CoordinatorError::Malformed("authToken"))
    }
}

/// Account names are 3..16 characters on the wire.
pub fn validate_account(value: &str) -> Result<(), CoordinatorError> {
    if (3..=16).contains(&value.len()) {
        Ok(())
    } else {
        Err(CoordinatorError::Malformed("account"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_hash_must_be_64_hex_chars() {
        assert!(validate_round_hash(&"a".repeat(64)).is_ok());
        assert!(validate_round_hash(&"a".repeat(63)).is_err());
        assert!(validate_round_hash(&"z".repeat(64)).is_err());
    }

    #[test]
    fn signature_must_be_130_hex_chars() {
        assert!(validate_signature(&"0".repeat(130)).is_ok());
        assert!(validate_signature(&"0".repeat(129)).is_err());
    }

    #[test]
    fn anchor_envelope_ids_by_chain() {
        let payload = ProposeRoundPayload {
            round: 1,
            round_hash: "a".repeat(64),
            signatures: vec![("alice".to_string(), "b".repeat(130))],
        };
        let envelope = AnchorCustomJson::propose_round("ssc-test", "alice", payload);
        assert_eq!(envelope.id, "ssc-ssc-test");
        assert!(envelope.json.contains("\"contractName\":\"witnesses\""));
    }
}
