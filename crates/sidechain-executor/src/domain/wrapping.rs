//! # Contract wrapping template
//!
//! The submitted code is never executed as-is. It is spliced
//! into a fixed dispatch preamble so that `createSSC` can never be reached
//! except at deploy time, and so a contract cannot bypass the action
//! dispatch by defining its own top-level side effects that run regardless
//! of `action`. The wrapped source — not the raw user source — is what is
//! persisted in [`sidechain_types::ContractRecord::code`] and what runs on
//! every subsequent `execute`.

/// Splice `user_code` (already base64-decoded) into the fixed dispatch
/// template. The result is the exact source executed by the sandbox, both
/// at deploy time (`action == "createSSC"`) and on every later `execute`.
pub fn wrap_contract_code(user_code: &str) -> String {
    format!(
        "let actions = {{}};\n\
         {user_code}\n\
         if (action && typeof action === 'string' && typeof actions[action] === 'function') {{\n\
         \tif (action !== 'createSSC') {{ actions.createSSC = null; }}\n\
         \tactions[action](payload);\n\
         }}\n"
    )
}

/// Decode a base64-encoded contract submission into its source text.
pub fn decode_submitted_code(base64_code: &str) -> Result<String, DecodeError> {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(base64_code)
        .map_err(|_| DecodeError::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
}

/// Failure modes for [`decode_submitted_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The submitted string was not valid base64.
    #[error("code is not valid base64")]
    InvalidBase64,
    /// The decoded bytes were not valid UTF-8 source text.
    #[error("decoded code is not valid UTF-8")]
    InvalidUtf8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_source_always_declares_actions_first() {
        let wrapped = wrap_contract_code("actions.ping = function() {};");
        assert!(wrapped.starts_with("let actions = {};"));
    }

    #[test]
    fn wrapped_source_disables_createssc_for_non_createssc_actions() {
        let wrapped = wrap_contract_code("actions.createSSC = function() {};");
        assert!(wrapped.contains("if (action !== 'createSSC') { actions.createSSC = null; }"));
    }

    #[test]
    fn decodes_base64_round_trip() {
        // "let x = 1;" base64-encoded with a standard encoder.
        let encoded = "bGV0IHggPSAxOw==";
        let decoded = decode_submitted_code(encoded).unwrap();
        assert_eq!(decoded, "let x = 1;");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert_eq!(decode_submitted_code("not base64!!"), Err(DecodeError::InvalidBase64));
    }
}
