//! # Sidechain Crypto
//!
//! Hashing and signature primitives shared by the Ledger, Executor and
//! Round Coordinator.
//!
//! | Module | Algorithm | Use |
//! |--------|-----------|-----|
//! | `sha256` | SHA-256 | block/transaction hashes, Merkle root, round hash |
//! | `ecdsa`  | secp256k1 | witness round signatures, handshake challenges |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod sha256;

pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use sha256::{sha256_hex, sha256_hex_concat, sha256_hex_pair, HexDigest};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
