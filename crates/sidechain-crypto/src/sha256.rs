//! # SHA-256 Hashing
//!
//! The sidechain's block, transaction and round hashes are all lowercase-hex
//! SHA-256 digests . This module is the single place that
//! produces them so every caller gets the same hex formatting.

use sha2::{Digest, Sha256};

/// Lowercase hex-encoded SHA-256 digest, e.g. a transaction or block hash.
pub type HexDigest = String;

/// Hash a single byte slice and return its lowercase hex digest.
pub fn sha256_hex(data: &[u8]) -> HexDigest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash the concatenation of several byte slices without an intermediate
/// allocation, matching the "lexical concatenation" hashing rule used for
/// transaction and block hashes.
pub fn sha256_hex_concat(parts: &[&[u8]]) -> HexDigest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Hash two already-hex-encoded digests together, as used when building a
/// Merkle level or the incremental round hash chain.
pub fn sha256_hex_pair(left: &str, right: &str) -> HexDigest {
    sha256_hex_concat(&[left.as_bytes(), right.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_vector() {
        // SHA-256("") per FIPS 180-4 test vectors.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn deterministic() {
        assert_eq!(sha256_hex(b"hello"), sha256_hex(b"hello"));
    }

    #[test]
    fn concat_matches_manual_concat() {
        let manual = sha256_hex(b"ab");
        let split = sha256_hex_concat(&[b"a", b"b"]);
        assert_eq!(manual, split);
    }

    #[test]
    fn pair_hashes_hex_bytes_not_decoded_bytes() {
        let a = sha256_hex(b"left");
        let b = sha256_hex(b"right");
        let pair = sha256_hex_pair(&a, &b);
        let expected = sha256_hex_concat(&[a.as_bytes(), b.as_bytes()]);
        assert_eq!(pair, expected);
    }
}
