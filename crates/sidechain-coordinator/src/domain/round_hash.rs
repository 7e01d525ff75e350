//! Round hash computation : `H_0 = ""`, `H_i =
//! SHA256(H_{i-1} || B_i.hash)` over a contiguous block range in ascending
//! order. Any two correct witnesses computing this over the same range get
//! the same final `H_n`.

use sidechain_types::Hash64;

/// Fold the round-hash chain over `block_hashes`, already in ascending
/// block-number order. Returns `""` for an empty range.
pub fn compute_round_hash(block_hashes: &[Hash64]) -> Hash64 {
    block_hashes
        .iter()
        .fold(String::new(), |acc, block_hash| sidechain_crypto::sha256_hex_pair(&acc, block_hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_range_is_empty_string() {
        assert_eq!(compute_round_hash(&[]), "");
    }

    #[test]
    fn single_block_hashes_against_the_empty_seed() {
        let h = "a".repeat(64);
        let expected = sidechain_crypto::sha256_hex_pair("", &h);
        assert_eq!(compute_round_hash(&[h]), expected);
    }

    #[test]
    fn is_order_sensitive() {
        let a = "a".repeat(64);
        let b = "b".repeat(64);
        assert_ne!(
            compute_round_hash(&[a.clone(), b.clone()]),
            compute_round_hash(&[b, a])
        );
    }

    #[test]
    fn two_independent_computations_over_the_same_range_agree() {
        let hashes = vec!["1".repeat(64), "2".repeat(64), "3".repeat(64)];
        assert_eq!(compute_round_hash(&hashes), compute_round_hash(&hashes.clone()));
    }
}
