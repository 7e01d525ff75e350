//! # Merkle commitment over transaction hashes
//!
//! Pairwise left-to-right, duplicate the odd trailing node,
//! recurse until one hash remains. An empty transaction set commits to the
//! empty string, not a hash of nothing.

use sidechain_crypto::sha256_hex_pair;
use sidechain_types::Hash64;

/// Compute the Merkle root over a block's ordered transaction hashes.
pub fn merkle_root(transaction_hashes: &[Hash64]) -> Hash64 {
    if transaction_hashes.is_empty() {
        return String::new();
    }

    let mut level: Vec<Hash64> = transaction_hashes.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level.last().expect("level is non-empty").clone();
            level.push(last);
        }
        level = level
            .chunks_exact(2)
            .map(|pair| sha256_hex_pair(&pair[0], &pair[1]))
            .collect();
    }
    level.into_iter().next().expect("level converges to one hash")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_yields_empty_string() {
        assert_eq!(merkle_root(&[]), "");
    }

    #[test]
    fn single_hash_is_its_own_root() {
        let h = "a".repeat(64);
        assert_eq!(merkle_root(&[h.clone()]), h);
    }

    #[test]
    fn odd_last_node_is_duplicated() {
        let a = "a".repeat(64);
        let b = "b".repeat(64);
        let c = "c".repeat(64);

        let three = merkle_root(&[a.clone(), b.clone(), c.clone()]);
        let four_with_dup = merkle_root(&[a, b, c.clone(), c]);
        assert_eq!(three, four_with_dup);
    }

    #[test]
    fn order_matters() {
        let a = "a".repeat(64);
        let b = "b".repeat(64);
        assert_ne!(merkle_root(&[a.clone(), b.clone()]), merkle_root(&[b, a]));
    }

    proptest::proptest! {
        #[test]
        fn root_is_deterministic(hashes in proptest::collection::vec("[a-f0-9]{64}", 0..20)) {
            let first = merkle_root(&hashes);
            let second = merkle_root(&hashes);
            proptest::prop_assert_eq!(first, second);
        }
    }
}
