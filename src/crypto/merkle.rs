//! Merkle root reduction for block commitments
//!
//! Reduces an ordered list of transaction digests to a single root via
//! pairwise SHA-256 hashing. Only the current level is kept in memory;
//! the tree is never materialized.

use super::hash::sha256;

/// Root digest of the empty transaction list
pub const EMPTY_ROOT: [u8; 32] = [0u8; 32];

/// Calculate the merkle root of an ordered list of digests
///
/// The last digest of an odd-length level is duplicated before pairing,
/// so `[a, b, c]` reduces to `H(H(a,b) || H(c,c))`. A single digest is
/// its own root; an empty list yields the all-zero sentinel.
pub fn merkle_root(digests: &[[u8; 32]]) -> [u8; 32] {
    if digests.is_empty() {
        return EMPTY_ROOT;
    }

    let mut level: Vec<[u8; 32]> = digests.to_vec();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            // Duplicate the last digest so every pairing step is even
            level.push(level[level.len() - 1]);
        }

        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks(2) {
            let mut data = [0u8; 64];
            data[..32].copy_from_slice(&pair[0]);
            data[32..].copy_from_slice(&pair[1]);
            next.push(sha256(&data));
        }

        level = next;
    }

    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        let mut data = Vec::with_capacity(64);
        data.extend_from_slice(left);
        data.extend_from_slice(right);
        sha256(&data)
    }

    #[test]
    fn test_empty_root_is_zero_sentinel() {
        assert_eq!(merkle_root(&[]), EMPTY_ROOT);
    }

    #[test]
    fn test_single_digest_is_its_own_root() {
        let leaf = sha256(b"tx1");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn test_two_digests() {
        let a = sha256(b"tx1");
        let b = sha256(b"tx2");
        assert_eq!(merkle_root(&[a, b]), pair(&a, &b));
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let a = sha256(b"tx1");
        let b = sha256(b"tx2");
        let c = sha256(b"tx3");

        let expected = pair(&pair(&a, &b), &pair(&c, &c));
        assert_eq!(merkle_root(&[a, b, c]), expected);
    }

    #[test]
    fn test_four_digests() {
        let leaves: Vec<[u8; 32]> = [b"a" as &[u8], b"b", b"c", b"d"]
            .iter()
            .map(|d| sha256(d))
            .collect();

        let expected = pair(
            &pair(&leaves[0], &leaves[1]),
            &pair(&leaves[2], &leaves[3]),
        );
        assert_eq!(merkle_root(&leaves), expected);
    }

    #[test]
    fn test_order_sensitivity() {
        let a = sha256(b"tx1");
        let b = sha256(b"tx2");
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
    }

    #[test]
    fn test_deterministic() {
        let leaves: Vec<[u8; 32]> = (0u8..7).map(|i| sha256(&[i])).collect();
        assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
    }
}
