//! Canonical merkle proofs over SHA-256.
//!
//! Sibling digests carry their side in the top bit of the first byte: set
//! for a right-hand node, cleared for a left-hand node. A parent is
//! `sha256(canonical_left || canonical_right)`. Odd levels duplicate their
//! last node. A single-leaf tree has the leaf as its root.

use crate::hash::{sha256, Digest};

const SIDE_BIT: u8 = 0x80;

/// Clear the side bit (node is the left child).
pub fn make_canonical_left(value: &Digest) -> Digest {
    let mut out = *value;
    out[0] &= !SIDE_BIT;
    out
}

/// Set the side bit (node is the right child).
pub fn make_canonical_right(value: &Digest) -> Digest {
    let mut out = *value;
    out[0] |= SIDE_BIT;
    out
}

pub fn is_canonical_right(value: &Digest) -> bool {
    value[0] & SIDE_BIT != 0
}

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(&make_canonical_left(left));
    data[32..].copy_from_slice(&make_canonical_right(right));
    sha256(&data)
}

/// Recompute the root reached from `leaf` by folding in `path` in order.
pub fn compute_root(leaf: &Digest, path: &[Digest]) -> Digest {
    path.iter().fold(*leaf, |running, sibling| {
        if is_canonical_right(sibling) {
            hash_pair(&running, sibling)
        } else {
            hash_pair(sibling, &running)
        }
    })
}

/// True iff recombining `leaf` with `path` yields `root`.
pub fn verify(leaf: &Digest, path: &[Digest], root: &Digest) -> bool {
    compute_root(leaf, path) == *root
}

/// Binary merkle tree in the canonical form above.
///
/// Contracts only ever verify; building trees is for relays and tests.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    pub fn from_leaves(leaves: Vec<Digest>) -> Self {
        if leaves.is_empty() {
            return Self { levels: vec![] };
        }

        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let current = &levels[levels.len() - 1];
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.last().unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }

        Self { levels }
    }

    /// Root digest, `None` for an empty tree.
    pub fn root(&self) -> Option<Digest> {
        self.levels.last().map(|level| level[0])
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(|l| l.len()).unwrap_or(0)
    }

    /// Canonical sibling path for the leaf at `index`.
    pub fn path(&self, index: usize) -> Option<Vec<Digest>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            if idx % 2 == 0 {
                let sibling = level.get(idx + 1).unwrap_or(&level[idx]);
                path.push(make_canonical_right(sibling));
            } else {
                path.push(make_canonical_left(&level[idx - 1]));
            }
            idx /= 2;
        }
        Some(path)
    }
}
