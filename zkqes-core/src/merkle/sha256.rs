//! Byte-level Merkle tree: `node = SHA-256(left ‖ right)`.

use serde::{Deserialize, Serialize};

use super::{pad_leaves, LEAF_COUNT, TREE_DEPTH};
use crate::digest::Digest;
use crate::error::Result;

/// Inclusion proof for one leaf of the SHA-256 tree.
///
/// `path[i]` is the sibling met when ascending from the leaf: at level `i`,
/// if `(index >> i) & 1 == 0` the current node is the left child and the
/// sibling concatenates on the right, else reversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub fingerprint: Digest,
    pub index: u32,
    pub path: [Digest; TREE_DEPTH],
    pub root: Digest,
}

/// Full binary SHA-256 tree of depth 8.
///
/// Level 0 holds the 256 leaves; level 8 holds the single root.
#[derive(Debug, Clone)]
pub struct Sha256Tree {
    levels: Vec<Vec<Digest>>,
}

impl Sha256Tree {
    /// Builds the tree from an ordered list of at most 256 distinct leaves,
    /// padding with the zero digest.
    pub fn build(leaves: &[Digest]) -> Result<Self> {
        let padded = pad_leaves(leaves, Digest::ZERO)?;
        let mut levels = Vec::with_capacity(TREE_DEPTH + 1);
        levels.push(padded);
        for _ in 0..TREE_DEPTH {
            let below = levels.last().expect("at least the leaf level");
            let mut level = Vec::with_capacity(below.len() / 2);
            for pair in below.chunks_exact(2) {
                level.push(node_hash(&pair[0], &pair[1]));
            }
            levels.push(level);
        }
        Ok(Sha256Tree { levels })
    }

    pub fn root(&self) -> Digest {
        self.levels[TREE_DEPTH][0]
    }

    pub fn leaves(&self) -> &[Digest] {
        &self.levels[0]
    }

    /// Emits the inclusion proof for the leaf at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 256`; callers index into a fixed-capacity tree.
    pub fn path(&self, index: usize) -> InclusionProof {
        assert!(index < LEAF_COUNT, "leaf index {} out of range", index);
        let mut siblings = [Digest::ZERO; TREE_DEPTH];
        let mut idx = index;
        for (level, sibling) in siblings.iter_mut().enumerate() {
            *sibling = self.levels[level][idx ^ 1];
            idx >>= 1;
        }
        InclusionProof {
            fingerprint: self.levels[0][index],
            index: index as u32,
            path: siblings,
            root: self.root(),
        }
    }

    /// Inclusion proofs for every occupied (input) leaf, in leaf order.
    pub fn paths(&self, occupied: usize) -> Vec<InclusionProof> {
        (0..occupied.min(LEAF_COUNT)).map(|i| self.path(i)).collect()
    }

    /// Position of `leaf` in the tree, if present.
    pub fn index_of(&self, leaf: &Digest) -> Option<usize> {
        self.levels[0].iter().position(|l| l == leaf)
    }
}

fn node_hash(left: &Digest, right: &Digest) -> Digest {
    Digest::sha256_concat(&[left.as_bytes(), right.as_bytes()])
}

/// Recomputes the root from a leaf, its index, and its sibling path.
pub fn reconstruct_root(leaf: &Digest, index: u32, path: &[Digest; TREE_DEPTH]) -> Digest {
    let mut node = *leaf;
    let mut idx = index;
    for sibling in path {
        node = if idx & 1 == 0 {
            node_hash(&node, sibling)
        } else {
            node_hash(sibling, &node)
        };
        idx >>= 1;
    }
    node
}

/// Checks an inclusion proof against an expected root.
pub fn verify(leaf: &Digest, index: u32, path: &[Digest; TREE_DEPTH], root: &Digest) -> bool {
    reconstruct_root(leaf, index, path).ct_eq(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample_leaves(n: usize) -> Vec<Digest> {
        (0..n)
            .map(|i| Digest::sha256(&(i as u64).to_be_bytes()))
            .collect()
    }

    #[test]
    fn test_empty_tree_has_well_defined_root() {
        let tree = Sha256Tree::build(&[]).unwrap();
        // All-zero leaves collapse deterministically level by level.
        let mut node = Digest::ZERO;
        for _ in 0..TREE_DEPTH {
            node = Digest::sha256_concat(&[node.as_bytes(), node.as_bytes()]);
        }
        assert_eq!(tree.root(), node);
    }

    #[test]
    fn test_single_leaf_tree_verifies() {
        let leaves = sample_leaves(1);
        let tree = Sha256Tree::build(&leaves).unwrap();
        let proof = tree.path(0);
        assert_eq!(proof.fingerprint, leaves[0]);
        assert_eq!(proof.index, 0);
        assert!(verify(&proof.fingerprint, proof.index, &proof.path, &tree.root()));
    }

    #[test]
    fn test_every_leaf_reconstructs_root() {
        let leaves = sample_leaves(7);
        let tree = Sha256Tree::build(&leaves).unwrap();
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.path(i);
            assert_eq!(
                reconstruct_root(leaf, proof.index, &proof.path),
                tree.root(),
                "leaf {} failed to reconstruct",
                i
            );
        }
    }

    #[test]
    fn test_padded_leaf_also_reconstructs() {
        let tree = Sha256Tree::build(&sample_leaves(3)).unwrap();
        let proof = tree.path(200);
        assert!(proof.fingerprint.is_zero());
        assert!(verify(&proof.fingerprint, proof.index, &proof.path, &tree.root()));
    }

    #[test]
    fn test_wrong_index_fails() {
        let leaves = sample_leaves(4);
        let tree = Sha256Tree::build(&leaves).unwrap();
        let proof = tree.path(2);
        assert!(!verify(&proof.fingerprint, 3, &proof.path, &tree.root()));
    }

    #[test]
    fn test_foreign_leaf_fails() {
        let leaves = sample_leaves(4);
        let tree = Sha256Tree::build(&leaves).unwrap();
        let proof = tree.path(1);
        let foreign = Digest::sha256(b"not a member");
        assert!(!verify(&foreign, proof.index, &proof.path, &tree.root()));
    }

    #[test]
    fn test_tampered_sibling_fails() {
        let leaves = sample_leaves(4);
        let tree = Sha256Tree::build(&leaves).unwrap();
        let mut proof = tree.path(0);
        proof.path[3] = Digest::sha256(b"tampered");
        assert!(!verify(&proof.fingerprint, proof.index, &proof.path, &tree.root()));
    }

    #[test]
    fn test_order_sensitivity() {
        let a = sample_leaves(3);
        let mut b = a.clone();
        b.swap(0, 1);
        let root_a = Sha256Tree::build(&a).unwrap().root();
        let root_b = Sha256Tree::build(&b).unwrap().root();
        assert_ne!(root_a, root_b);
    }

    #[test]
    fn test_full_capacity_tree() {
        let leaves = sample_leaves(LEAF_COUNT);
        let tree = Sha256Tree::build(&leaves).unwrap();
        let proof = tree.path(LEAF_COUNT - 1);
        assert!(verify(&proof.fingerprint, proof.index, &proof.path, &tree.root()));
    }

    #[test]
    fn test_duplicate_leaf_rejected() {
        let d = Digest::sha256(b"dup");
        let err = Sha256Tree::build(&[d, d]).unwrap_err();
        assert!(matches!(err, Error::DuplicateLeaf(_)));
    }

    #[test]
    fn test_index_of() {
        let leaves = sample_leaves(5);
        let tree = Sha256Tree::build(&leaves).unwrap();
        assert_eq!(tree.index_of(&leaves[3]), Some(3));
        assert_eq!(tree.index_of(&Digest::sha256(b"absent")), None);
        // Zero digest is a padded leaf, found at the first unoccupied slot.
        assert_eq!(tree.index_of(&Digest::ZERO), Some(5));
    }

    #[test]
    fn test_inclusion_proof_serde_shape() {
        let tree = Sha256Tree::build(&sample_leaves(2)).unwrap();
        let proof = tree.path(0);
        let json = serde_json::to_value(&proof).unwrap();
        assert!(json["fingerprint"].is_string());
        assert_eq!(json["path"].as_array().unwrap().len(), TREE_DEPTH);
        let back: InclusionProof = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }
}
