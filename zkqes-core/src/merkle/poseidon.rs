//! Field-level Merkle tree: `node = Poseidon2(left, right)` over BN254.
//!
//! Fingerprints enter the tree through the big-endian modular folding of
//! [`Digest::to_field`]; everything above the leaf level is pure field
//! arithmetic. This variant is the recommended default: the proving backend
//! evaluates it natively, roughly three times faster than the byte tree.

use ark_bn254::Fr;
use ark_ff::Zero;
use serde::{Deserialize, Serialize};

use super::poseidon2::compress;
use super::{pad_leaves, LEAF_COUNT, TREE_DEPTH};
use crate::digest::Digest;
use crate::error::Result;
use crate::statement::{field_to_bytes32, field_to_decimal};

/// Inclusion proof for one leaf of the Poseidon2 tree.
///
/// Path ordering matches the byte tree: `siblings[i]` is the sibling at
/// level `i`, and `(index >> i) & 1` selects the concatenation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInclusionProof {
    /// The fingerprint that was folded into the leaf, kept for artefact
    /// emission; the zero digest for padded leaves.
    pub fingerprint: Digest,
    pub leaf: Fr,
    pub index: u32,
    pub siblings: [Fr; TREE_DEPTH],
    pub root: Fr,
}

/// JSON artefact shape for `paths-poseidon/<fpr>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseidonPathArtifact {
    pub fingerprint: Digest,
    pub index: u32,
    /// Canonical 32-byte big-endian sibling encodings, hex.
    pub siblings: Vec<String>,
    /// The same siblings as decimal field strings, the prover-native form.
    pub merkle_path_decimal: Vec<String>,
    pub root_hex: String,
    pub root_decimal: String,
}

impl FieldInclusionProof {
    pub fn to_artifact(&self) -> PoseidonPathArtifact {
        PoseidonPathArtifact {
            fingerprint: self.fingerprint,
            index: self.index,
            siblings: self
                .siblings
                .iter()
                .map(|s| hex::encode(field_to_bytes32(s)))
                .collect(),
            merkle_path_decimal: self.siblings.iter().map(field_to_decimal).collect(),
            root_hex: hex::encode(field_to_bytes32(&self.root)),
            root_decimal: field_to_decimal(&self.root),
        }
    }
}

/// Full binary Poseidon2 tree of depth 8.
#[derive(Debug, Clone)]
pub struct PoseidonTree {
    fingerprints: Vec<Digest>,
    levels: Vec<Vec<Fr>>,
}

impl PoseidonTree {
    /// Builds the tree from an ordered list of at most 256 distinct
    /// fingerprints, folding each into the field and padding with zero.
    ///
    /// Duplicate detection runs on the fingerprints, not the folded
    /// elements; two fingerprints that collide after reduction are accepted
    /// as distinct inputs (the leaf is opaque to the predicate).
    pub fn build(fingerprints: &[Digest]) -> Result<Self> {
        let padded_fprs = pad_leaves(fingerprints, Digest::ZERO)?;
        let leaves: Vec<Fr> = padded_fprs.iter().map(Digest::to_field).collect();
        let mut levels = Vec::with_capacity(TREE_DEPTH + 1);
        levels.push(leaves);
        for _ in 0..TREE_DEPTH {
            let below = levels.last().expect("at least the leaf level");
            let mut level = Vec::with_capacity(below.len() / 2);
            for pair in below.chunks_exact(2) {
                level.push(compress(pair[0], pair[1]));
            }
            levels.push(level);
        }
        Ok(PoseidonTree {
            fingerprints: padded_fprs,
            levels,
        })
    }

    pub fn root(&self) -> Fr {
        self.levels[TREE_DEPTH][0]
    }

    /// Emits the inclusion proof for the leaf at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 256`.
    pub fn path(&self, index: usize) -> FieldInclusionProof {
        assert!(index < LEAF_COUNT, "leaf index {} out of range", index);
        let mut siblings = [Fr::zero(); TREE_DEPTH];
        let mut idx = index;
        for (level, sibling) in siblings.iter_mut().enumerate() {
            *sibling = self.levels[level][idx ^ 1];
            idx >>= 1;
        }
        FieldInclusionProof {
            fingerprint: self.fingerprints[index],
            leaf: self.levels[0][index],
            index: index as u32,
            siblings,
            root: self.root(),
        }
    }

    /// Inclusion proofs for the first `occupied` leaves, in leaf order.
    pub fn paths(&self, occupied: usize) -> Vec<FieldInclusionProof> {
        (0..occupied.min(LEAF_COUNT)).map(|i| self.path(i)).collect()
    }

    /// Position of `fingerprint` in the tree, if present.
    pub fn index_of(&self, fingerprint: &Digest) -> Option<usize> {
        self.fingerprints.iter().position(|f| f == fingerprint)
    }
}

/// Recomputes the root from a leaf, its index, and its sibling path.
pub fn reconstruct_root(leaf: Fr, index: u32, path: &[Fr; TREE_DEPTH]) -> Fr {
    let mut node = leaf;
    let mut idx = index;
    for sibling in path {
        node = if idx & 1 == 0 {
            compress(node, *sibling)
        } else {
            compress(*sibling, node)
        };
        idx >>= 1;
    }
    node
}

/// Checks an inclusion proof against an expected root.
pub fn verify(leaf: Fr, index: u32, path: &[Fr; TREE_DEPTH], root: Fr) -> bool {
    reconstruct_root(leaf, index, path) == root
}
