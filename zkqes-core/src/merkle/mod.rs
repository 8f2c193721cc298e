//! Fixed-depth inclusion trees over certificate fingerprints.
//!
//! Two parallel engines share one shape: a full binary tree of depth 8 with
//! 256 leaves, input leaves in source order, unoccupied leaves padded with
//! the zero element. [`sha256`](crate::merkle::sha256) hashes 32-byte nodes
//! with SHA-256; [`poseidon`](crate::merkle::poseidon) hashes BN254 field
//! elements with the Poseidon2 permutation.
//!
//! The depth constant is load-bearing: changing it breaks every verifier of
//! existing manifests.

pub mod poseidon;
pub mod poseidon2;
pub mod sha256;

pub use poseidon::{FieldInclusionProof, PoseidonPathArtifact, PoseidonTree};
pub use sha256::{InclusionProof, Sha256Tree};

use crate::error::{Error, Result};

/// Number of levels between a leaf and the root.
pub const TREE_DEPTH: usize = 8;

/// Fixed leaf count, `2^TREE_DEPTH`.
pub const LEAF_COUNT: usize = 1 << TREE_DEPTH;

/// Validates an input leaf list and pads it with `zero` to [`LEAF_COUNT`].
///
/// Trees are sets, not multisets: a repeated leaf is rejected. Ordering of
/// the occupied prefix is preserved so regeneration from the same source
/// yields the same tree.
pub(crate) fn pad_leaves<T>(leaves: &[T], zero: T) -> Result<Vec<T>>
where
    T: Clone + PartialEq + std::fmt::Display,
{
    if leaves.len() > LEAF_COUNT {
        return Err(Error::CapacityExceeded {
            count: leaves.len(),
            max: LEAF_COUNT,
        });
    }
    for (i, leaf) in leaves.iter().enumerate() {
        if leaves[..i].contains(leaf) {
            return Err(Error::DuplicateLeaf(leaf.to_string()));
        }
    }
    let mut padded = leaves.to_vec();
    padded.resize(LEAF_COUNT, zero);
    Ok(padded)
}
