//! Witness assembly for the proven statement.
//!
//! Gathers the outputs of the extraction, trust-list and binding stages
//! into the statement's input tuple, and centralizes every byte-to-field
//! conversion so the rest of the pipeline never touches encodings.
//!
//! Note on `doc_hash`: the statement's public input of that name carries
//! the signed-attributes digest (the value the ECDSA signature actually
//! covers), while the manifest records the byte-range digest under the same
//! name. Both behaviours are deliberate; see the manifest documentation.

use ark_bn254::Fr;
use ark_ff::Zero;

use crate::cms::SignerBundle;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::merkle::{FieldInclusionProof, InclusionProof, LEAF_COUNT, TREE_DEPTH};
use crate::statement::{field_to_bytes32, PublicInputs, RootValue, StatementVariant};

/// A sibling path in the representation its variant dictates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerklePathValue {
    Bytes([Digest; TREE_DEPTH]),
    Field([Fr; TREE_DEPTH]),
}

impl MerklePathValue {
    pub fn zero(variant: StatementVariant) -> Self {
        match variant {
            StatementVariant::ByteMerkle => MerklePathValue::Bytes([Digest::ZERO; TREE_DEPTH]),
            StatementVariant::FieldMerkle => MerklePathValue::Field([Fr::zero(); TREE_DEPTH]),
        }
    }

    pub fn variant(&self) -> StatementVariant {
        match self {
            MerklePathValue::Bytes(_) => StatementVariant::ByteMerkle,
            MerklePathValue::Field(_) => StatementVariant::FieldMerkle,
        }
    }

    /// Canonical 32-byte big-endian encoding of each sibling, in order.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TREE_DEPTH * 32);
        match self {
            MerklePathValue::Bytes(path) => {
                for sibling in path {
                    out.extend_from_slice(sibling.as_bytes());
                }
            }
            MerklePathValue::Field(path) => {
                for sibling in path {
                    out.extend_from_slice(&field_to_bytes32(sibling));
                }
            }
        }
        out
    }
}

/// Inclusion evidence for one trust list: the root the verifier compares
/// against and the private path that reconstructs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustEvidence {
    pub root: RootValue,
    pub path: MerklePathValue,
    pub index: u32,
}

impl TrustEvidence {
    pub fn from_byte_proof(proof: &InclusionProof) -> Self {
        TrustEvidence {
            root: RootValue::Bytes(proof.root),
            path: MerklePathValue::Bytes(proof.path),
            index: proof.index,
        }
    }

    pub fn from_field_proof(proof: &FieldInclusionProof) -> Self {
        TrustEvidence {
            root: RootValue::Field(proof.root),
            path: MerklePathValue::Field(proof.siblings),
            index: proof.index,
        }
    }

    /// Evidence for a signer that is not in the list: a zero path at index
    /// zero under the list's real root. Witness execution then fails at the
    /// named reconstruction constraint.
    pub fn absent(root: RootValue) -> Self {
        TrustEvidence {
            path: MerklePathValue::zero(root.variant()),
            root,
            index: 0,
        }
    }

    pub fn variant(&self) -> StatementVariant {
        self.root.variant()
    }
}

/// The private half of the statement's input tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateInputs {
    pub signature: [u8; 64],
    pub merkle_path: MerklePathValue,
    pub index: u32,
    pub eu_merkle_path: MerklePathValue,
    pub eu_index: u32,
}

impl PrivateInputs {
    /// Canonical encoding appended after the public block in the witness
    /// byte stream: `signature ‖ index ‖ path ‖ eu_index ‖ eu_path`.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + 8 + 2 * TREE_DEPTH * 32);
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.index.to_be_bytes());
        out.extend_from_slice(&self.merkle_path.to_canonical_bytes());
        out.extend_from_slice(&self.eu_index.to_be_bytes());
        out.extend_from_slice(&self.eu_merkle_path.to_canonical_bytes());
        out
    }
}

/// The complete input tuple handed to the prover bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessBundle {
    pub public: PublicInputs,
    pub private: PrivateInputs,
}

impl WitnessBundle {
    pub fn variant(&self) -> StatementVariant {
        self.public.variant()
    }
}

/// Assembles and validates the witness.
///
/// `eu` carries the EU-branch evidence when dual trust is enabled; when
/// `None`, the EU inputs are zero-padded and the flag is false, which the
/// statement's conditional constraint accepts unconditionally.
pub fn assemble_witness(
    variant: StatementVariant,
    signer: &SignerBundle,
    local: &TrustEvidence,
    eu: Option<&TrustEvidence>,
) -> Result<WitnessBundle> {
    if local.variant() != variant {
        return Err(Error::InvalidWitness(format!(
            "local trust evidence is {}, statement is {}",
            local.variant(),
            variant
        )));
    }
    check_index("index", local.index)?;

    let (eu_trust_enabled, tl_root_eu, eu_merkle_path, eu_index) = match eu {
        Some(evidence) => {
            if evidence.variant() != variant {
                return Err(Error::InvalidWitness(format!(
                    "EU trust evidence is {}, statement is {}",
                    evidence.variant(),
                    variant
                )));
            }
            check_index("eu_index", evidence.index)?;
            (true, evidence.root, evidence.path.clone(), evidence.index)
        }
        None => (
            false,
            RootValue::from_digest(variant, &Digest::ZERO),
            MerklePathValue::zero(variant),
            0,
        ),
    };

    let public = PublicInputs {
        doc_hash: signer.signed_attrs_digest,
        pub_key_x: signer.public_key.x,
        pub_key_y: signer.public_key.y,
        signer_fpr: RootValue::from_digest(variant, &signer.fingerprint),
        tl_root: local.root,
        eu_trust_enabled,
        tl_root_eu,
    };
    let private = PrivateInputs {
        signature: *signer.signature.as_bytes(),
        merkle_path: local.path.clone(),
        index: local.index,
        eu_merkle_path,
        eu_index,
    };
    Ok(WitnessBundle { public, private })
}

fn check_index(name: &str, index: u32) -> Result<()> {
    if index as usize >= LEAF_COUNT {
        return Err(Error::InvalidWitness(format!(
            "{} {} outside 0..{}",
            name, index, LEAF_COUNT
        )));
    }
    Ok(())
}
