//! In-repo reference backend.
//!
//! Executes the statement's constraints natively (real ECDSA P-256
//! verification, real Merkle reconstruction) and emits commitment-style
//! proof and verification-key bytes. It is the semantics oracle for the
//! pipeline and its tests; a production deployment substitutes a real
//! zero-knowledge backend behind the same trait, fed with the same witness
//! layout.
//!
//! Proof layout: `magic(16) ‖ public_inputs(193) ‖ SHA-256(vk ‖ public)`.
//! Witness layout: `public_inputs(193) ‖ private_inputs`.

use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use subtle::ConstantTimeEq;

use super::{CircuitArtifact, ProvingBackend};
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::merkle::{poseidon, sha256, TREE_DEPTH};
use crate::statement::{PublicInputs, RootValue, StatementDescriptor, PUBLIC_INPUT_LEN};
use crate::witness::{MerklePathValue, WitnessBundle};

const PROOF_MAGIC: &[u8; 16] = b"zkqes-native-v1\0";
const VK_MAGIC: &[u8; 16] = b"zkqes-native-vk\0";

/// The reference proving backend.
#[derive(Debug, Default)]
pub struct NativeBackend {
    _private: (),
}

impl NativeBackend {
    pub fn new() -> Self {
        NativeBackend::default()
    }
}

impl ProvingBackend for NativeBackend {
    fn compile(&self, statement: &StatementDescriptor) -> Result<CircuitArtifact> {
        let bytes = statement
            .to_canonical_bytes()
            .map_err(|e| Error::CircuitError(format!("statement encoding failed: {}", e)))?;
        Ok(CircuitArtifact {
            descriptor: statement.clone(),
            bytes,
        })
    }

    fn execute_witness(
        &self,
        artifact: &CircuitArtifact,
        inputs: &WitnessBundle,
    ) -> Result<Vec<u8>> {
        if inputs.variant() != artifact.descriptor.variant {
            return Err(Error::CircuitError(format!(
                "witness variant {} does not match circuit variant {}",
                inputs.variant(),
                artifact.descriptor.variant
            )));
        }

        check_ecdsa(&inputs.public, &inputs.private.signature)?;
        check_inclusion(
            "merkle_inclusion_local",
            &inputs.public.signer_fpr,
            inputs.private.index,
            &inputs.private.merkle_path,
            &inputs.public.tl_root,
        )?;
        if inputs.public.eu_trust_enabled {
            check_inclusion(
                "merkle_inclusion_eu",
                &inputs.public.signer_fpr,
                inputs.private.eu_index,
                &inputs.private.eu_merkle_path,
                &inputs.public.tl_root_eu,
            )?;
        }

        let mut witness_bytes = inputs.public.to_canonical_bytes();
        witness_bytes.extend_from_slice(&inputs.private.to_canonical_bytes());
        Ok(witness_bytes)
    }

    fn prove(&self, artifact: &CircuitArtifact, witness_bytes: &[u8]) -> Result<Vec<u8>> {
        if witness_bytes.len() < PUBLIC_INPUT_LEN {
            return Err(Error::CircuitError(format!(
                "witness block shorter than public input width: {} < {}",
                witness_bytes.len(),
                PUBLIC_INPUT_LEN
            )));
        }
        let public_block = &witness_bytes[..PUBLIC_INPUT_LEN];
        let vk = self.verification_key(artifact)?;

        let mut proof = Vec::with_capacity(16 + PUBLIC_INPUT_LEN + 32);
        proof.extend_from_slice(PROOF_MAGIC);
        proof.extend_from_slice(public_block);
        proof.extend_from_slice(
            Digest::sha256_concat(&[&vk, public_block]).as_bytes(),
        );
        Ok(proof)
    }

    fn verification_key(&self, artifact: &CircuitArtifact) -> Result<Vec<u8>> {
        let mut vk = Vec::with_capacity(16 + 32);
        vk.extend_from_slice(VK_MAGIC);
        vk.extend_from_slice(Digest::sha256(&artifact.bytes).as_bytes());
        Ok(vk)
    }

    fn verify(&self, vk: &[u8], proof: &[u8], public_inputs: &[u8]) -> Result<bool> {
        if vk.len() != 48 || !vk.starts_with(VK_MAGIC) {
            return Err(Error::ProofInvalid(
                "malformed verification key".to_string(),
            ));
        }
        if proof.len() != 16 + PUBLIC_INPUT_LEN + 32 || !proof.starts_with(PROOF_MAGIC) {
            return Err(Error::ProofInvalid("malformed proof encoding".to_string()));
        }
        if public_inputs.len() != PUBLIC_INPUT_LEN {
            return Err(Error::ProofInvalid(format!(
                "public input block must be {} bytes, got {}",
                PUBLIC_INPUT_LEN,
                public_inputs.len()
            )));
        }
        let embedded = &proof[16..16 + PUBLIC_INPUT_LEN];
        let commitment = &proof[16 + PUBLIC_INPUT_LEN..];
        let expected = Digest::sha256_concat(&[vk, public_inputs]);

        let inputs_match: bool = embedded.ct_eq(public_inputs).into();
        let commitment_match: bool = commitment.ct_eq(expected.as_bytes()).into();
        Ok(inputs_match && commitment_match)
    }
}

fn check_ecdsa(public: &PublicInputs, signature: &[u8; 64]) -> Result<()> {
    let point = p256::EncodedPoint::from_affine_coordinates(
        p256::FieldBytes::from_slice(&public.pub_key_x),
        p256::FieldBytes::from_slice(&public.pub_key_y),
        false,
    );
    let verifying_key = VerifyingKey::from_encoded_point(&point).map_err(|e| {
        Error::CircuitError(format!(
            "constraint ecdsa_verify_p256 failed: invalid public key: {}",
            e
        ))
    })?;
    let signature = Signature::from_slice(signature).map_err(|e| {
        Error::CircuitError(format!(
            "constraint ecdsa_verify_p256 failed: invalid signature encoding: {}",
            e
        ))
    })?;
    verifying_key
        .verify_prehash(public.doc_hash.as_bytes(), &signature)
        .map_err(|_| {
            Error::CircuitError(
                "constraint ecdsa_verify_p256 failed: signature does not verify".to_string(),
            )
        })
}

fn check_inclusion(
    constraint: &str,
    leaf: &RootValue,
    index: u32,
    path: &MerklePathValue,
    root: &RootValue,
) -> Result<()> {
    let holds = match (leaf, path, root) {
        (RootValue::Bytes(leaf), MerklePathValue::Bytes(path), RootValue::Bytes(root)) => {
            sha256::verify(leaf, index, path, root)
        }
        (RootValue::Field(leaf), MerklePathValue::Field(path), RootValue::Field(root)) => {
            poseidon::verify(*leaf, index, path, *root)
        }
        _ => {
            return Err(Error::CircuitError(format!(
                "constraint {} failed: mixed byte/field encodings",
                constraint
            )))
        }
    };
    if !holds {
        return Err(Error::CircuitError(format!(
            "constraint {} failed: reconstructed root does not match (leaf index {}, depth {})",
            constraint, index, TREE_DEPTH
        )));
    }
    Ok(())
}
