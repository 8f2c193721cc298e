//! Declarative description of the proven predicate.
//!
//! A statement fixes the shape of the public and private inputs and the
//! conjunction of constraints the proving backend must enforce:
//!
//! 1. `ecdsa_verify_p256((pub_key_x, pub_key_y), doc_hash, signature)`
//! 2. `signer_fpr == SHA-256(cert_der)`, enforced off-circuit; the leaf is
//!    committed in the manifest next to the public key it was extracted with
//! 3. `reconstruct_merkle_root(signer_fpr, index, merkle_path) == tl_root`
//! 4. if `eu_trust_enabled`:
//!    `reconstruct_merkle_root(signer_fpr, eu_index, eu_merkle_path) == tl_root_eu`
//!
//! Two concrete variants coexist and differ only in the Merkle hash and the
//! encoding of leaves and roots. New trust-list hashes are added as new
//! variants, never by mutating an existing one: every verifier of existing
//! manifests depends on the variant staying fixed.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::merkle::TREE_DEPTH;

/// Total width of the canonical public-input serialization:
/// five 32-byte values, one flag byte, one trailing 32-byte root.
pub const PUBLIC_INPUT_LEN: usize = 32 * 5 + 1 + 32;

/// The two supported statement variants.
///
/// `FieldMerkle` is materially cheaper for the proving backend and is the
/// recommended default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementVariant {
    /// SHA-256 Merkle tree; all public inputs carried as byte arrays.
    ByteMerkle,
    /// Poseidon2 Merkle tree over the BN254 scalar field; leaf, roots and
    /// paths carried as field elements.
    FieldMerkle,
}

impl StatementVariant {
    pub fn name(&self) -> &'static str {
        match self {
            StatementVariant::ByteMerkle => "byte-merkle",
            StatementVariant::FieldMerkle => "field-merkle",
        }
    }

    /// Name of the Merkle node hash for this variant.
    pub fn merkle_hash_name(&self) -> &'static str {
        match self {
            StatementVariant::ByteMerkle => "SHA-256",
            StatementVariant::FieldMerkle => "Poseidon2-BN254",
        }
    }
}

impl std::fmt::Display for StatementVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical, serializable description of one statement instance.
///
/// This is what the prover bridge hands to `compile`; its serialization is
/// the cache key for compilation artefacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDescriptor {
    pub variant: StatementVariant,
    pub tree_depth: usize,
    pub signature_curve: String,
    pub merkle_hash: String,
}

impl StatementDescriptor {
    pub fn new(variant: StatementVariant) -> Self {
        StatementDescriptor {
            variant,
            tree_depth: TREE_DEPTH,
            signature_curve: "P-256".to_string(),
            merkle_hash: variant.merkle_hash_name().to_string(),
        }
    }

    /// Stable byte encoding used as compilation-cache key material.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_string(self)?.into_bytes())
    }
}

/// A trust-list root (or leaf) in the representation its variant dictates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootValue {
    Bytes(Digest),
    Field(Fr),
}

impl RootValue {
    /// Wraps a digest in the representation of `variant`, folding into the
    /// field for the Poseidon path.
    pub fn from_digest(variant: StatementVariant, digest: &Digest) -> Self {
        match variant {
            StatementVariant::ByteMerkle => RootValue::Bytes(*digest),
            StatementVariant::FieldMerkle => RootValue::Field(digest.to_field()),
        }
    }

    pub fn variant(&self) -> StatementVariant {
        match self {
            RootValue::Bytes(_) => StatementVariant::ByteMerkle,
            RootValue::Field(_) => StatementVariant::FieldMerkle,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            RootValue::Bytes(d) => d.is_zero(),
            RootValue::Field(f) => f.is_zero(),
        }
    }

    /// Canonical 32-byte big-endian encoding. For field values this is the
    /// canonical (fully reduced) integer, left-padded to 32 bytes.
    pub fn to_bytes32(&self) -> [u8; 32] {
        match self {
            RootValue::Bytes(d) => *d.as_bytes(),
            RootValue::Field(f) => field_to_bytes32(f),
        }
    }

    /// The representation recorded in the manifest: 64 hex chars for the
    /// byte variant, a decimal field string for the field variant.
    pub fn to_manifest_string(&self) -> String {
        match self {
            RootValue::Bytes(d) => d.to_hex(),
            RootValue::Field(f) => field_to_decimal(f),
        }
    }

    /// Parses the manifest representation back into a typed value.
    pub fn parse(variant: StatementVariant, s: &str) -> Result<Self> {
        match variant {
            StatementVariant::ByteMerkle => Ok(RootValue::Bytes(Digest::from_hex(s)?)),
            StatementVariant::FieldMerkle => Ok(RootValue::Field(field_from_decimal(s)?)),
        }
    }
}

/// Canonical 32-byte big-endian encoding of a BN254 scalar.
pub fn field_to_bytes32(f: &Fr) -> [u8; 32] {
    let be = f.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - be.len()..].copy_from_slice(&be);
    out
}

/// Decimal rendering of a BN254 scalar (the canonical integer).
pub fn field_to_decimal(f: &Fr) -> String {
    f.into_bigint().to_string()
}

/// Parses a decimal field string. The value is reduced modulo the field
/// prime, matching the big-endian byte folding rule.
pub fn field_from_decimal(s: &str) -> Result<Fr> {
    if s.is_empty() {
        return Err(Error::ManifestSchema(
            "empty decimal field string".to_string(),
        ));
    }
    let mut acc = Fr::zero();
    let ten = Fr::from(10u64);
    for ch in s.chars() {
        let digit = ch.to_digit(10).ok_or_else(|| {
            Error::ManifestSchema(format!("invalid decimal field string {:?}", s))
        })?;
        acc = acc * ten + Fr::from(digit as u64);
    }
    Ok(acc)
}

/// Reconstructs a field element from its canonical 32-byte encoding.
pub fn field_from_bytes32(bytes: &[u8; 32]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// The public half of the statement's input tuple, in declared order:
///
/// `doc_hash, pub_key_x, pub_key_y, signer_fpr, tl_root, eu_trust_enabled,
/// tl_root_eu`
///
/// The verifier reconstructs this tuple from the manifest and the proof and
/// hands its canonical serialization to the backend; any reordering or
/// re-encoding fails verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicInputs {
    /// The message the ECDSA constraint verifies against. Historically named
    /// `doc_hash`; it carries the signed-attributes digest, not the
    /// byte-range digest recorded under `doc_hash` in the manifest. The
    /// naming clash is preserved deliberately: renaming it is a manifest
    /// version bump.
    pub doc_hash: Digest,
    pub pub_key_x: [u8; 32],
    pub pub_key_y: [u8; 32],
    /// Leaf representation of the signer-certificate fingerprint.
    pub signer_fpr: RootValue,
    pub tl_root: RootValue,
    pub eu_trust_enabled: bool,
    pub tl_root_eu: RootValue,
}

impl PublicInputs {
    pub fn variant(&self) -> StatementVariant {
        self.tl_root.variant()
    }

    /// Canonical serialization, the single encoding shared by the prove and
    /// verify paths.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PUBLIC_INPUT_LEN);
        out.extend_from_slice(self.doc_hash.as_bytes());
        out.extend_from_slice(&self.pub_key_x);
        out.extend_from_slice(&self.pub_key_y);
        out.extend_from_slice(&self.signer_fpr.to_bytes32());
        out.extend_from_slice(&self.tl_root.to_bytes32());
        out.push(u8::from(self.eu_trust_enabled));
        out.extend_from_slice(&self.tl_root_eu.to_bytes32());
        out
    }

    /// Inverse of [`to_canonical_bytes`](Self::to_canonical_bytes).
    pub fn from_canonical_bytes(variant: StatementVariant, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_INPUT_LEN {
            return Err(Error::InvalidWitness(format!(
                "public input block must be {} bytes, got {}",
                PUBLIC_INPUT_LEN,
                bytes.len()
            )));
        }
        let take32 = |offset: usize| -> [u8; 32] {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes[offset..offset + 32]);
            arr
        };
        let root_at = |offset: usize| -> RootValue {
            let arr = take32(offset);
            match variant {
                StatementVariant::ByteMerkle => RootValue::Bytes(Digest::from_bytes(arr)),
                StatementVariant::FieldMerkle => RootValue::Field(field_from_bytes32(&arr)),
            }
        };
        let flag = bytes[160];
        if flag > 1 {
            return Err(Error::InvalidWitness(format!(
                "eu_trust_enabled flag must be 0 or 1, got {}",
                flag
            )));
        }
        Ok(PublicInputs {
            doc_hash: Digest::from_bytes(take32(0)),
            pub_key_x: take32(32),
            pub_key_y: take32(64),
            signer_fpr: root_at(96),
            tl_root: root_at(128),
            eu_trust_enabled: flag == 1,
            tl_root_eu: root_at(161),
        })
    }
}
