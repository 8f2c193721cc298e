//! The canonical 32-byte digest value.
//!
//! All SHA-256 computation in the pipeline flows through this module. A
//! [`Digest`] is the fingerprint of a certificate, the hash of a document's
//! signed byte ranges, the hash of a ciphertext package, and the leaf/node
//! width of the byte-level Merkle tree.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Width of every digest in the system, in bytes.
pub const DIGEST_LEN: usize = 32;

/// A fixed 32-byte value: the canonical hash width.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// The zero digest, used to pad unoccupied Merkle leaves.
    pub const ZERO: Digest = Digest([0u8; DIGEST_LEN]);

    /// Computes SHA-256 over `bytes`.
    pub fn sha256(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Digest(hasher.finalize().into())
    }

    /// Computes SHA-256 over the concatenation of `parts`, without
    /// materializing the concatenation.
    pub fn sha256_concat(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Digest(hasher.finalize().into())
    }

    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }

    /// Builds a digest from a slice that must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidFingerprint(format!("expected {} bytes, got {}", DIGEST_LEN, bytes.len()))
        })?;
        Ok(Digest(arr))
    }

    /// Parses a 64-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(Error::InvalidFingerprint(format!(
                "expected {} hex chars, got {}",
                DIGEST_LEN * 2,
                s.len()
            )));
        }
        let bytes = hex::decode(s)
            .map_err(|e| Error::InvalidFingerprint(format!("invalid hex {:?}: {}", s, e)))?;
        Self::from_slice(&bytes)
    }

    /// Lowercase hex rendering, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; DIGEST_LEN]
    }

    /// Constant-time equality, for comparisons on authentication paths.
    pub fn ct_eq(&self, other: &Digest) -> bool {
        self.0.ct_eq(&other.0).into()
    }

    /// Folds the digest into a BN254 scalar field element by interpreting
    /// the 32 bytes as a big-endian integer modulo the field prime.
    ///
    /// The field prime is smaller than 2^256, so the top two bits are
    /// effectively masked by the reduction. Leaves are opaque to the Merkle
    /// predicate, which tolerates this loss; the reduction happens only
    /// here so every field-variant consumer agrees on it.
    pub fn to_field(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct DigestVisitor;

impl Visitor<'_> for DigestVisitor {
    type Value = Digest;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 64-character hex string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Digest, E> {
        Digest::from_hex(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(DigestVisitor)
    }
}
