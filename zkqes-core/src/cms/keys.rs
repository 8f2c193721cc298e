//! End-entity key and signature value extraction.

use const_oid::ObjectIdentifier;
use der::Encode;
use spki::SubjectPublicKeyInfoOwned;

use super::error::{CmsError, CmsResult};

/// id-ecPublicKey
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// secp256r1 (NIST P-256)
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
/// rsaEncryption
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// The signer's ECDSA P-256 public key as affine coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignerPublicKey {
    /// 32-byte big-endian affine x coordinate
    pub x: [u8; 32],
    /// 32-byte big-endian affine y coordinate
    pub y: [u8; 32],
}

impl SignerPublicKey {
    pub fn curve(&self) -> &'static str {
        "P-256"
    }

    pub fn x_hex(&self) -> String {
        hex::encode(self.x)
    }

    pub fn y_hex(&self) -> String {
        hex::encode(self.y)
    }

    /// Extracts the coordinates from a SubjectPublicKeyInfo.
    ///
    /// Only uncompressed P-256 points are accepted. RSA keys are recognized
    /// and rejected with a routing hint: they belong to the RSA statement
    /// variant, which this pipeline does not implement.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> CmsResult<Self> {
        let alg_oid = spki.algorithm.oid;
        if alg_oid == RSA_ENCRYPTION {
            return Err(CmsError::UnsupportedAlgorithm {
                algorithm: "rsaEncryption (RSA signers route to the RSA statement variant)"
                    .to_string(),
            });
        }
        if alg_oid != ID_EC_PUBLIC_KEY {
            return Err(CmsError::UnsupportedAlgorithm {
                algorithm: format!("key algorithm OID: {}", alg_oid),
            });
        }

        let curve_oid = named_curve(spki)?;
        if curve_oid != SECP256R1 {
            return Err(CmsError::UnsupportedAlgorithm {
                algorithm: format!("EC named curve OID: {}", curve_oid),
            });
        }

        let point = spki.subject_public_key.raw_bytes();
        if point.len() != 65 || point[0] != 0x04 {
            return Err(CmsError::MalformedAsn1 {
                details: format!(
                    "expected 65-byte uncompressed EC point, got {} bytes",
                    point.len()
                ),
            });
        }
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&point[1..33]);
        y.copy_from_slice(&point[33..65]);
        Ok(SignerPublicKey { x, y })
    }
}

fn named_curve(spki: &SubjectPublicKeyInfoOwned) -> CmsResult<ObjectIdentifier> {
    let params = spki
        .algorithm
        .parameters
        .as_ref()
        .ok_or_else(|| CmsError::MalformedAsn1 {
            details: "EC key without curve parameters".to_string(),
        })?;
    let der = params.to_der().map_err(|e| CmsError::MalformedAsn1 {
        details: format!("failed to re-encode curve parameters: {}", e),
    })?;
    use der::Decode;
    ObjectIdentifier::from_der(&der).map_err(|e| CmsError::MalformedAsn1 {
        details: format!("curve parameters are not a named-curve OID: {}", e),
    })
}

/// A normalized ECDSA signature value: `r ‖ s`, 64 bytes, each half
/// big-endian with the ASN.1 sign byte stripped and leading zeros preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSignatureValue {
    bytes: [u8; 64],
}

impl EcdsaSignatureValue {
    /// Parses `SEQUENCE { r INTEGER, s INTEGER }` and normalizes both
    /// integers to 32 bytes.
    pub fn from_der(der_bytes: &[u8]) -> CmsResult<Self> {
        let sig = ecdsa::Signature::<p256::NistP256>::from_der(der_bytes).map_err(|e| {
            CmsError::MalformedAsn1 {
                details: format!("invalid ECDSA signature encoding: {}", e),
            }
        })?;
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(sig.to_bytes().as_slice());
        Ok(EcdsaSignatureValue { bytes })
    }

    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        EcdsaSignatureValue { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    pub fn r(&self) -> &[u8] {
        &self.bytes[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.bytes[32..]
    }

    pub fn r_hex(&self) -> String {
        hex::encode(self.r())
    }

    pub fn s_hex(&self) -> String {
        hex::encode(self.s())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}
