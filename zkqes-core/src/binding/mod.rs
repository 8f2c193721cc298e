//! Document-bound hybrid encryption.
//!
//! The payload delivered alongside a proof is encrypted with AES-256-GCM
//! under a key derived from an ephemeral ECDH agreement, and the AEAD's
//! associated data is the document digest. The AAD is not an optional
//! field: decrypting under any other document digest fails authentication,
//! which is the cryptographic plaintext-to-document binding.
//!
//! The ciphertext package is `ciphertext ‖ 16-byte tag`; its SHA-256 is the
//! artifact digest committed in the manifest.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use chrono::{SecondsFormat, Utc};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::digest::Digest;
use crate::error::{Error, Result};

/// HKDF info string for the AEAD key.
const KEY_INFO: &[u8] = b"aes-256-gcm-key";

/// AES-GCM nonce width.
pub const IV_LEN: usize = 12;

/// AES-GCM authentication tag width.
pub const TAG_LEN: usize = 16;

/// A recipient public key on one of the two supported curves.
#[derive(Debug, Clone)]
pub enum RecipientKey {
    P256(p256::PublicKey),
    Secp256k1(k256::PublicKey),
}

impl RecipientKey {
    /// Parses a SEC1-encoded point for the named curve.
    pub fn from_sec1(curve: &str, bytes: &[u8]) -> Result<Self> {
        match curve {
            "P-256" => p256::PublicKey::from_sec1_bytes(bytes)
                .map(RecipientKey::P256)
                .map_err(|e| Error::InvalidWitness(format!("invalid P-256 point: {}", e))),
            "secp256k1" => k256::PublicKey::from_sec1_bytes(bytes)
                .map(RecipientKey::Secp256k1)
                .map_err(|e| Error::InvalidWitness(format!("invalid secp256k1 point: {}", e))),
            other => Err(Error::InvalidWitness(format!(
                "unsupported recipient curve: {}",
                other
            ))),
        }
    }

    pub fn curve(&self) -> &'static str {
        match self {
            RecipientKey::P256(_) => "P-256",
            RecipientKey::Secp256k1(_) => "secp256k1",
        }
    }
}

/// A recipient decryption key.
#[derive(Clone)]
pub enum RecipientSecret {
    P256(p256::SecretKey),
    Secp256k1(k256::SecretKey),
}

impl RecipientSecret {
    pub fn public_key(&self) -> RecipientKey {
        match self {
            RecipientSecret::P256(sk) => RecipientKey::P256(sk.public_key()),
            RecipientSecret::Secp256k1(sk) => RecipientKey::Secp256k1(sk.public_key()),
        }
    }
}

/// Metadata emitted next to the ciphertext package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub algorithm: String,
    pub curve: String,
    pub iv: String,
    pub ephemeral_pub: String,
    /// The AAD, which is the document digest, hex
    pub aad: String,
    pub created: String,
}

/// One encrypted, document-bound payload.
#[derive(Debug, Clone)]
pub struct BoundArtifact {
    /// `ciphertext ‖ tag`
    pub ciphertext_package: Vec<u8>,
    pub iv: [u8; IV_LEN],
    /// SEC1 uncompressed encoding of the ephemeral public key
    pub ephemeral_pub: Vec<u8>,
    /// SHA-256 of the ciphertext package
    pub artifact_hash: Digest,
    pub metadata: ArtifactMetadata,
}

/// Encrypts `plaintext` for `recipient`, bound to `doc_digest`.
pub fn encrypt_artifact(
    plaintext: &[u8],
    recipient: &RecipientKey,
    doc_digest: &Digest,
) -> Result<BoundArtifact> {
    let (shared, ephemeral_pub) = match recipient {
        RecipientKey::P256(pk) => {
            let ephemeral = p256::ecdh::EphemeralSecret::random(&mut OsRng);
            let ephemeral_pub = ephemeral
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec();
            let shared = ephemeral.diffie_hellman(pk);
            let mut raw = Zeroizing::new([0u8; 32]);
            raw.copy_from_slice(shared.raw_secret_bytes().as_slice());
            (raw, ephemeral_pub)
        }
        RecipientKey::Secp256k1(pk) => {
            let ephemeral = k256::ecdh::EphemeralSecret::random(&mut OsRng);
            let ephemeral_pub = ephemeral
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec();
            let shared = ephemeral.diffie_hellman(pk);
            let mut raw = Zeroizing::new([0u8; 32]);
            raw.copy_from_slice(shared.raw_secret_bytes().as_slice());
            (raw, ephemeral_pub)
        }
    };

    let key = derive_key(&shared)?;
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let ciphertext_package = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: plaintext,
                aad: doc_digest.as_bytes(),
            },
        )
        .map_err(|_| Error::AuthFailed("AES-GCM encryption failed".to_string()))?;

    let artifact_hash = Digest::sha256(&ciphertext_package);
    debug!(
        curve = recipient.curve(),
        artifact_hash = %artifact_hash,
        bytes = ciphertext_package.len(),
        "encrypted document-bound artifact"
    );

    let metadata = ArtifactMetadata {
        algorithm: "ECDH+HKDF-SHA256+AES-256-GCM".to_string(),
        curve: recipient.curve().to_string(),
        iv: hex::encode(iv),
        ephemeral_pub: hex::encode(&ephemeral_pub),
        aad: doc_digest.to_hex(),
        created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    Ok(BoundArtifact {
        ciphertext_package,
        iv,
        ephemeral_pub,
        artifact_hash,
        metadata,
    })
}

/// Exact inverse of [`encrypt_artifact`].
///
/// Supplying any AAD other than the digest used at encrypt time fails tag
/// verification with [`Error::AuthFailed`], as does any mutation of the
/// ciphertext package.
pub fn decrypt_artifact(
    ciphertext_package: &[u8],
    iv: &[u8; IV_LEN],
    ephemeral_pub: &[u8],
    recipient: &RecipientSecret,
    doc_digest: &Digest,
) -> Result<Vec<u8>> {
    let shared: Zeroizing<[u8; 32]> = match recipient {
        RecipientSecret::P256(sk) => {
            let eph = p256::PublicKey::from_sec1_bytes(ephemeral_pub)
                .map_err(|e| Error::AuthFailed(format!("invalid ephemeral P-256 point: {}", e)))?;
            let shared = p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), eph.as_affine());
            let mut raw = Zeroizing::new([0u8; 32]);
            raw.copy_from_slice(shared.raw_secret_bytes().as_slice());
            raw
        }
        RecipientSecret::Secp256k1(sk) => {
            let eph = k256::PublicKey::from_sec1_bytes(ephemeral_pub).map_err(|e| {
                Error::AuthFailed(format!("invalid ephemeral secp256k1 point: {}", e))
            })?;
            let shared = k256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), eph.as_affine());
            let mut raw = Zeroizing::new([0u8; 32]);
            raw.copy_from_slice(shared.raw_secret_bytes().as_slice());
            raw
        }
    };

    let key = derive_key(&shared)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    cipher
        .decrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: ciphertext_package,
                aad: doc_digest.as_bytes(),
            },
        )
        .map_err(|_| {
            Error::AuthFailed("AES-GCM tag verification failed (wrong key, AAD, or tampered ciphertext)".to_string())
        })
}

fn derive_key(shared: &Zeroizing<[u8; 32]>) -> Result<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(None, shared.as_ref());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(KEY_INFO, okm.as_mut())
        .map_err(|e| Error::AuthFailed(format!("HKDF expand failed: {}", e)))?;
    Ok(okm)
}
