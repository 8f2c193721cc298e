//! CAdES/PKCS#7 parsing and signer extraction.
//!
//! Takes the DER blob recovered from the PDF's `/Contents` placeholder and
//! yields everything the witness needs: the signer certificate and its
//! fingerprint, the end-entity P-256 public key, the normalized 64-byte
//! ECDSA signature value, and the digest of the re-encoded signed
//! attributes. The `messageDigest` consistency check against the byte-range
//! digest happens here and is fatal on disagreement.

mod attrs;
mod error;
mod extract;
mod keys;

pub use attrs::{check_message_digest, message_digest_attr, signed_attrs_digest};
pub use error::{CmsError, CmsResult};
pub use extract::{extract_signer, SignerBundle};
pub use keys::{EcdsaSignatureValue, SignerPublicKey};
