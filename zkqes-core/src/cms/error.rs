//! Error types for CMS/CAdES extraction

use std::fmt;

/// Result type for CMS extraction operations
pub type CmsResult<T> = Result<T, CmsError>;

/// Errors that can occur while extracting signer material from a CMS blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmsError {
    /// The ContentInfo does not wrap SignedData
    NotSignedData {
        /// The content-type OID that was found instead
        oid: String,
    },

    /// DER structure could not be decoded or violates RFC 5652
    MalformedAsn1 {
        /// Description of the decoding failure
        details: String,
    },

    /// Digest, signature or key algorithm outside the supported set
    UnsupportedAlgorithm {
        /// The offending algorithm or OID
        algorithm: String,
    },

    /// The messageDigest signed attribute disagrees with the byte-range digest
    DigestMismatch {
        /// The byte-range digest of the document, hex
        expected: String,
        /// The messageDigest attribute value, hex
        actual: String,
    },

    /// SignerInfo carries no signed attributes (required for CAdES)
    MissingSignedAttributes,

    /// SignedData carries no X.509 certificate
    NoCertificate,
}

impl fmt::Display for CmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSignedData { oid } => {
                write!(f, "Expected SignedData, got content type OID: {}", oid)
            }
            Self::MalformedAsn1 { details } => {
                write!(f, "Malformed ASN.1: {}", details)
            }
            Self::UnsupportedAlgorithm { algorithm } => {
                write!(f, "Unsupported algorithm: {}", algorithm)
            }
            Self::DigestMismatch { expected, actual } => {
                write!(
                    f,
                    "messageDigest attribute {} does not match byte-range digest {}",
                    actual, expected
                )
            }
            Self::MissingSignedAttributes => {
                write!(f, "SignerInfo has no signed attributes")
            }
            Self::NoCertificate => {
                write!(f, "SignedData contains no X.509 certificate")
            }
        }
    }
}

impl std::error::Error for CmsError {}
