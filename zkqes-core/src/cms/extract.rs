//! PKCS#7/CAdES SignedData extraction.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use tracing::debug;

use super::attrs::{check_message_digest, signed_attrs_digest};
use super::error::{CmsError, CmsResult};
use super::keys::{EcdsaSignatureValue, SignerPublicKey};
use crate::digest::Digest;

/// id-signedData
const SIGNED_DATA_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
/// sha256
const SHA256_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
/// ecdsa-with-SHA256
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
/// id-ecPublicKey, used by some producers as the signature algorithm
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// RSA signature algorithm family (rsaEncryption, sha256/384/512WithRSA)
const RSA_SIGNATURE_OIDS: [ObjectIdentifier; 4] = [
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13"),
];

/// Everything the rest of the pipeline needs from one CMS blob.
#[derive(Debug, Clone)]
pub struct SignerBundle {
    /// DER encoding of the signer certificate
    pub certificate_der: Vec<u8>,
    /// SHA-256 of the certificate DER
    pub fingerprint: Digest,
    /// End-entity P-256 public key
    pub public_key: SignerPublicKey,
    /// Normalized 64-byte ECDSA signature value
    pub signature: EcdsaSignatureValue,
    /// Signed attributes re-encoded as SET-OF (tag 0x31)
    pub signed_attrs_der: Vec<u8>,
    /// SHA-256 of `signed_attrs_der`: the message the signature covers
    pub signed_attrs_digest: Digest,
}

impl SignerBundle {
    /// Standard PEM wrapping of the signer certificate.
    pub fn certificate_pem(&self) -> String {
        let b64 = BASE64.encode(&self.certificate_der);
        let mut pem = String::with_capacity(b64.len() + 64);
        pem.push_str("-----BEGIN CERTIFICATE-----\n");
        for chunk in b64.as_bytes().chunks(64) {
            pem.push_str(std::str::from_utf8(chunk).expect("base64 is ASCII"));
            pem.push('\n');
        }
        pem.push_str("-----END CERTIFICATE-----\n");
        pem
    }
}

/// Parses a CMS blob and extracts the signer material, enforcing the
/// `messageDigest` consistency check against `doc_digest`.
///
/// # Errors
///
/// * [`CmsError::NotSignedData`] when the ContentInfo wraps something else
/// * [`CmsError::MalformedAsn1`] for any DER-level violation
/// * [`CmsError::UnsupportedAlgorithm`] for non-SHA-256 digests and
///   non-P-256 signers (RSA is recognized and routed away explicitly)
/// * [`CmsError::DigestMismatch`] when the `messageDigest` attribute does
///   not equal the byte-range digest
pub fn extract_signer(cms_der: &[u8], doc_digest: &Digest) -> CmsResult<SignerBundle> {
    let content_info = ContentInfo::from_der(cms_der).map_err(|e| CmsError::MalformedAsn1 {
        details: format!("failed to parse ContentInfo: {}", e),
    })?;

    if content_info.content_type != SIGNED_DATA_OID {
        return Err(CmsError::NotSignedData {
            oid: content_info.content_type.to_string(),
        });
    }

    let signed_data_bytes =
        content_info
            .content
            .to_der()
            .map_err(|e| CmsError::MalformedAsn1 {
                details: format!("failed to re-encode SignedData content: {}", e),
            })?;
    let signed_data =
        SignedData::from_der(&signed_data_bytes).map_err(|e| CmsError::MalformedAsn1 {
            details: format!("failed to parse SignedData: {}", e),
        })?;

    let signer_info = signed_data
        .signer_infos
        .0
        .iter()
        .next()
        .ok_or_else(|| CmsError::MalformedAsn1 {
            details: "no SignerInfo in SignedData".to_string(),
        })?;

    if signer_info.digest_alg.oid != SHA256_OID {
        return Err(CmsError::UnsupportedAlgorithm {
            algorithm: format!("digest OID: {}", signer_info.digest_alg.oid),
        });
    }
    check_signature_algorithm(signer_info.signature_algorithm.oid)?;

    let signed_attrs = signer_info
        .signed_attrs
        .as_ref()
        .ok_or(CmsError::MissingSignedAttributes)?;
    check_message_digest(signed_attrs, doc_digest)?;
    let attrs_digest = signed_attrs_digest(signed_attrs)?;
    let signed_attrs_der = super::attrs::reencode_signed_attrs(signed_attrs)?;

    let signature = EcdsaSignatureValue::from_der(signer_info.signature.as_bytes())?;

    let certificate = first_x509_certificate(&signed_data)?;
    let certificate_der = certificate.to_der().map_err(|e| CmsError::MalformedAsn1 {
        details: format!("failed to re-encode certificate: {}", e),
    })?;
    let fingerprint = Digest::sha256(&certificate_der);
    let public_key =
        SignerPublicKey::from_spki(&certificate.tbs_certificate.subject_public_key_info)?;

    debug!(
        fingerprint = %fingerprint,
        "extracted signer from CMS blob"
    );

    Ok(SignerBundle {
        certificate_der,
        fingerprint,
        public_key,
        signature,
        signed_attrs_der,
        signed_attrs_digest: attrs_digest,
    })
}

fn check_signature_algorithm(oid: ObjectIdentifier) -> CmsResult<()> {
    if oid == ECDSA_WITH_SHA256 || oid == ID_EC_PUBLIC_KEY {
        return Ok(());
    }
    if RSA_SIGNATURE_OIDS.contains(&oid) {
        return Err(CmsError::UnsupportedAlgorithm {
            algorithm: format!(
                "RSA signature OID {} (routes to the RSA statement variant)",
                oid
            ),
        });
    }
    Err(CmsError::UnsupportedAlgorithm {
        algorithm: format!("signature OID: {}", oid),
    })
}

/// First X.509 certificate in the set; attribute certificates and other
/// formats are skipped.
fn first_x509_certificate(
    signed_data: &SignedData,
) -> CmsResult<&x509_cert::Certificate> {
    let certificates = signed_data
        .certificates
        .as_ref()
        .ok_or(CmsError::NoCertificate)?;
    for choice in certificates.0.iter() {
        if let CertificateChoices::Certificate(cert) = choice {
            return Ok(cert);
        }
    }
    Err(CmsError::NoCertificate)
}
