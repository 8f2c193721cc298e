//! Signed-attributes handling.
//!
//! On the wire the signed attributes travel as context-tagged
//! `[0] IMPLICIT` (0xA0). The ECDSA signature, however, covers their
//! re-encoding as a universal SET-OF (0x31, definite length). The digest of
//! that re-encoding is the message the signature constraint verifies.

use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use der::{Decode, Encode};

use super::error::{CmsError, CmsResult};
use crate::digest::Digest;

/// id-messageDigest
const MESSAGE_DIGEST_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");

/// Re-serializes the signed attributes as a universal SET-OF and returns
/// the DER bytes (leading tag 0x31).
pub fn reencode_signed_attrs(
    attrs: &cms::signed_data::SignedAttributes,
) -> CmsResult<Vec<u8>> {
    let der = attrs.to_der().map_err(|e| CmsError::MalformedAsn1 {
        details: format!("failed to re-encode signed attributes: {}", e),
    })?;
    debug_assert_eq!(der.first(), Some(&0x31));
    Ok(der)
}

/// SHA-256 of the SET-OF re-encoding: the value the ECDSA signature covers.
pub fn signed_attrs_digest(attrs: &cms::signed_data::SignedAttributes) -> CmsResult<Digest> {
    Ok(Digest::sha256(&reencode_signed_attrs(attrs)?))
}

/// Locates the `messageDigest` attribute and returns its OCTET STRING value
/// as a digest.
pub fn message_digest_attr(attrs: &cms::signed_data::SignedAttributes) -> CmsResult<Digest> {
    for attr in attrs.iter() {
        if attr.oid != MESSAGE_DIGEST_OID {
            continue;
        }
        let value = attr
            .values
            .iter()
            .next()
            .ok_or_else(|| CmsError::MalformedAsn1 {
                details: "messageDigest attribute has no value".to_string(),
            })?;
        let value_der = value.to_der().map_err(|e| CmsError::MalformedAsn1 {
            details: format!("failed to re-encode messageDigest value: {}", e),
        })?;
        let octets = OctetString::from_der(&value_der).map_err(|e| CmsError::MalformedAsn1 {
            details: format!("messageDigest value is not an OCTET STRING: {}", e),
        })?;
        return Digest::from_slice(octets.as_bytes()).map_err(|_| CmsError::MalformedAsn1 {
            details: format!(
                "messageDigest must be 32 bytes, got {}",
                octets.as_bytes().len()
            ),
        });
    }
    Err(CmsError::MalformedAsn1 {
        details: "no messageDigest attribute in signed attributes".to_string(),
    })
}

/// Enforces the consistency check between the `messageDigest` attribute and
/// the document's byte-range digest. Disagreement is fatal.
pub fn check_message_digest(
    attrs: &cms::signed_data::SignedAttributes,
    doc_digest: &Digest,
) -> CmsResult<Digest> {
    let attr_digest = message_digest_attr(attrs)?;
    if &attr_digest != doc_digest {
        return Err(CmsError::DigestMismatch {
            expected: doc_digest.to_hex(),
            actual: attr_digest.to_hex(),
        });
    }
    Ok(attr_digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::asn1::SetOfVec;
    use x509_cert::attr::Attribute;

    fn message_digest_attribute(digest: &[u8]) -> Attribute {
        let octets = OctetString::new(digest).unwrap();
        let any = der::Any::from_der(&octets.to_der().unwrap()).unwrap();
        let mut values = SetOfVec::new();
        values.insert(any).unwrap();
        Attribute {
            oid: MESSAGE_DIGEST_OID,
            values,
        }
    }

    fn content_type_attribute() -> Attribute {
        let oid = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
        let any = der::Any::from_der(&oid.to_der().unwrap()).unwrap();
        let mut values = SetOfVec::new();
        values.insert(any).unwrap();
        Attribute {
            oid: ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3"),
            values,
        }
    }

    fn attrs_with(digest: &[u8]) -> cms::signed_data::SignedAttributes {
        let mut attrs = SetOfVec::new();
        attrs.insert(content_type_attribute()).unwrap();
        attrs.insert(message_digest_attribute(digest)).unwrap();
        attrs
    }

    #[test]
    fn test_reencode_leads_with_set_tag() {
        let doc = Digest::sha256(b"document");
        let attrs = attrs_with(doc.as_bytes());
        let der = reencode_signed_attrs(&attrs).unwrap();
        assert_eq!(der[0], 0x31);
    }

    #[test]
    fn test_signed_attrs_digest_is_stable() {
        let doc = Digest::sha256(b"document");
        let attrs = attrs_with(doc.as_bytes());
        assert_eq!(
            signed_attrs_digest(&attrs).unwrap(),
            signed_attrs_digest(&attrs).unwrap()
        );
    }

    #[test]
    fn test_message_digest_attr_found() {
        let doc = Digest::sha256(b"document");
        let attrs = attrs_with(doc.as_bytes());
        assert_eq!(message_digest_attr(&attrs).unwrap(), doc);
    }

    #[test]
    fn test_message_digest_attr_missing() {
        let mut attrs = SetOfVec::new();
        attrs.insert(content_type_attribute()).unwrap();
        let err = message_digest_attr(&attrs).unwrap_err();
        assert!(matches!(err, CmsError::MalformedAsn1 { .. }));
    }

    #[test]
    fn test_message_digest_wrong_width() {
        let attrs = attrs_with(&[0u8; 20]);
        assert!(matches!(
            message_digest_attr(&attrs),
            Err(CmsError::MalformedAsn1 { .. })
        ));
    }

    #[test]
    fn test_check_message_digest_match() {
        let doc = Digest::sha256(b"document");
        let attrs = attrs_with(doc.as_bytes());
        assert!(check_message_digest(&attrs, &doc).is_ok());
    }

    #[test]
    fn test_check_message_digest_mismatch_is_fatal() {
        let doc = Digest::sha256(b"document");
        let other = Digest::sha256(b"another document");
        let attrs = attrs_with(other.as_bytes());
        let err = check_message_digest(&attrs, &doc).unwrap_err();
        assert!(matches!(err, CmsError::DigestMismatch { .. }));
    }
}
