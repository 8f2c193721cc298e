//! Test-support: synthesizes minimal signed PDFs with real CAdES CMS blobs.
//!
//! The fixture hand-assembles the DER so tests control every byte: a
//! self-contained X.509 certificate around a fresh P-256 key, CAdES signed
//! attributes carrying the document digest, and a genuine ECDSA signature
//! over their SET-OF re-encoding, all embedded in a `/Contents` placeholder
//! whose byte ranges hash to the committed digest.

use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use sha2::{Digest as Sha2Digest, Sha256};
use zkqes::Digest;

/// Reserved width of the `/Contents` hex placeholder.
const HEX_RESERVED: usize = 4096;

pub struct SignedPdfFixture {
    pub pdf: Vec<u8>,
    pub cert_der: Vec<u8>,
    pub fingerprint: Digest,
    pub doc_digest: Digest,
    pub signing_key: SigningKey,
}

/// Builds a signed PDF whose CMS `messageDigest` attribute carries the
/// byte-range digest, or `message_digest_override` when a mismatch is the
/// point of the test.
pub fn signed_pdf(message_digest_override: Option<[u8; 32]>) -> SignedPdfFixture {
    let signing_key = SigningKey::random(&mut OsRng);

    let head: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
        2 0 obj\n<< /Type /Pages /Count 1 >>\nendobj\n\
        3 0 obj\n<< /Type /Sig /Filter /Adobe.PPKLite /SubFilter /ETSI.CAdES.detached \
        /ByteRange [";
    let mid: &[u8] = b"] /Contents ";
    let part3: &[u8] = b"\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

    // Fixed-width numbers keep the layout independent of their values.
    let nums_width = 4 * 10 + 3;
    let l1 = head.len() + nums_width + mid.len();
    let gap_len = 1 + HEX_RESERVED + 1;
    let o2 = l1 + gap_len;
    let l2 = part3.len();

    let mut part1 = Vec::with_capacity(l1);
    part1.extend_from_slice(head);
    part1.extend_from_slice(format!("{:>10} {:>10} {:>10} {:>10}", 0, l1, o2, l2).as_bytes());
    part1.extend_from_slice(mid);
    assert_eq!(part1.len(), l1);

    let doc_digest = {
        let mut hasher = Sha256::new();
        hasher.update(&part1);
        hasher.update(part3);
        Digest::from_bytes(hasher.finalize().into())
    };
    let message_digest = message_digest_override.unwrap_or(*doc_digest.as_bytes());

    let cert_der = build_certificate(&signing_key);
    let fingerprint = Digest::sha256(&cert_der);
    let cms_der = build_cms(&signing_key, &cert_der, &message_digest);

    let hex = hex::encode(&cms_der);
    assert!(
        hex.len() <= HEX_RESERVED,
        "CMS blob too large for the placeholder: {} hex chars",
        hex.len()
    );

    let mut pdf = Vec::with_capacity(o2 + l2);
    pdf.extend_from_slice(&part1);
    pdf.push(b'<');
    pdf.extend_from_slice(hex.as_bytes());
    pdf.extend(std::iter::repeat(b'0').take(HEX_RESERVED - hex.len()));
    pdf.push(b'>');
    pdf.extend_from_slice(part3);
    assert_eq!(pdf.len(), o2 + l2);

    SignedPdfFixture {
        pdf,
        cert_der,
        fingerprint,
        doc_digest,
        signing_key,
    }
}

// ---- DER assembly ------------------------------------------------------

fn der_len(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else {
        let mut be = Vec::new();
        let mut v = len;
        while v > 0 {
            be.insert(0, (v & 0xff) as u8);
            v >>= 8;
        }
        let mut out = vec![0x80 | be.len() as u8];
        out.extend_from_slice(&be);
        out
    }
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&der_len(content.len()));
    out.extend_from_slice(content);
    out
}

fn seq(parts: &[&[u8]]) -> Vec<u8> {
    tlv(0x30, &parts.concat())
}

fn set(parts: &[&[u8]]) -> Vec<u8> {
    tlv(0x31, &parts.concat())
}

/// Constructed context tag `[n]`, used both for EXPLICIT wrapping and for
/// IMPLICIT retagging of constructed values.
fn ctx(n: u8, content: &[u8]) -> Vec<u8> {
    tlv(0xa0 | n, content)
}

fn octet_string(content: &[u8]) -> Vec<u8> {
    tlv(0x04, content)
}

fn bit_string(content: &[u8]) -> Vec<u8> {
    let mut inner = vec![0x00];
    inner.extend_from_slice(content);
    tlv(0x03, &inner)
}

fn utf8_string(text: &str) -> Vec<u8> {
    tlv(0x0c, text.as_bytes())
}

fn utc_time(text: &str) -> Vec<u8> {
    tlv(0x17, text.as_bytes())
}

fn integer(value: u8) -> Vec<u8> {
    tlv(0x02, &[value])
}

/// Dotted-decimal OID to DER.
fn oid(text: &str) -> Vec<u8> {
    let arcs: Vec<u64> = text.split('.').map(|a| a.parse().unwrap()).collect();
    let mut content = vec![(arcs[0] * 40 + arcs[1]) as u8];
    for arc in &arcs[2..] {
        let mut chunk = Vec::new();
        let mut v = *arc;
        chunk.push((v & 0x7f) as u8);
        v >>= 7;
        while v > 0 {
            chunk.push(0x80 | (v & 0x7f) as u8);
            v >>= 7;
        }
        chunk.reverse();
        content.extend_from_slice(&chunk);
    }
    tlv(0x06, &content)
}

/// `Name` with a single common-name RDN.
fn name(common_name: &str) -> Vec<u8> {
    seq(&[&set(&[&seq(&[&oid("2.5.4.3"), &utf8_string(common_name)])])])
}

fn algorithm_ecdsa_sha256() -> Vec<u8> {
    seq(&[&oid("1.2.840.10045.4.3.2")])
}

fn algorithm_sha256() -> Vec<u8> {
    seq(&[&oid("2.16.840.1.101.3.4.2.1")])
}

/// Minimal self-contained X.509 v3 certificate around the signer's public
/// key. The certificate's own signature is structurally valid DER but not
/// cryptographically meaningful; nothing in the pipeline verifies it.
fn build_certificate(signing_key: &SigningKey) -> Vec<u8> {
    let point = signing_key.verifying_key().to_encoded_point(false);

    let spki = seq(&[
        &seq(&[&oid("1.2.840.10045.2.1"), &oid("1.2.840.10045.3.1.7")]),
        &bit_string(point.as_bytes()),
    ]);
    let tbs = seq(&[
        &ctx(0, &integer(2)), // version v3
        &integer(1),          // serialNumber
        &algorithm_ecdsa_sha256(),
        &name("Test Qualified CA"),
        &seq(&[&utc_time("250101000000Z"), &utc_time("350101000000Z")]),
        &name("Test Signer"),
        &spki,
    ]);

    // Placeholder signature: a syntactically valid ECDSA-Sig-Value.
    let placeholder_sig = seq(&[&tlv(0x02, &[0x01]), &tlv(0x02, &[0x01])]);
    seq(&[&tbs, &algorithm_ecdsa_sha256(), &bit_string(&placeholder_sig)])
}

/// CAdES-style detached SignedData with one SignerInfo.
fn build_cms(signing_key: &SigningKey, cert_der: &[u8], message_digest: &[u8; 32]) -> Vec<u8> {
    // Signed attributes: contentType(id-data) and messageDigest, in DER
    // SET-OF order (bytewise over the encoded attributes).
    let content_type_attr = seq(&[
        &oid("1.2.840.113549.1.9.3"),
        &set(&[&oid("1.2.840.113549.1.7.1")]),
    ]);
    let message_digest_attr = seq(&[
        &oid("1.2.840.113549.1.9.4"),
        &set(&[&octet_string(message_digest)]),
    ]);
    let mut attrs = vec![content_type_attr, message_digest_attr];
    attrs.sort();
    let attrs_content = attrs.concat();

    // The signature covers the SET-OF (0x31) re-encoding.
    let set_form = tlv(0x31, &attrs_content);
    let attrs_digest: [u8; 32] = Sha256::digest(&set_form).into();
    let signature: p256::ecdsa::Signature =
        signing_key.sign_prehash(&attrs_digest).unwrap();
    let signature_der = signature.to_der();

    let issuer_and_serial = seq(&[&name("Test Qualified CA"), &integer(1)]);
    let signer_info = seq(&[
        &integer(1), // version: issuerAndSerialNumber
        &issuer_and_serial,
        &algorithm_sha256(),
        &ctx(0, &attrs_content), // signedAttrs, [0] IMPLICIT on the wire
        &algorithm_ecdsa_sha256(),
        &octet_string(signature_der.as_bytes()),
    ]);

    let encap_content_info = seq(&[&oid("1.2.840.113549.1.7.1")]); // detached
    let signed_data = seq(&[
        &integer(1), // version
        &set(&[&algorithm_sha256()]),
        &encap_content_info,
        &ctx(0, cert_der), // certificates, [0] IMPLICIT
        &set(&[&signer_info]),
    ]);

    seq(&[
        &oid("1.2.840.113549.1.7.2"),
        &ctx(0, &signed_data), // [0] EXPLICIT content
    ])
}
