//! EU List of Trusted Lists (ETSI TS 119 612) ingestion.
//!
//! A simplified reader: the parser enumerates `TrustServiceProvider` /
//! `TrustService` entries, keeps those whose service type denotes a
//! qualified certificate-issuing service, and fingerprints every embedded
//! `X509Certificate`. Verifying the LOTL's own signature is a collaborator
//! responsibility; consumers pin the exact XML bytes via the snapshot's
//! `lotl_hash`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::digest::Digest;
use crate::error::{Error, Result};

/// Service-type URIs that mark a qualified certificate-issuing CA.
const QUALIFIED_SERVICE_TYPES: [&str; 1] = ["http://uri.etsi.org/TrstSvc/Svctype/CA/QC"];

/// Parses the LOTL XML and returns the ordered, deduplicated fingerprints
/// of every qualified CA certificate.
pub fn qualified_ca_fingerprints(xml: &str) -> Result<Vec<Digest>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut fingerprints: Vec<Digest> = Vec::new();
    let mut in_service_type = false;
    let mut in_certificate = false;
    let mut service_type = String::new();
    let mut certificate_b64 = String::new();
    // Certificates seen for the current TSPService, flushed when the
    // service element closes and its type qualifies.
    let mut pending_certs: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"ServiceTypeIdentifier" => {
                    in_service_type = true;
                    service_type.clear();
                }
                b"X509Certificate" => {
                    in_certificate = true;
                    certificate_b64.clear();
                }
                b"TSPService" => {
                    service_type.clear();
                    pending_certs.clear();
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_service_type || in_certificate {
                    let decoded = e.decode().map_err(|err| {
                        Error::MalformedXml(format!("text decode failed: {}", err))
                    })?;
                    let text = quick_xml::escape::unescape(&decoded).map_err(|err| {
                        Error::MalformedXml(format!("text unescape failed: {}", err))
                    })?;
                    if in_service_type {
                        service_type.push_str(text.trim());
                    } else {
                        certificate_b64.push_str(text.trim());
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"ServiceTypeIdentifier" => in_service_type = false,
                b"X509Certificate" => {
                    in_certificate = false;
                    pending_certs.push(certificate_b64.clone());
                }
                b"TSPService" => {
                    if QUALIFIED_SERVICE_TYPES.contains(&service_type.as_str()) {
                        for b64 in pending_certs.drain(..) {
                            let fpr = fingerprint_of_base64_cert(&b64)?;
                            if !fingerprints.contains(&fpr) {
                                fingerprints.push(fpr);
                            }
                        }
                    } else if !pending_certs.is_empty() {
                        debug!(
                            service_type = %service_type,
                            "skipping non-qualified trust service"
                        );
                        pending_certs.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::MalformedXml(format!(
                    "LOTL parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    if fingerprints.is_empty() {
        warn!("LOTL yielded no qualified CA certificates");
    }
    Ok(fingerprints)
}

fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|b| *b == b':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    }
}

fn fingerprint_of_base64_cert(b64: &str) -> Result<Digest> {
    let compact: String = b64.chars().filter(|c| !c.is_whitespace()).collect();
    let der = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| Error::MalformedXml(format!("invalid X509Certificate base64: {}", e)))?;
    Ok(Digest::sha256(&der))
}
