//! Trust-list ingestion.
//!
//! Normalizes two sources into ordered sets of 32-byte certificate
//! fingerprints: a private organizational allow-list (JSON) and the EU List
//! of Trusted Lists (ETSI TS 119 612 XML). The resulting fingerprint lists
//! feed the Merkle engine; ordering is stable so regeneration from the same
//! source reproduces the same tree.

mod allowlist;
mod lotl;
mod snapshot;

pub use allowlist::AllowList;
pub use lotl::qualified_ca_fingerprints;
pub use snapshot::LotlSnapshot;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::digest::Digest;
use crate::error::{Error, Result};

/// Fingerprints a certificate supplied either as raw DER or as a PEM
/// wrapping thereof. The fingerprint is always SHA-256 of the DER bytes,
/// so both input forms of the same certificate agree.
pub fn certificate_fingerprint(input: &[u8]) -> Result<Digest> {
    if let Ok(text) = std::str::from_utf8(input) {
        if text.contains("-----BEGIN CERTIFICATE-----") {
            let body: String = text
                .lines()
                .skip_while(|line| !line.contains("-----BEGIN CERTIFICATE-----"))
                .skip(1)
                .take_while(|line| !line.contains("-----END CERTIFICATE-----"))
                .map(str::trim)
                .collect();
            let der = BASE64.decode(body.as_bytes()).map_err(|e| {
                Error::InvalidFingerprint(format!("invalid PEM certificate body: {}", e))
            })?;
            if der.is_empty() {
                return Err(Error::InvalidFingerprint(
                    "empty PEM certificate body".to_string(),
                ));
            }
            return Ok(Digest::sha256(&der));
        }
    }
    if input.is_empty() {
        return Err(Error::InvalidFingerprint("empty certificate".to_string()));
    }
    Ok(Digest::sha256(input))
}
