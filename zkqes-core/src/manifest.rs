//! The proof manifest: canonical JSON record of public inputs, proof and
//! metadata.
//!
//! Manifests are append-only per proof: the prover writes one atomically
//! and nothing ever mutates it. Serialization is canonical: stable key
//! order (struct order below), two-space indentation, LF line endings, one
//! trailing newline, UTF-8 without BOM, so independent implementations
//! produce byte-identical manifests from the same inputs.
//!
//! `doc_hash` records the byte-range digest of the document. The statement's
//! public input of the same name carries the signed-attributes digest; the
//! clash is historical and renaming either side is a schema version bump.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::statement::StatementVariant;

/// The only schema version this implementation reads or writes.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Artifact type label, e.g. `"encrypted-file"`
    #[serde(rename = "type")]
    pub kind: String,
    /// SHA-256 of the ciphertext package, hex
    pub artifact_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRecord {
    pub pub_x: String,
    pub pub_y: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EuTrustRecord {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tl_root_eu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eu_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    /// Byte-range digest of the document, hex
    pub doc_hash: String,
    pub artifact: ArtifactRecord,
    pub signer: SignerRecord,
    /// Local trust-list root: hex for the byte variant, decimal field
    /// string for the field variant
    pub tl_root: String,
    pub eu_trust: EuTrustRecord,
    /// Proof bytes, base64
    pub proof: String,
    /// RFC-3339 emission time
    pub timestamp: String,
}

impl Manifest {
    /// Canonical JSON emission.
    pub fn to_canonical_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parses and validates a manifest. Consumers reject anything the
    /// schema check flags before touching artefacts.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)
            .map_err(|e| Error::ManifestSchema(format!("manifest JSON: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Schema validation: version, hex widths, timestamp format, EU-branch
    /// shape, proof decodability.
    pub fn validate(&self) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            return Err(Error::ManifestSchema(format!(
                "unsupported manifest version {} (expected {})",
                self.version, MANIFEST_VERSION
            )));
        }
        check_hex64("doc_hash", &self.doc_hash)?;
        check_hex64("artifact.artifact_hash", &self.artifact.artifact_hash)?;
        check_hex64("signer.pub_x", &self.signer.pub_x)?;
        check_hex64("signer.pub_y", &self.signer.pub_y)?;
        check_hex64("signer.fingerprint", &self.signer.fingerprint)?;
        if self.artifact.kind.is_empty() {
            return Err(Error::ManifestSchema("empty artifact.type".to_string()));
        }
        check_root_shape("tl_root", &self.tl_root)?;

        if self.eu_trust.enabled {
            match &self.eu_trust.tl_root_eu {
                Some(root) => check_root_shape("eu_trust.tl_root_eu", root)?,
                None => {
                    return Err(Error::ManifestSchema(
                        "eu_trust.enabled without eu_trust.tl_root_eu".to_string(),
                    ))
                }
            }
        } else if let Some(root) = &self.eu_trust.tl_root_eu {
            // Tolerated shape when disabled: absent or all-zero.
            if !is_zero_root(root) {
                return Err(Error::ManifestSchema(
                    "eu_trust disabled but tl_root_eu is non-zero".to_string(),
                ));
            }
        }

        DateTime::parse_from_rfc3339(&self.timestamp).map_err(|e| {
            Error::ManifestSchema(format!("timestamp {:?} is not RFC-3339: {}", self.timestamp, e))
        })?;

        BASE64
            .decode(self.proof.as_bytes())
            .map_err(|e| Error::ManifestSchema(format!("proof is not valid base64: {}", e)))?;
        Ok(())
    }

    /// Decodes the embedded proof bytes.
    pub fn proof_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.proof.as_bytes())
            .map_err(|e| Error::ManifestSchema(format!("proof is not valid base64: {}", e)))
    }

    /// The variant this manifest's roots are encoded for, inferred from the
    /// root shape: 64 hex chars is the byte variant, decimal is the field
    /// variant.
    pub fn infer_variant(&self) -> Result<StatementVariant> {
        if self.tl_root.len() == 64 && self.tl_root.chars().all(|c| c.is_ascii_hexdigit()) {
            // All-digit 64-char strings are ambiguous; hex wins for width 64.
            Ok(StatementVariant::ByteMerkle)
        } else if self.tl_root.chars().all(|c| c.is_ascii_digit()) {
            Ok(StatementVariant::FieldMerkle)
        } else {
            Err(Error::ManifestSchema(format!(
                "tl_root {:?} is neither hex64 nor decimal",
                self.tl_root
            )))
        }
    }

    /// RFC-3339 timestamp for `now`.
    pub fn timestamp_now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn check_hex64(field: &str, value: &str) -> Result<()> {
    if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::ManifestSchema(format!(
            "{} must be 64 hex chars, got {:?}",
            field, value
        )));
    }
    Ok(())
}

fn check_root_shape(field: &str, value: &str) -> Result<()> {
    let is_hex64 = value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit());
    let is_decimal = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    if !is_hex64 && !is_decimal {
        return Err(Error::ManifestSchema(format!(
            "{} must be 64 hex chars or a decimal field string, got {:?}",
            field, value
        )));
    }
    Ok(())
}

fn is_zero_root(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c == '0')
}
