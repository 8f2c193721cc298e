//! Point-in-time snapshot of an ingested EU trust list.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::{Error, Result};

/// A reproducible record of one LOTL ingestion.
///
/// Consumers rebuild the Merkle tree from `qualified_cas` and must obtain
/// an identical root; divergence is grounds for rejection at verification
/// time. `lotl_hash` pins the exact XML bytes the fingerprints came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotlSnapshot {
    /// SHA-256 of the LOTL XML bytes
    pub lotl_hash: Digest,
    /// ISO-8601 capture time
    pub snapshot_date: String,
    /// Ordered, deduplicated qualified-CA fingerprints
    pub qualified_cas: Vec<Digest>,
}

impl LotlSnapshot {
    /// Ingests LOTL XML bytes into a snapshot stamped `taken_at`.
    pub fn ingest(xml_bytes: &[u8], taken_at: DateTime<Utc>) -> Result<Self> {
        let xml = std::str::from_utf8(xml_bytes)
            .map_err(|e| Error::MalformedXml(format!("LOTL is not UTF-8: {}", e)))?;
        let qualified_cas = super::lotl::qualified_ca_fingerprints(xml)?;
        Ok(LotlSnapshot {
            lotl_hash: Digest::sha256(xml_bytes),
            snapshot_date: taken_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            qualified_cas,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn contains(&self, fingerprint: &Digest) -> bool {
        self.qualified_cas.contains(fingerprint)
    }
}
