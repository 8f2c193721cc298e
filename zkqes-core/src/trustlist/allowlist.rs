//! Local organizational allow-list ingestion.

use serde::Deserialize;
use std::path::Path;

use crate::digest::Digest;
use crate::error::{Error, Result};

/// An ordered set of certificate fingerprints trusted by the organization.
///
/// Ordering is the insertion order of the source file, so the tree built
/// from an allow-list is reproducible. Duplicates are preserved here and
/// rejected at tree-build time (trees are sets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    fingerprints: Vec<Digest>,
}

/// The two accepted JSON shapes: a rich `signers` array with per-signer
/// metadata, or a flat `cert_fingerprints` list.
#[derive(Deserialize)]
#[serde(untagged)]
enum AllowListFile {
    Signers { signers: Vec<SignerEntry> },
    Flat { cert_fingerprints: Vec<String> },
}

#[derive(Deserialize)]
struct SignerEntry {
    fingerprint: String,
}

impl AllowList {
    pub fn new(fingerprints: Vec<Digest>) -> Self {
        AllowList { fingerprints }
    }

    /// Parses either accepted JSON shape. Fingerprints must be 64 hex
    /// characters; anything else is [`Error::InvalidFingerprint`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: AllowListFile = serde_json::from_str(json).map_err(|e| {
            Error::InvalidFingerprint(format!("allow-list JSON did not match either shape: {}", e))
        })?;
        let raw = match file {
            AllowListFile::Signers { signers } => {
                signers.into_iter().map(|s| s.fingerprint).collect()
            }
            AllowListFile::Flat { cert_fingerprints } => cert_fingerprints,
        };
        let fingerprints = raw
            .iter()
            .map(|s| Digest::from_hex(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(AllowList { fingerprints })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn fingerprints(&self) -> &[Digest] {
        &self.fingerprints
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    pub fn contains(&self, fingerprint: &Digest) -> bool {
        self.fingerprints.contains(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPR_A: &str = "06a02856c08dde5c6679377c06f6fe7be1855d586bd1448343db2736b1473cd3";
    const FPR_B: &str = "28327db146121652074521fef547918d6b96773d62234e77709d07fc0c589434";

    #[test]
    fn test_flat_shape() {
        let json = format!(r#"{{ "cert_fingerprints": ["{}", "{}"] }}"#, FPR_A, FPR_B);
        let list = AllowList::from_json_str(&json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.fingerprints()[0].to_hex(), FPR_A);
        assert_eq!(list.fingerprints()[1].to_hex(), FPR_B);
    }

    #[test]
    fn test_signers_shape_with_extra_fields() {
        let json = format!(
            r#"{{ "signers": [
                {{ "fingerprint": "{}", "name": "Alice", "role": "qualified" }},
                {{ "fingerprint": "{}" }}
            ] }}"#,
            FPR_A, FPR_B
        );
        let list = AllowList::from_json_str(&json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.fingerprints()[0].to_hex(), FPR_A);
    }

    #[test]
    fn test_order_is_preserved() {
        let json = format!(r#"{{ "cert_fingerprints": ["{}", "{}"] }}"#, FPR_B, FPR_A);
        let list = AllowList::from_json_str(&json).unwrap();
        assert_eq!(list.fingerprints()[0].to_hex(), FPR_B);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        let json = r#"{ "cert_fingerprints": ["zz"] }"#;
        let err = AllowList::from_json_str(json).unwrap_err();
        assert!(matches!(err, Error::InvalidFingerprint(_)));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let json = r#"{ "cert_fingerprints": ["abcd1234"] }"#;
        let err = AllowList::from_json_str(json).unwrap_err();
        assert!(matches!(err, Error::InvalidFingerprint(_)));
    }

    #[test]
    fn test_unrecognized_shape_rejected() {
        let err = AllowList::from_json_str(r#"{ "something": [] }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidFingerprint(_)));
    }

    #[test]
    fn test_empty_list_allowed() {
        let list = AllowList::from_json_str(r#"{ "cert_fingerprints": [] }"#).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_contains() {
        let json = format!(r#"{{ "cert_fingerprints": ["{}"] }}"#, FPR_A);
        let list = AllowList::from_json_str(&json).unwrap();
        assert!(list.contains(&Digest::from_hex(FPR_A).unwrap()));
        assert!(!list.contains(&Digest::from_hex(FPR_B).unwrap()));
    }
}
