//! Pipeline configuration.
//!
//! Everything the original tooling hard-coded (output locations, variant
//! selection, dual-trust toggle) is an explicit value passed into each
//! component. The tree depth is deliberately *not* configurable: changing
//! it invalidates every existing manifest.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::statement::StatementVariant;

/// Configuration for one prover or verifier run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory all artefacts are written to and read from.
    pub out_dir: PathBuf,
    /// Statement variant; the field variant is the recommended default.
    pub variant: StatementVariant,
    /// Whether the EU-trust branch of the statement is active.
    pub eu_trust_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            out_dir: PathBuf::from("out"),
            variant: StatementVariant::FieldMerkle,
            eu_trust_enabled: false,
        }
    }
}

impl PipelineConfig {
    pub fn new(out_dir: impl Into<PathBuf>, variant: StatementVariant) -> Self {
        PipelineConfig {
            out_dir: out_dir.into(),
            variant,
            eu_trust_enabled: false,
        }
    }

    pub fn with_eu_trust(mut self, enabled: bool) -> Self {
        self.eu_trust_enabled = enabled;
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    pub fn doc_hash_bin_path(&self) -> PathBuf {
        self.path("doc_hash.bin")
    }

    pub fn doc_hash_hex_path(&self) -> PathBuf {
        self.path("doc_hash.hex")
    }

    pub fn sig_json_path(&self) -> PathBuf {
        self.path("VERIFIED_sig.json")
    }

    pub fn pubkey_json_path(&self) -> PathBuf {
        self.path("VERIFIED_pubkey.json")
    }

    pub fn signed_attrs_hash_path(&self) -> PathBuf {
        self.path("VERIFIED_signed_attrs_hash.bin")
    }

    pub fn cert_pem_path(&self) -> PathBuf {
        self.path("cms_embedded_cert.pem")
    }

    /// Root file of the local trust list for the configured variant.
    pub fn local_root_path(&self) -> PathBuf {
        match self.variant {
            StatementVariant::ByteMerkle => self.path("tl_root.hex"),
            StatementVariant::FieldMerkle => self.path("tl_root_poseidon.txt"),
        }
    }

    pub fn poseidon_root_hex_path(&self) -> PathBuf {
        self.path("tl_root_poseidon.hex")
    }

    pub fn poseidon_root_json_path(&self) -> PathBuf {
        self.path("tl_root_poseidon.json")
    }

    /// Root file of the EU trust list for the configured variant.
    pub fn eu_root_path(&self) -> PathBuf {
        match self.variant {
            StatementVariant::ByteMerkle => self.path("tl_root_eu.hex"),
            StatementVariant::FieldMerkle => self.path("tl_root_eu_poseidon.txt"),
        }
    }

    /// Per-leaf inclusion-path directory for the configured variant.
    pub fn paths_dir(&self) -> PathBuf {
        match self.variant {
            StatementVariant::ByteMerkle => self.path("paths"),
            StatementVariant::FieldMerkle => self.path("paths-poseidon"),
        }
    }

    pub fn eu_paths_dir(&self) -> PathBuf {
        match self.variant {
            StatementVariant::ByteMerkle => self.path("paths-eu"),
            StatementVariant::FieldMerkle => self.path("paths-eu-poseidon"),
        }
    }

    pub fn encrypted_file_path(&self) -> PathBuf {
        self.path("encrypted-file.bin")
    }

    pub fn cipher_hash_path(&self) -> PathBuf {
        self.path("cipher_hash.bin")
    }

    pub fn encrypted_metadata_path(&self) -> PathBuf {
        self.path("encrypted-metadata.json")
    }

    pub fn proof_path(&self) -> PathBuf {
        self.path("proof.bin")
    }

    pub fn vkey_path(&self) -> PathBuf {
        self.path("vkey.bin")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path("manifest.json")
    }

    pub fn eu_snapshot_path(&self) -> PathBuf {
        self.path("eu_trust_snapshot.json")
    }

    /// Loads a config from a JSON file.
    pub fn from_json_file(path: &Path) -> crate::error::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
