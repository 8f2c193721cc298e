//! Stable artefact emission.
//!
//! Every file the pipeline writes has a fixed name and a bit-exact format;
//! verifiers and downstream tooling depend on both. Partial artefacts left
//! behind by a failed run are diagnostic aids; the absence of
//! `manifest.json` is what marks failure, so the manifest itself is the one
//! file written atomically (temp + rename).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::binding::BoundArtifact;
use crate::cms::SignerBundle;
use crate::config::PipelineConfig;
use crate::digest::Digest;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::merkle::{PoseidonTree, Sha256Tree};
use crate::statement::{field_to_bytes32, field_to_decimal};
use crate::trustlist::LotlSnapshot;

/// `VERIFIED_sig.json` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureFileRecord {
    pub algorithm: String,
    pub r: String,
    pub s: String,
    pub signature: String,
}

/// `VERIFIED_pubkey.json` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyFileRecord {
    pub algorithm: String,
    pub curve: String,
    pub x: String,
    pub y: String,
}

/// `tl_root_poseidon.json` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseidonRootRecord {
    pub root_hex: String,
    pub root_decimal: String,
}

/// Writes pipeline artefacts under one output directory.
pub struct ArtifactWriter<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        ArtifactWriter { config }
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        Ok(())
    }

    /// `doc_hash.bin` (32 raw bytes) and `doc_hash.hex` (64 chars + LF).
    pub fn write_doc_hash(&self, digest: &Digest) -> Result<()> {
        self.ensure_dir(&self.config.out_dir)?;
        fs::write(self.config.doc_hash_bin_path(), digest.as_bytes())?;
        fs::write(self.config.doc_hash_hex_path(), format!("{}\n", digest.to_hex()))?;
        Ok(())
    }

    /// Signer artefacts: signature and key records, signed-attributes
    /// digest, certificate PEM.
    pub fn write_signer(&self, signer: &SignerBundle) -> Result<()> {
        self.ensure_dir(&self.config.out_dir)?;
        let sig = SignatureFileRecord {
            algorithm: "ECDSA-SHA256".to_string(),
            r: signer.signature.r_hex(),
            s: signer.signature.s_hex(),
            signature: signer.signature.to_hex(),
        };
        write_json(&self.config.sig_json_path(), &sig)?;

        let key = PublicKeyFileRecord {
            algorithm: "EC".to_string(),
            curve: signer.public_key.curve().to_string(),
            x: signer.public_key.x_hex(),
            y: signer.public_key.y_hex(),
        };
        write_json(&self.config.pubkey_json_path(), &key)?;

        fs::write(
            self.config.signed_attrs_hash_path(),
            signer.signed_attrs_digest.as_bytes(),
        )?;
        fs::write(self.config.cert_pem_path(), signer.certificate_pem())?;
        Ok(())
    }

    /// Root file and per-leaf inclusion paths for a byte-variant tree.
    ///
    /// `eu` selects the EU file locations; `occupied` bounds path emission
    /// to the real (non-padding) leaves.
    pub fn write_byte_tree(&self, tree: &Sha256Tree, occupied: usize, eu: bool) -> Result<()> {
        let root_path = if eu {
            self.config.eu_root_path()
        } else {
            self.config.local_root_path()
        };
        let paths_dir = if eu {
            self.config.eu_paths_dir()
        } else {
            self.config.paths_dir()
        };
        self.ensure_dir(&self.config.out_dir)?;
        fs::write(&root_path, format!("{}\n", tree.root().to_hex()))?;

        self.ensure_dir(&paths_dir)?;
        for proof in tree.paths(occupied) {
            let file = paths_dir.join(format!("{}.json", proof.fingerprint.to_hex()));
            write_json(&file, &proof)?;
        }
        debug!(root = %tree.root(), occupied, eu, "wrote byte-variant tree artefacts");
        Ok(())
    }

    /// Root files and per-leaf inclusion paths for a field-variant tree.
    pub fn write_field_tree(&self, tree: &PoseidonTree, occupied: usize, eu: bool) -> Result<()> {
        let root = tree.root();
        let root_hex = hex::encode(field_to_bytes32(&root));
        let root_decimal = field_to_decimal(&root);

        self.ensure_dir(&self.config.out_dir)?;
        if eu {
            fs::write(self.config.eu_root_path(), format!("{}\n", root_decimal))?;
        } else {
            fs::write(self.config.local_root_path(), format!("{}\n", root_decimal))?;
            fs::write(self.config.poseidon_root_hex_path(), format!("{}\n", root_hex))?;
            write_json(
                &self.config.poseidon_root_json_path(),
                &PoseidonRootRecord {
                    root_hex,
                    root_decimal: root_decimal.clone(),
                },
            )?;
        }

        let paths_dir = if eu {
            self.config.eu_paths_dir()
        } else {
            self.config.paths_dir()
        };
        self.ensure_dir(&paths_dir)?;
        for proof in tree.paths(occupied) {
            let artifact = proof.to_artifact();
            let file = paths_dir.join(format!("{}.json", artifact.fingerprint.to_hex()));
            write_json(&file, &artifact)?;
        }
        debug!(root = %root_decimal, occupied, eu, "wrote field-variant tree artefacts");
        Ok(())
    }

    /// `encrypted-file.bin`, `cipher_hash.bin`, `encrypted-metadata.json`.
    pub fn write_artifact(&self, artifact: &BoundArtifact) -> Result<()> {
        self.ensure_dir(&self.config.out_dir)?;
        fs::write(self.config.encrypted_file_path(), &artifact.ciphertext_package)?;
        fs::write(self.config.cipher_hash_path(), artifact.artifact_hash.as_bytes())?;
        write_json(&self.config.encrypted_metadata_path(), &artifact.metadata)?;
        Ok(())
    }

    /// `proof.bin` and `vkey.bin`.
    pub fn write_proof(&self, proof: &[u8], vk: &[u8]) -> Result<()> {
        self.ensure_dir(&self.config.out_dir)?;
        fs::write(self.config.proof_path(), proof)?;
        fs::write(self.config.vkey_path(), vk)?;
        Ok(())
    }

    /// `eu_trust_snapshot.json`.
    pub fn write_eu_snapshot(&self, snapshot: &LotlSnapshot) -> Result<()> {
        self.ensure_dir(&self.config.out_dir)?;
        fs::write(self.config.eu_snapshot_path(), snapshot.to_json()?)?;
        Ok(())
    }

    /// Atomic manifest emission: write to a temp file in the same
    /// directory, then rename over the target. A half-written
    /// `manifest.json` is never observable.
    pub fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        self.ensure_dir(&self.config.out_dir)?;
        let target = self.config.manifest_path();
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, manifest.to_canonical_json()?)?;
        fs::rename(&tmp, &target)?;
        info!(path = %target.display(), "manifest written");
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{EcdsaSignatureValue, SignerPublicKey};
    use crate::statement::StatementVariant;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, variant: StatementVariant) -> PipelineConfig {
        PipelineConfig::new(dir.path(), variant)
    }

    fn sample_signer() -> SignerBundle {
        let cert_der = vec![0x30, 0x82, 0x01, 0x00];
        SignerBundle {
            fingerprint: Digest::sha256(&cert_der),
            certificate_der: cert_der,
            public_key: SignerPublicKey {
                x: [0x11; 32],
                y: [0x22; 32],
            },
            signature: EcdsaSignatureValue::from_bytes([0x33; 64]),
            signed_attrs_der: vec![0x31, 0x00],
            signed_attrs_digest: Digest::sha256(&[0x31, 0x00]),
        }
    }

    #[test]
    fn test_doc_hash_files() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, StatementVariant::ByteMerkle);
        let digest = Digest::sha256(b"document");
        ArtifactWriter::new(&config).write_doc_hash(&digest).unwrap();

        let bin = fs::read(config.doc_hash_bin_path()).unwrap();
        assert_eq!(bin, digest.as_bytes());
        let hex_file = fs::read_to_string(config.doc_hash_hex_path()).unwrap();
        assert_eq!(hex_file, format!("{}\n", digest.to_hex()));
    }

    #[test]
    fn test_signer_files() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, StatementVariant::ByteMerkle);
        let signer = sample_signer();
        ArtifactWriter::new(&config).write_signer(&signer).unwrap();

        let sig: SignatureFileRecord =
            serde_json::from_str(&fs::read_to_string(config.sig_json_path()).unwrap()).unwrap();
        assert_eq!(sig.algorithm, "ECDSA-SHA256");
        assert_eq!(sig.r.len(), 64);
        assert_eq!(sig.s.len(), 64);
        assert_eq!(sig.signature.len(), 128);

        let key: PublicKeyFileRecord =
            serde_json::from_str(&fs::read_to_string(config.pubkey_json_path()).unwrap()).unwrap();
        assert_eq!(key.algorithm, "EC");
        assert_eq!(key.curve, "P-256");
        assert_eq!(key.x, "11".repeat(32));

        let attrs = fs::read(config.signed_attrs_hash_path()).unwrap();
        assert_eq!(attrs.len(), 32);

        let pem = fs::read_to_string(config.cert_pem_path()).unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn test_byte_tree_files() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, StatementVariant::ByteMerkle);
        let leaves = vec![Digest::sha256(b"ca-1"), Digest::sha256(b"ca-2")];
        let tree = Sha256Tree::build(&leaves).unwrap();
        ArtifactWriter::new(&config)
            .write_byte_tree(&tree, leaves.len(), false)
            .unwrap();

        let root = fs::read_to_string(config.local_root_path()).unwrap();
        assert_eq!(root, format!("{}\n", tree.root().to_hex()));
        for leaf in &leaves {
            let path_file = config.paths_dir().join(format!("{}.json", leaf.to_hex()));
            assert!(path_file.exists(), "missing {}", path_file.display());
        }
        // Padding leaves get no path files.
        assert_eq!(fs::read_dir(config.paths_dir()).unwrap().count(), 2);
    }

    #[test]
    fn test_field_tree_files() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, StatementVariant::FieldMerkle);
        let leaves = vec![Digest::sha256(b"ca-1")];
        let tree = PoseidonTree::build(&leaves).unwrap();
        ArtifactWriter::new(&config)
            .write_field_tree(&tree, 1, false)
            .unwrap();

        let txt = fs::read_to_string(config.local_root_path()).unwrap();
        assert!(txt.trim_end().chars().all(|c| c.is_ascii_digit()));
        let record: PoseidonRootRecord =
            serde_json::from_str(&fs::read_to_string(config.poseidon_root_json_path()).unwrap())
                .unwrap();
        assert_eq!(record.root_decimal, txt.trim_end());
        assert_eq!(record.root_hex.len(), 64);
    }

    #[test]
    fn test_manifest_atomic_write() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, StatementVariant::ByteMerkle);
        let manifest = crate::manifest::Manifest {
            version: 1,
            doc_hash: "00".repeat(32),
            artifact: crate::manifest::ArtifactRecord {
                kind: "encrypted-file".to_string(),
                artifact_hash: "11".repeat(32),
            },
            signer: crate::manifest::SignerRecord {
                pub_x: "22".repeat(32),
                pub_y: "33".repeat(32),
                fingerprint: "44".repeat(32),
            },
            tl_root: "55".repeat(32),
            eu_trust: crate::manifest::EuTrustRecord {
                enabled: false,
                tl_root_eu: None,
                eu_index: None,
            },
            proof: String::new(),
            timestamp: "2026-03-14T09:26:53Z".to_string(),
        };
        ArtifactWriter::new(&config).write_manifest(&manifest).unwrap();
        assert!(config.manifest_path().exists());
        // No stray temp file remains.
        assert!(!config.manifest_path().with_extension("json.tmp").exists());
        let back =
            Manifest::from_json_str(&fs::read_to_string(config.manifest_path()).unwrap()).unwrap();
        assert_eq!(back, manifest);
    }
}
