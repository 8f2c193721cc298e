//! End-to-end prover orchestration.
//!
//! Single-threaded cooperative: each stage runs to completion before the
//! next starts, in the order the data dependencies demand: byte-range
//! digest before CMS extraction (the consistency check needs it), CMS
//! before witness assembly, tree build before path emission, witness before
//! proving. Partial artefacts from a failed run stay on disk as
//! diagnostics; only a written `manifest.json` marks success.

use tracing::info;

use crate::binding::{encrypt_artifact, RecipientKey};
use crate::config::PipelineConfig;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::manifest::{ArtifactRecord, EuTrustRecord, Manifest, SignerRecord};
use crate::merkle::{PoseidonTree, Sha256Tree};
use crate::outputs::ArtifactWriter;
use crate::pdf::{document_digest, extract_contents_der, find_byte_range};
use crate::prover::{ProverBridge, ProvingBackend};
use crate::statement::{RootValue, StatementVariant};
use crate::trustlist::{AllowList, LotlSnapshot};
use crate::witness::{assemble_witness, TrustEvidence};

/// What a successful prover run leaves behind, beyond the files on disk.
#[derive(Debug, Clone)]
pub struct ProverRun {
    pub manifest: Manifest,
    pub doc_digest: Digest,
    pub signer_fingerprint: Digest,
    pub artifact_hash: Digest,
}

/// The prover side of the system: drives extraction, trust-list trees,
/// binding, witness assembly and proving against one output directory.
pub struct ProofPipeline {
    config: PipelineConfig,
    bridge: ProverBridge,
}

impl ProofPipeline {
    /// Pipeline over the in-repo reference backend.
    pub fn new(config: PipelineConfig) -> Self {
        ProofPipeline {
            config,
            bridge: ProverBridge::native(),
        }
    }

    pub fn with_backend(config: PipelineConfig, backend: Box<dyn ProvingBackend>) -> Self {
        ProofPipeline {
            config,
            bridge: ProverBridge::new(backend),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full proving pipeline over one signed PDF.
    ///
    /// `eu_snapshot` must be present exactly when the config enables EU
    /// trust. `payload` is the plaintext delivered alongside the proof,
    /// encrypted for `recipient` and bound to the document digest.
    pub fn run(
        &mut self,
        pdf_bytes: &[u8],
        allow_list: &AllowList,
        eu_snapshot: Option<&LotlSnapshot>,
        recipient: &RecipientKey,
        payload: &[u8],
    ) -> Result<ProverRun> {
        let variant = self.config.variant;
        let writer = ArtifactWriter::new(&self.config);

        // Stage 1: byte-range digest.
        let byte_range = find_byte_range(pdf_bytes)?;
        let doc_digest = document_digest(pdf_bytes, &byte_range)?;
        writer.write_doc_hash(&doc_digest)?;
        info!(byte_range = %byte_range, doc_hash = %doc_digest, "signed ranges hashed");

        // Stage 2: CMS extraction, with the messageDigest consistency check.
        let cms_der = extract_contents_der(pdf_bytes, &byte_range)?;
        let signer = crate::cms::extract_signer(&cms_der, &doc_digest)?;
        writer.write_signer(&signer)?;

        // Stage 3: local trust-list tree and inclusion evidence.
        let local = self.build_tree(&writer, allow_list.fingerprints(), &signer.fingerprint, false)?;

        // Stage 4: EU trust-list tree, when enabled.
        let eu = match (self.config.eu_trust_enabled, eu_snapshot) {
            (false, _) => None,
            (true, None) => {
                return Err(Error::InvalidWitness(
                    "EU trust enabled but no LOTL snapshot provided".to_string(),
                ))
            }
            (true, Some(snapshot)) => {
                writer.write_eu_snapshot(snapshot)?;
                Some(self.build_tree(
                    &writer,
                    &snapshot.qualified_cas,
                    &signer.fingerprint,
                    true,
                )?)
            }
        };

        // Stage 5: document-bound encryption.
        let artifact = encrypt_artifact(payload, recipient, &doc_digest)?;
        writer.write_artifact(&artifact)?;

        // Stage 6: witness assembly.
        let witness = assemble_witness(variant, &signer, &local, eu.as_ref())?;

        // Stage 7: prove.
        let witness_bytes = self.bridge.execute_witness(&witness)?;
        let proof = self.bridge.prove(variant, &witness_bytes)?;
        let vk = self.bridge.verification_key(variant)?;
        writer.write_proof(&proof, &vk)?;

        // Stage 8: manifest, written last and atomically.
        let manifest = Manifest {
            version: crate::manifest::MANIFEST_VERSION,
            doc_hash: doc_digest.to_hex(),
            artifact: ArtifactRecord {
                kind: "encrypted-file".to_string(),
                artifact_hash: artifact.artifact_hash.to_hex(),
            },
            signer: SignerRecord {
                pub_x: signer.public_key.x_hex(),
                pub_y: signer.public_key.y_hex(),
                fingerprint: signer.fingerprint.to_hex(),
            },
            tl_root: witness.public.tl_root.to_manifest_string(),
            eu_trust: EuTrustRecord {
                enabled: witness.public.eu_trust_enabled,
                tl_root_eu: witness
                    .public
                    .eu_trust_enabled
                    .then(|| witness.public.tl_root_eu.to_manifest_string()),
                eu_index: None,
            },
            proof: {
                use base64::engine::general_purpose::STANDARD as BASE64;
                use base64::Engine;
                BASE64.encode(&proof)
            },
            timestamp: Manifest::timestamp_now(),
        };
        manifest.validate()?;
        writer.write_manifest(&manifest)?;

        Ok(ProverRun {
            doc_digest,
            signer_fingerprint: signer.fingerprint,
            artifact_hash: artifact.artifact_hash,
            manifest,
        })
    }

    /// Builds the variant's tree over `fingerprints`, emits its artefacts,
    /// and returns inclusion evidence for `signer_fpr`.
    ///
    /// A signer absent from the list yields degenerate (zero-path) evidence
    /// under the list's real root, so witness execution fails at the named
    /// inclusion constraint instead of silently proving nothing.
    fn build_tree(
        &self,
        writer: &ArtifactWriter<'_>,
        fingerprints: &[Digest],
        signer_fpr: &Digest,
        eu: bool,
    ) -> Result<TrustEvidence> {
        match self.config.variant {
            StatementVariant::ByteMerkle => {
                let tree = Sha256Tree::build(fingerprints)?;
                writer.write_byte_tree(&tree, fingerprints.len(), eu)?;
                Ok(match tree.index_of(signer_fpr) {
                    Some(index) => TrustEvidence::from_byte_proof(&tree.path(index)),
                    None => TrustEvidence::absent(RootValue::Bytes(tree.root())),
                })
            }
            StatementVariant::FieldMerkle => {
                let tree = PoseidonTree::build(fingerprints)?;
                writer.write_field_tree(&tree, fingerprints.len(), eu)?;
                Ok(match tree.index_of(signer_fpr) {
                    Some(index) => TrustEvidence::from_field_proof(&tree.path(index)),
                    None => TrustEvidence::absent(RootValue::Field(tree.root())),
                })
            }
        }
    }
}
