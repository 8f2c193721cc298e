//! Six-step proof verification.
//!
//! Ordered checks over the manifest and local artefacts; the first failing
//! step aborts with its named error and later steps never run. All six must
//! pass for acceptance:
//!
//! 1. load and schema-check the manifest
//! 2. artifact binding (ciphertext package digest)
//! 3. local trust-list root agreement
//! 4. EU trust-list root agreement (when enabled)
//! 5. proof and verification-key loading with size bounds
//! 6. backend proof verification against the reconstructed public inputs

use std::fs;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::prover::ProverBridge;
use crate::statement::{PublicInputs, RootValue, StatementVariant};

/// Upper bound on proof and verification-key sizes; anything larger is
/// rejected before reaching the backend.
pub const MAX_PROOF_BYTES: usize = 1 << 20;
pub const MAX_VK_BYTES: usize = 1 << 20;

/// Outcome of one verification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: &'static str,
    pub detail: String,
}

/// The record of a fully successful verification.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub steps: Vec<StepReport>,
}

impl VerificationReport {
    fn record(&mut self, name: &'static str, detail: impl Into<String>) {
        let detail = detail.into();
        debug!(step = name, detail = %detail, "verification step passed");
        self.steps.push(StepReport { name, detail });
    }
}

/// Runs the six-step verification against the artefacts in
/// `config.out_dir`.
pub fn verify_proof_bundle(
    config: &PipelineConfig,
    bridge: &ProverBridge,
) -> Result<VerificationReport> {
    let mut report = VerificationReport { steps: Vec::new() };

    // Step 1: load manifest.
    let manifest_json = fs::read_to_string(config.manifest_path())?;
    let manifest = Manifest::from_json_str(&manifest_json)?;
    let variant = manifest.infer_variant()?;
    if variant != config.variant {
        return Err(Error::ManifestSchema(format!(
            "manifest roots are {} but verifier is configured for {}",
            variant, config.variant
        )));
    }
    report.record("load-manifest", format!("schema v{} ok", manifest.version));

    // Step 2: artifact binding.
    let package = fs::read(config.encrypted_file_path())?;
    let computed = Digest::sha256(&package);
    if computed.to_hex() != manifest.artifact.artifact_hash.to_lowercase() {
        return Err(Error::ArtifactMismatch {
            computed: computed.to_hex(),
            expected: manifest.artifact.artifact_hash.clone(),
        });
    }
    report.record("artifact-binding", computed.to_hex());

    // Step 3: local trust-list root.
    let local_root = read_root_file(config, variant, false)?;
    let manifest_root = RootValue::parse(variant, &manifest.tl_root)?;
    if local_root != manifest_root {
        return Err(Error::TrustListDivergence {
            local: local_root.to_manifest_string(),
            manifest: manifest.tl_root.clone(),
        });
    }
    report.record("local-root", local_root.to_manifest_string());

    // Step 4: EU trust-list root, when enabled.
    if manifest.eu_trust.enabled {
        let manifest_eu = manifest.eu_trust.tl_root_eu.as_deref().ok_or_else(|| {
            Error::ManifestSchema("eu_trust.enabled without eu_trust.tl_root_eu".to_string())
        })?;
        let local_eu = read_root_file(config, variant, true)?;
        let manifest_eu_root = RootValue::parse(variant, manifest_eu)?;
        if local_eu != manifest_eu_root {
            return Err(Error::EuTrustListDivergence {
                local: local_eu.to_manifest_string(),
                manifest: manifest_eu.to_string(),
            });
        }
        report.record("eu-root", local_eu.to_manifest_string());
    } else {
        info!("EU trust disabled, step skipped");
        report.record("eu-root", "skipped (disabled)");
    }

    // Step 5: load proof and verification key, with sanity bounds.
    let proof = manifest.proof_bytes()?;
    if proof.is_empty() || proof.len() > MAX_PROOF_BYTES {
        return Err(Error::ManifestSchema(format!(
            "proof size {} outside 1..={} bytes",
            proof.len(),
            MAX_PROOF_BYTES
        )));
    }
    let vk = fs::read(config.vkey_path())?;
    if vk.is_empty() || vk.len() > MAX_VK_BYTES {
        return Err(Error::ManifestSchema(format!(
            "verification key size {} outside 1..={} bytes",
            vk.len(),
            MAX_VK_BYTES
        )));
    }
    report.record(
        "load-proof",
        format!("proof {} bytes, vk {} bytes", proof.len(), vk.len()),
    );

    // Step 6: backend verification against the public inputs reconstructed
    // from the manifest and local artefacts, in declared order.
    let public_inputs = reconstruct_public_inputs(config, &manifest, variant)?;
    let accepted = bridge.verify(&vk, &proof, &public_inputs.to_canonical_bytes())?;
    if !accepted {
        return Err(Error::ProofInvalid(
            "backend verifier rejected the proof".to_string(),
        ));
    }
    report.record("verify-proof", "accepted");
    info!("all six verification steps passed");
    Ok(report)
}

/// Reads and canonicalizes a locally-built root file.
fn read_root_file(
    config: &PipelineConfig,
    variant: StatementVariant,
    eu: bool,
) -> Result<RootValue> {
    let path = if eu {
        config.eu_root_path()
    } else {
        config.local_root_path()
    };
    let text = fs::read_to_string(&path)?;
    RootValue::parse(variant, text.trim())
}

/// Rebuilds the statement's public-input tuple from the manifest and local
/// artefacts.
///
/// The message input (`doc_hash` in the statement's naming) is the
/// signed-attributes digest, which the manifest does not carry; it is read
/// from the locally emitted `VERIFIED_signed_attrs_hash.bin`.
fn reconstruct_public_inputs(
    config: &PipelineConfig,
    manifest: &Manifest,
    variant: StatementVariant,
) -> Result<PublicInputs> {
    let attrs_hash_bytes = fs::read(config.signed_attrs_hash_path())?;
    let doc_hash = Digest::from_slice(&attrs_hash_bytes).map_err(|_| {
        Error::ManifestSchema(format!(
            "signed-attributes hash file must hold 32 bytes, got {}",
            attrs_hash_bytes.len()
        ))
    })?;

    let signer_fpr = Digest::from_hex(&manifest.signer.fingerprint)?;
    let tl_root_eu = match (manifest.eu_trust.enabled, &manifest.eu_trust.tl_root_eu) {
        (true, Some(root)) => RootValue::parse(variant, root)?,
        _ => RootValue::from_digest(variant, &Digest::ZERO),
    };

    Ok(PublicInputs {
        doc_hash,
        pub_key_x: parse_coordinate("signer.pub_x", &manifest.signer.pub_x)?,
        pub_key_y: parse_coordinate("signer.pub_y", &manifest.signer.pub_y)?,
        signer_fpr: RootValue::from_digest(variant, &signer_fpr),
        tl_root: RootValue::parse(variant, &manifest.tl_root)?,
        eu_trust_enabled: manifest.eu_trust.enabled,
        tl_root_eu,
    })
}

fn parse_coordinate(field: &str, hex_str: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| Error::ManifestSchema(format!("{} is not hex: {}", field, e)))?;
    bytes.try_into().map_err(|_| {
        Error::ManifestSchema(format!("{} must be 32 bytes", field))
    })
}
