//! Bridge to an opaque proving backend.
//!
//! The backend is a collaborator: it compiles a statement into a circuit
//! artefact, executes witnesses against it, and produces/checks proofs.
//! The bridge owns the policy around it: compilation artefacts are cached
//! per statement variant, witness-execution failures invalidate the cache,
//! and `prove` is retried at most once.

mod native;

pub use native::NativeBackend;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::statement::{StatementDescriptor, StatementVariant};
use crate::witness::WitnessBundle;

/// A compiled circuit, opaque to everything but its backend.
#[derive(Debug, Clone)]
pub struct CircuitArtifact {
    pub descriptor: StatementDescriptor,
    pub bytes: Vec<u8>,
}

/// The interface a proving backend must obey.
///
/// `execute_witness` fails deterministically when a constraint does not
/// hold, naming the constraint where possible. `verify` returns `Ok(false)`
/// for a well-formed but invalid proof; `Err` is reserved for malformed
/// inputs.
pub trait ProvingBackend {
    fn compile(&self, statement: &StatementDescriptor) -> Result<CircuitArtifact>;

    fn execute_witness(
        &self,
        artifact: &CircuitArtifact,
        inputs: &WitnessBundle,
    ) -> Result<Vec<u8>>;

    fn prove(&self, artifact: &CircuitArtifact, witness_bytes: &[u8]) -> Result<Vec<u8>>;

    fn verification_key(&self, artifact: &CircuitArtifact) -> Result<Vec<u8>>;

    fn verify(&self, vk: &[u8], proof: &[u8], public_inputs: &[u8]) -> Result<bool>;
}

/// Drives a [`ProvingBackend`] with caching and retry policy.
pub struct ProverBridge {
    backend: Box<dyn ProvingBackend>,
    cache: HashMap<StatementVariant, CircuitArtifact>,
}

impl ProverBridge {
    pub fn new(backend: Box<dyn ProvingBackend>) -> Self {
        ProverBridge {
            backend,
            cache: HashMap::new(),
        }
    }

    /// Bridge over the in-repo reference backend.
    pub fn native() -> Self {
        Self::new(Box::new(NativeBackend::new()))
    }

    fn ensure_compiled(&mut self, variant: StatementVariant) -> Result<()> {
        if self.cache.contains_key(&variant) {
            return Ok(());
        }
        debug!(variant = %variant, "compiling statement");
        let artifact = self.backend.compile(&StatementDescriptor::new(variant))?;
        self.cache.insert(variant, artifact);
        Ok(())
    }

    /// Executes the witness against the (cached) circuit. A failure
    /// invalidates the cached artefact for this variant.
    pub fn execute_witness(&mut self, witness: &WitnessBundle) -> Result<Vec<u8>> {
        let variant = witness.variant();
        self.ensure_compiled(variant)?;
        let result = self.backend.execute_witness(&self.cache[&variant], witness);
        if result.is_err() {
            self.cache.remove(&variant);
        }
        result
    }

    /// Produces a proof, retrying once on failure.
    pub fn prove(&mut self, variant: StatementVariant, witness_bytes: &[u8]) -> Result<Vec<u8>> {
        self.ensure_compiled(variant)?;
        let artifact = &self.cache[&variant];
        match self.backend.prove(artifact, witness_bytes) {
            Ok(proof) => Ok(proof),
            Err(first) => {
                warn!(variant = %variant, error = %first, "prove failed, retrying once");
                self.backend.prove(artifact, witness_bytes)
            }
        }
    }

    pub fn verification_key(&mut self, variant: StatementVariant) -> Result<Vec<u8>> {
        self.ensure_compiled(variant)?;
        self.backend.verification_key(&self.cache[&variant])
    }

    /// Delegates to the backend's verifier; needs no circuit artefact.
    pub fn verify(&self, vk: &[u8], proof: &[u8], public_inputs: &[u8]) -> Result<bool> {
        self.backend.verify(vk, proof, public_inputs)
    }
}
