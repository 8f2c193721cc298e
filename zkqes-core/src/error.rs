use thiserror::Error;

/// Crate-wide error type.
///
/// Every fatal condition of the pipeline maps onto exactly one variant, and
/// every variant maps onto one [`ErrorCategory`]. There is no partial-success
/// reporting: the first failing check aborts the run with its variant.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed PDF: {0}")]
    MalformedPdf(String),

    #[error("ByteRange out of bounds: offset {offset} + length {length} > document size {document_size}")]
    RangeOutOfBounds {
        offset: u64,
        length: u64,
        document_size: u64,
    },

    #[error("CMS extraction failed: {0}")]
    Cms(#[from] crate::cms::CmsError),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("Duplicate leaf in trust list: {0}")]
    DuplicateLeaf(String),

    #[error("Trust list capacity exceeded: {count} fingerprints, maximum {max}")]
    CapacityExceeded { count: usize, max: usize },

    #[error("Invalid witness: {0}")]
    InvalidWitness(String),

    #[error("Circuit error: {0}")]
    CircuitError(String),

    #[error("AEAD authentication failed: {0}")]
    AuthFailed(String),

    #[error("Artifact mismatch: computed {computed}, manifest {expected}")]
    ArtifactMismatch { computed: String, expected: String },

    #[error("Trust list divergence: local root {local}, manifest root {manifest}")]
    TrustListDivergence { local: String, manifest: String },

    #[error("EU trust list divergence: local root {local}, manifest root {manifest}")]
    EuTrustListDivergence { local: String, manifest: String },

    #[error("Proof rejected: {0}")]
    ProofInvalid(String),

    #[error("Manifest schema violation: {0}")]
    ManifestSchema(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Abstract failure categories of the pipeline.
///
/// Each category carries a stable single-line tag and a distinct process
/// exit code, so callers can classify failures without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    MalformedInput,
    CryptoMismatch,
    TrustListDivergence,
    ArtifactMismatch,
    ProofInvalid,
    AuthFailed,
    CircuitError,
    Environment,
}

impl ErrorCategory {
    /// Stable single-line tag for user-visible reporting.
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorCategory::MalformedInput => "MalformedInput",
            ErrorCategory::CryptoMismatch => "CryptoMismatch",
            ErrorCategory::TrustListDivergence => "TrustListDivergence",
            ErrorCategory::ArtifactMismatch => "ArtifactMismatch",
            ErrorCategory::ProofInvalid => "ProofInvalid",
            ErrorCategory::AuthFailed => "AuthFailed",
            ErrorCategory::CircuitError => "CircuitError",
            ErrorCategory::Environment => "Environment",
        }
    }

    /// Distinct non-zero exit code per category.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCategory::MalformedInput => 2,
            ErrorCategory::CryptoMismatch => 3,
            ErrorCategory::TrustListDivergence => 4,
            ErrorCategory::ArtifactMismatch => 5,
            ErrorCategory::ProofInvalid => 6,
            ErrorCategory::AuthFailed => 7,
            ErrorCategory::CircuitError => 8,
            ErrorCategory::Environment => 9,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl Error {
    /// Maps this error onto its abstract category.
    pub fn category(&self) -> ErrorCategory {
        use crate::cms::CmsError;
        match self {
            Error::Io(_) => ErrorCategory::Environment,
            Error::Json(_)
            | Error::MalformedPdf(_)
            | Error::RangeOutOfBounds { .. }
            | Error::MalformedXml(_)
            | Error::InvalidFingerprint(_)
            | Error::DuplicateLeaf(_)
            | Error::CapacityExceeded { .. }
            | Error::ManifestSchema(_) => ErrorCategory::MalformedInput,
            Error::Cms(inner) => match inner {
                CmsError::NotSignedData { .. }
                | CmsError::MalformedAsn1 { .. }
                | CmsError::MissingSignedAttributes
                | CmsError::NoCertificate => ErrorCategory::MalformedInput,
                CmsError::UnsupportedAlgorithm { .. } | CmsError::DigestMismatch { .. } => {
                    ErrorCategory::CryptoMismatch
                }
            },
            Error::InvalidWitness(_) => ErrorCategory::CryptoMismatch,
            Error::CircuitError(_) => ErrorCategory::CircuitError,
            Error::AuthFailed(_) => ErrorCategory::AuthFailed,
            Error::ArtifactMismatch { .. } => ErrorCategory::ArtifactMismatch,
            Error::TrustListDivergence { .. } | Error::EuTrustListDivergence { .. } => {
                ErrorCategory::TrustListDivergence
            }
            Error::ProofInvalid(_) => ErrorCategory::ProofInvalid,
        }
    }

    /// Renders the category tag line followed by the diagnostic block.
    pub fn diagnostic(&self) -> String {
        format!("{}\n{}", self.category().tag(), self)
    }
}
