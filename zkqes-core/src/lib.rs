//! Zero-knowledge qualified signature proofs over PDF documents.
//!
//! A prover demonstrates, without revealing the signature value, that a
//! qualified electronic signature over a specific PDF verifies, that the
//! signer's certificate belongs to one or two trust lists, and that a
//! ciphertext delivered alongside the proof is bound to that exact
//! document. A verifier checks the emitted manifest in six ordered steps
//! against locally rebuilt trust-list roots and an opaque proving backend.
//!
//! # Pipeline
//!
//! ```text
//! PDF ──► byte-range digest ──► CMS extraction ──► witness ──► proof
//!              │                     │                ▲
//!              │                     └── certificate ─┤
//!              ├── AES-256-GCM binding (AAD) ─────────┤
//!              └── trust-list Merkle trees ───────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use zkqes::config::PipelineConfig;
//! use zkqes::pipeline::ProofPipeline;
//! use zkqes::trustlist::AllowList;
//!
//! let config = PipelineConfig::default();
//! let allow_list = AllowList::from_path("allowlist.json".as_ref())?;
//! let mut pipeline = ProofPipeline::new(config);
//! let run = pipeline.run(&pdf_bytes, &allow_list, None, &recipient, &payload)?;
//! println!("proof bound to {}", run.doc_digest);
//! ```

pub mod binding;
pub mod cms;
pub mod config;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod merkle;
pub mod outputs;
pub mod pdf;
pub mod pipeline;
pub mod prover;
pub mod statement;
pub mod trustlist;
pub mod verifier;
pub mod witness;

pub use config::PipelineConfig;
pub use digest::Digest;
pub use error::{Error, ErrorCategory, Result};
pub use manifest::Manifest;
pub use pipeline::{ProofPipeline, ProverRun};
pub use statement::StatementVariant;
pub use verifier::verify_proof_bundle;
