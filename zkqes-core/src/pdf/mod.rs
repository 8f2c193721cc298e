//! Signed-range extraction from PDF documents.
//!
//! The signature dictionary's `/ByteRange` names the exact bytes the CMS
//! signature covers; the gap between the two ranges is the placeholder
//! region holding the hex-encoded CMS blob (`/Contents`). This module scans
//! for both by literal token, independent of cross-reference health, and
//! hashes the covered ranges.

mod byte_range;
mod digest;
mod scan;

pub use byte_range::ByteRange;
pub use digest::document_digest;
pub use scan::{extract_contents_der, find_byte_range};
