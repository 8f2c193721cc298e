//! Document digest over the signed byte ranges.

use sha2::{Digest as Sha2Digest, Sha256};

use super::byte_range::ByteRange;
use crate::digest::Digest;
use crate::error::Result;

/// Hashes `PDF[o1..o1+l1] ‖ PDF[o2..o2+l2]` with SHA-256.
///
/// This is the value a PDF signature actually covers (minus the placeholder
/// gap), and the digest the CMS `messageDigest` attribute must match.
pub fn document_digest(pdf: &[u8], range: &ByteRange) -> Result<Digest> {
    range.check_bounds(pdf.len() as u64)?;
    let mut hasher = Sha256::new();
    let start1 = range.offset1 as usize;
    let start2 = range.offset2 as usize;
    hasher.update(&pdf[start1..start1 + range.length1 as usize]);
    hasher.update(&pdf[start2..start2 + range.length2 as usize]);
    Ok(Digest::from_bytes(hasher.finalize().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_digest_matches_concatenation() {
        let pdf: Vec<u8> = (0u8..=255).collect();
        let range = ByteRange::from_quad(&[0, 100, 150, 50]).unwrap();
        let expected = Digest::sha256_concat(&[&pdf[0..100], &pdf[150..200]]);
        assert_eq!(document_digest(&pdf, &range).unwrap(), expected);
    }

    #[test]
    fn test_digest_excludes_gap() {
        let mut pdf: Vec<u8> = vec![0xaa; 200];
        let range = ByteRange::from_quad(&[0, 100, 150, 50]).unwrap();
        let before = document_digest(&pdf, &range).unwrap();
        // Mutating the placeholder gap must not change the digest.
        pdf[120] = 0xbb;
        assert_eq!(document_digest(&pdf, &range).unwrap(), before);
        // Mutating a covered byte must.
        pdf[50] = 0xbb;
        assert_ne!(document_digest(&pdf, &range).unwrap(), before);
    }

    #[test]
    fn test_digest_offsets_at_file_boundary_accepted() {
        let pdf = vec![0u8; 200];
        let range = ByteRange::from_quad(&[0, 100, 150, 50]).unwrap();
        assert!(document_digest(&pdf, &range).is_ok());
    }

    #[test]
    fn test_digest_out_of_bounds_rejected() {
        let pdf = vec![0u8; 199];
        let range = ByteRange::from_quad(&[0, 100, 150, 50]).unwrap();
        let err = document_digest(&pdf, &range).unwrap_err();
        assert!(matches!(err, Error::RangeOutOfBounds { .. }));
    }
}
