//! Literal-token scanning for `/ByteRange` and `/Contents`.

use super::byte_range::ByteRange;
use crate::error::{Error, Result};

const BYTE_RANGE_TOKEN: &[u8] = b"/ByteRange";

/// PDF whitespace per ISO 32000: NUL, HT, LF, FF, CR, SP.
fn is_pdf_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && is_pdf_whitespace(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn find_token(bytes: &[u8], token: &[u8]) -> Option<usize> {
    bytes.windows(token.len()).position(|w| w == token)
}

fn parse_integer(bytes: &[u8], pos: usize) -> Result<(i64, usize)> {
    let mut end = pos;
    if end < bytes.len() && bytes[end] == b'-' {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == pos || (bytes[pos] == b'-' && end == pos + 1) {
        return Err(Error::MalformedPdf(format!(
            "expected integer in /ByteRange array at offset {}",
            pos
        )));
    }
    let text = std::str::from_utf8(&bytes[pos..end])
        .expect("digits and minus sign are valid UTF-8");
    let value = text.parse::<i64>().map_err(|e| {
        Error::MalformedPdf(format!("/ByteRange integer {:?} out of range: {}", text, e))
    })?;
    Ok((value, end))
}

/// Locates the first `/ByteRange [o1 l1 o2 l2]` in the document and parses
/// the quadruple, tolerating arbitrary whitespace between tokens.
pub fn find_byte_range(pdf: &[u8]) -> Result<ByteRange> {
    let token_pos = find_token(pdf, BYTE_RANGE_TOKEN)
        .ok_or_else(|| Error::MalformedPdf("no /ByteRange entry found".to_string()))?;

    let mut pos = skip_whitespace(pdf, token_pos + BYTE_RANGE_TOKEN.len());
    if pos >= pdf.len() || pdf[pos] != b'[' {
        return Err(Error::MalformedPdf(
            "expected '[' after /ByteRange".to_string(),
        ));
    }
    pos += 1;

    let mut values = [0i64; 4];
    for value in &mut values {
        pos = skip_whitespace(pdf, pos);
        let (parsed, next) = parse_integer(pdf, pos)?;
        *value = parsed;
        pos = next;
    }

    pos = skip_whitespace(pdf, pos);
    if pos >= pdf.len() || pdf[pos] != b']' {
        return Err(Error::MalformedPdf(
            "expected ']' closing the /ByteRange array".to_string(),
        ));
    }

    ByteRange::from_quad(&values)
}

/// Extracts the DER-encoded CMS blob from the placeholder gap between the
/// two signed ranges.
///
/// The gap holds the `/Contents <…>` hex string, typically padded with
/// trailing zero bytes up to the reserved width. The hex is decoded
/// (whitespace tolerated) and truncated to the length the DER header
/// declares, which discards the padding.
pub fn extract_contents_der(pdf: &[u8], range: &ByteRange) -> Result<Vec<u8>> {
    range.check_bounds(pdf.len() as u64)?;
    let gap_start = range.gap_start() as usize;
    let gap_end = range.gap_end() as usize;
    if gap_start >= gap_end {
        return Err(Error::MalformedPdf(
            "no placeholder gap between signed ranges".to_string(),
        ));
    }
    let gap = &pdf[gap_start..gap_end];

    let open = gap
        .iter()
        .position(|b| *b == b'<')
        .ok_or_else(|| Error::MalformedPdf("no '<' in /Contents placeholder".to_string()))?;
    let close = gap[open..]
        .iter()
        .position(|b| *b == b'>')
        .map(|p| open + p)
        .ok_or_else(|| Error::MalformedPdf("unterminated /Contents hex string".to_string()))?;

    let mut hex_chars = Vec::with_capacity(close - open - 1);
    for b in &gap[open + 1..close] {
        if is_pdf_whitespace(*b) {
            continue;
        }
        if !b.is_ascii_hexdigit() {
            return Err(Error::MalformedPdf(format!(
                "non-hex byte 0x{:02x} in /Contents string",
                b
            )));
        }
        hex_chars.push(*b);
    }
    if hex_chars.len() % 2 != 0 {
        return Err(Error::MalformedPdf(
            "odd-length /Contents hex string".to_string(),
        ));
    }
    let decoded = hex::decode(&hex_chars)
        .map_err(|e| Error::MalformedPdf(format!("invalid /Contents hex: {}", e)))?;

    let der_len = der_total_len(&decoded)?;
    if der_len > decoded.len() {
        return Err(Error::MalformedPdf(format!(
            "DER length {} exceeds /Contents payload {}",
            der_len,
            decoded.len()
        )));
    }
    Ok(decoded[..der_len].to_vec())
}

/// Total encoded length (header + content) of the DER value starting at
/// `bytes[0]`. Handles definite short and long form lengths.
fn der_total_len(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < 2 {
        return Err(Error::MalformedPdf(
            "/Contents payload too short for DER".to_string(),
        ));
    }
    let first_len = bytes[1];
    if first_len < 0x80 {
        return Ok(2 + first_len as usize);
    }
    let num_len_bytes = (first_len & 0x7f) as usize;
    if num_len_bytes == 0 || num_len_bytes > 8 || bytes.len() < 2 + num_len_bytes {
        return Err(Error::MalformedPdf(
            "invalid DER length encoding in /Contents".to_string(),
        ));
    }
    let mut content_len: usize = 0;
    for b in &bytes[2..2 + num_len_bytes] {
        content_len = content_len
            .checked_mul(256)
            .and_then(|v| v.checked_add(*b as usize))
            .ok_or_else(|| Error::MalformedPdf("DER length overflow".to_string()))?;
    }
    Ok(2 + num_len_bytes + content_len)
}
