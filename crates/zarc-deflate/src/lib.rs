//! A pure RFC 1951 DEFLATE encoder: LZ77 matching, canonical Huffman coding,
//! and LSB-first bit packing, with no dependency on a system zlib.
//!
//! Decoding is intentionally out of scope here; callers that need to read
//! DEFLATE streams back (including this crate's own tests) use `flate2`.

mod bitwriter;
mod encoder;
mod huffman;
mod lz77;
mod tables;
mod token;

pub use token::Token;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeflateError {
    #[error("compression level {0} is out of range (expected 0..=9)")]
    InvalidLevel(u8),
}

/// Compress `data` at the given level (0 = stored only, 1 = fastest, 9 =
/// best/slowest). Returns a complete, self-terminating DEFLATE stream.
pub fn compress(data: &[u8], level: u8) -> Result<Vec<u8>, DeflateError> {
    if level > 9 {
        return Err(DeflateError::InvalidLevel(level));
    }
    tracing::debug!(input_len = data.len(), level, "deflate: compressing");
    let out = encoder::compress(data, level);
    tracing::trace!(output_len = out.len(), "deflate: compressed");
    Ok(out)
}

/// Expose the LZ77 tokenizer for crates (like `zarc-gzip`) that want to
/// report compression statistics without re-deriving them.
pub fn tokenize(data: &[u8], level: u8) -> Vec<Token> {
    lz77::find_matches(data, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_level() {
        assert!(matches!(compress(b"x", 10), Err(DeflateError::InvalidLevel(10))));
    }

    #[test]
    fn accepts_boundary_levels() {
        assert!(compress(b"x", 0).is_ok());
        assert!(compress(b"x", 9).is_ok());
    }
}
