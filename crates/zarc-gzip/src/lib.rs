//! RFC 1952 gzip container support: header/footer framing and CRC-32 over a
//! `zarc-deflate`-produced (or `flate2`-decoded) payload.

mod crc32;
mod error;
mod header;

pub use crc32::Crc32;
pub use error::GzipError;
pub use header::{host_os_byte, GzHeader};

use std::io::{self, Read, Write};

/// Compress `data` into a single complete gzip member at the given level.
pub fn compress(data: &[u8], level: u8) -> Result<Vec<u8>, GzipError> {
    let mut out = Vec::new();
    let mut w = GzipWriter::new(&mut out, level, GzHeader::new())?;
    w.write_all(data)?;
    w.finish()?;
    Ok(out)
}

/// Decompress a single complete gzip member, verifying CRC-32 and ISIZE.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, GzipError> {
    let mut r = GzipReader::new(data)?;
    let mut out = Vec::new();
    r.read_to_end(&mut out)?;
    Ok(out)
}

/// Streaming gzip writer. Buffers written bytes and performs compression on
/// `finish()`, since the underlying encoder operates over a complete buffer
/// rather than incrementally.
pub struct GzipWriter<W: Write> {
    inner: W,
    level: u8,
    header: GzHeader,
    buffer: Vec<u8>,
    header_written: bool,
}

impl<W: Write> GzipWriter<W> {
    pub fn new(inner: W, level: u8, header: GzHeader) -> Result<Self, GzipError> {
        Ok(Self {
            inner,
            level,
            header,
            buffer: Vec::new(),
            header_written: false,
        })
    }

    /// Flush the header, compress everything written so far, and write the
    /// compressed body and footer. Consumes the writer's inner sink state so
    /// it cannot be written to again.
    pub fn finish(mut self) -> Result<W, GzipError> {
        if !self.header_written {
            self.header.write_to(&mut self.inner, self.level)?;
            self.header_written = true;
        }

        let mut crc = crc32::Crc32::new();
        crc.update(&self.buffer);
        let isize = (self.buffer.len() as u64 & 0xFFFF_FFFF) as u32;

        tracing::debug!(bytes = self.buffer.len(), level = self.level, "gzip: compressing member");
        let compressed = zarc_deflate::compress(&self.buffer, self.level)
            .expect("level was validated at construction");
        self.inner.write_all(&compressed)?;
        header::write_footer(&mut self.inner, &crc, isize)?;

        Ok(self.inner)
    }
}

impl<W: Write> Write for GzipWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Streaming gzip reader. Parses the header eagerly, then decodes the
/// DEFLATE body lazily via `flate2`, verifying CRC-32/ISIZE once the body is
/// fully consumed.
///
/// The DEFLATE layer is built on `flate2::bufread::DeflateDecoder` over a
/// `BufReader` we keep ownership of (rather than `flate2::read::DeflateDecoder`,
/// whose `get_mut()` drills straight through to the raw reader): the
/// bufread decoder only ever consumes what it needs from the buffer it was
/// given, so any bytes `BufReader` already pulled ahead of the DEFLATE
/// stream's end stay reachable through that same handle when the footer is
/// read afterward. Going through the raw reader directly would skip those
/// already-buffered bytes for any member smaller than the buffer's capacity.
pub struct GzipReader<R: Read> {
    inner: flate2::bufread::DeflateDecoder<io::BufReader<R>>,
    header: GzHeader,
    crc: crc32::Crc32,
    count: u64,
    verified: bool,
}

impl<R: Read> GzipReader<R> {
    pub fn new(mut r: R) -> Result<Self, GzipError> {
        let header = GzHeader::read_from(&mut r)?;
        Ok(Self {
            inner: flate2::bufread::DeflateDecoder::new(io::BufReader::new(r)),
            header,
            crc: crc32::Crc32::new(),
            count: 0,
            verified: false,
        })
    }

    pub fn header(&self) -> &GzHeader {
        &self.header
    }

    fn verify_footer(&mut self) -> Result<(), GzipError> {
        if self.verified {
            return Ok(());
        }
        let r = self.inner.get_mut();
        let mut footer = [0u8; 8];
        r.read_exact(&mut footer).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                GzipError::TruncatedHeader
            } else {
                GzipError::Io(e)
            }
        })?;

        let expected_crc = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
        let expected_size = u32::from_le_bytes([footer[4], footer[5], footer[6], footer[7]]);
        let actual_crc = self.crc.finalize();
        let actual_size = (self.count & 0xFFFF_FFFF) as u32;

        if actual_crc != expected_crc {
            return Err(GzipError::CrcMismatch {
                expected: expected_crc,
                actual: actual_crc,
            });
        }
        if actual_size != expected_size {
            return Err(GzipError::SizeMismatch {
                expected: expected_size,
                actual: actual_size,
            });
        }

        self.verified = true;
        Ok(())
    }
}

impl<R: Read> Read for GzipReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.verify_footer()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            return Ok(0);
        }
        self.crc.update(&buf[..n]);
        self.count += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_round_trips() {
        let compressed = compress(&[], 6).unwrap();
        assert_eq!(decompress(&compressed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn round_trips_repeating_pattern() {
        let data = b"ABAB".repeat(1000);
        for level in [0u8, 1, 6, 9] {
            let compressed = compress(&data, level).unwrap();
            assert_eq!(decompress(&compressed).unwrap(), data);
        }
    }

    #[test]
    fn magic_bytes_are_present() {
        let compressed = compress(b"hi", 6).unwrap();
        assert_eq!(&compressed[0..2], &[0x1f, 0x8b]);
        assert_eq!(compressed[2], 8);
    }

    #[test]
    fn corrupted_crc_is_rejected() {
        let mut compressed = compress(b"some test data here", 6).unwrap();
        let len = compressed.len();
        compressed[len - 8] ^= 0xFF;
        let err = decompress(&compressed).unwrap_err();
        assert!(matches!(err, GzipError::CrcMismatch { .. }));
    }

    #[test]
    fn header_with_filename_survives_round_trip() {
        let mut out = Vec::new();
        let header = GzHeader {
            filename: Some(b"notes.txt".to_vec()),
            ..GzHeader::new()
        };
        let mut w = GzipWriter::new(&mut out, 6, header).unwrap();
        w.write_all(b"payload").unwrap();
        w.finish().unwrap();

        let mut r = GzipReader::new(&out[..]).unwrap();
        assert_eq!(r.header().filename.as_deref(), Some(&b"notes.txt"[..]));
        let mut data = Vec::new();
        r.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"payload");
    }
}
