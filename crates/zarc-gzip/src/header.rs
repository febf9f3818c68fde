//! RFC 1952 §2.3 member header and §2.2 footer.

use std::io::{self, Read, Write};

use crate::crc32::Crc32;
use crate::error::GzipError;

const MAGIC: [u8; 2] = [0x1f, 0x8b];
const CM_DEFLATE: u8 = 8;

const FTEXT: u8 = 0x01;
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;

const OS_UNKNOWN: u8 = 255;

/// The gzip header OS byte (RFC 1952 §2.3.1) for the platform this binary
/// was built for.
pub fn host_os_byte() -> u8 {
    if cfg!(target_os = "macos") {
        7 // Macintosh
    } else if cfg!(target_os = "windows") {
        11 // NTFS
    } else if cfg!(unix) {
        3 // Unix
    } else {
        OS_UNKNOWN
    }
}

/// Metadata carried in a gzip member header, independent of the compressed
/// payload itself.
#[derive(Clone, Debug, Default)]
pub struct GzHeader {
    pub mtime: u32,
    pub os: u8,
    pub is_text: bool,
    pub extra: Option<Vec<u8>>,
    pub filename: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
}

impl GzHeader {
    pub fn new() -> Self {
        Self {
            mtime: 0,
            os: OS_UNKNOWN,
            is_text: false,
            extra: None,
            filename: None,
            comment: None,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W, level: u8) -> io::Result<()> {
        let mut flg = 0u8;
        if self.is_text {
            flg |= FTEXT;
        }
        if self.extra.is_some() {
            flg |= FEXTRA;
        }
        if self.filename.is_some() {
            flg |= FNAME;
        }
        if self.comment.is_some() {
            flg |= FCOMMENT;
        }

        let xfl = match level {
            9 => 2,
            0 | 1 => 4,
            _ => 0,
        };

        let mut header = Vec::with_capacity(10);
        header.extend_from_slice(&MAGIC);
        header.push(CM_DEFLATE);
        header.push(flg);
        header.extend_from_slice(&self.mtime.to_le_bytes());
        header.push(xfl);
        header.push(self.os);

        if let Some(extra) = &self.extra {
            header.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            header.extend_from_slice(extra);
        }
        if let Some(name) = &self.filename {
            header.extend_from_slice(name);
            header.push(0);
        }
        if let Some(comment) = &self.comment {
            header.extend_from_slice(comment);
            header.push(0);
        }

        w.write_all(&header)?;

        if flg & FHCRC != 0 {
            let crc16 = (crate::crc32::checksum(&header) & 0xFFFF) as u16;
            w.write_all(&crc16.to_le_bytes())?;
        }

        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, GzipError> {
        let mut fixed = [0u8; 10];
        r.read_exact(&mut fixed).map_err(map_eof)?;

        if fixed[0..2] != MAGIC {
            return Err(GzipError::BadMagic);
        }
        let cm = fixed[2];
        if cm != CM_DEFLATE {
            return Err(GzipError::UnsupportedMethod(cm));
        }
        let flg = fixed[3];
        let mtime = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let os = fixed[9];

        let mut header_bytes = fixed.to_vec();

        let extra = if flg & FEXTRA != 0 {
            let mut len_buf = [0u8; 2];
            r.read_exact(&mut len_buf).map_err(map_eof)?;
            header_bytes.extend_from_slice(&len_buf);
            let len = u16::from_le_bytes(len_buf) as usize;
            let mut data = vec![0u8; len];
            r.read_exact(&mut data).map_err(map_eof)?;
            header_bytes.extend_from_slice(&data);
            Some(data)
        } else {
            None
        };

        let filename = if flg & FNAME != 0 {
            Some(read_cstring(r, &mut header_bytes)?)
        } else {
            None
        };

        let comment = if flg & FCOMMENT != 0 {
            Some(read_cstring(r, &mut header_bytes)?)
        } else {
            None
        };

        if flg & FHCRC != 0 {
            let mut crc16 = [0u8; 2];
            r.read_exact(&mut crc16).map_err(map_eof)?;
            let expected = u16::from_le_bytes(crc16);
            let actual = (crate::crc32::checksum(&header_bytes) & 0xFFFF) as u16;
            if expected != actual {
                return Err(GzipError::HeaderChecksumMismatch);
            }
        }

        Ok(Self {
            mtime,
            os,
            is_text: flg & FTEXT != 0,
            extra,
            filename,
            comment,
        })
    }
}

fn read_cstring<R: Read>(r: &mut R, header_bytes: &mut Vec<u8>) -> Result<Vec<u8>, GzipError> {
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        r.read_exact(&mut byte).map_err(map_eof)?;
        header_bytes.push(byte[0]);
        if byte[0] == 0 {
            break;
        }
        out.push(byte[0]);
    }
    Ok(out)
}

fn map_eof(e: io::Error) -> GzipError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        GzipError::TruncatedHeader
    } else {
        GzipError::Io(e)
    }
}

pub fn write_footer<W: Write>(w: &mut W, crc: &Crc32, isize: u32) -> io::Result<()> {
    w.write_all(&crc.finalize().to_le_bytes())?;
    w.write_all(&isize.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_header() {
        let header = GzHeader {
            mtime: 12345,
            os: 3,
            ..GzHeader::new()
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf, 6).unwrap();

        let mut cursor = &buf[..];
        let parsed = GzHeader::read_from(&mut cursor).unwrap();
        assert_eq!(parsed.mtime, 12345);
        assert_eq!(parsed.os, 3);
        assert!(parsed.filename.is_none());
    }

    #[test]
    fn round_trips_header_with_name_and_comment() {
        let header = GzHeader {
            mtime: 0,
            os: OS_UNKNOWN,
            filename: Some(b"hello.txt".to_vec()),
            comment: Some(b"a test file".to_vec()),
            ..GzHeader::new()
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf, 1).unwrap();

        let mut cursor = &buf[..];
        let parsed = GzHeader::read_from(&mut cursor).unwrap();
        assert_eq!(parsed.filename.unwrap(), b"hello.txt");
        assert_eq!(parsed.comment.unwrap(), b"a test file");
    }

    #[test]
    fn rejects_bad_magic() {
        let buf = [0u8; 10];
        let mut cursor = &buf[..];
        assert!(matches!(GzHeader::read_from(&mut cursor), Err(GzipError::BadMagic)));
    }
}
