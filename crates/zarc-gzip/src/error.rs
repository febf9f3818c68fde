use thiserror::Error;

#[derive(Debug, Error)]
pub enum GzipError {
    #[error("not a gzip stream (bad magic bytes)")]
    BadMagic,
    #[error("unsupported compression method {0} (only DEFLATE/8 is supported)")]
    UnsupportedMethod(u8),
    #[error("truncated gzip header")]
    TruncatedHeader,
    #[error("header CRC16 mismatch")]
    HeaderChecksumMismatch,
    #[error("CRC-32 mismatch: stream says {expected:#010x}, computed {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },
    #[error("ISIZE mismatch: stream says {expected}, decompressed {actual} bytes")]
    SizeMismatch { expected: u32, actual: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
