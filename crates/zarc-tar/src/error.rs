use thiserror::Error;

#[derive(Debug, Error)]
pub enum TarError {
    #[error("truncated tar header block")]
    TruncatedHeader,
    #[error("header checksum mismatch (expected {expected:o}, computed {actual:o})")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("corrupted tar header: {0}")]
    CorruptedHeader(String),
    #[error("invalid octal field in tar header: {0:?}")]
    InvalidOctalField(Vec<u8>),
    #[error("path {0:?} is too long to encode without GNU long-name support")]
    PathTooLong(String),
    #[error("unsupported or malformed GNU long-name/long-link entry")]
    MalformedLongName,
    #[error("GNU long-name/long-link payload of {0} bytes exceeds the 16 MiB defensive limit")]
    LongNameTooLarge(u64),
    #[error("entry data exceeds the declared size")]
    DataOverrun,
    #[error("archive ended before entry data was fully read ({remaining} bytes remaining)")]
    IncompleteArchive { remaining: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
