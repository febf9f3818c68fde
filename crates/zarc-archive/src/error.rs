//! The error taxonomy consumed by the CLI's exit-code table (spec §6/§7).
//!
//! Sub-crate errors (`zarc_tar::TarError`, `zarc_gzip::GzipError`) are
//! wrapped rather than flattened: callers that only care about the kinds
//! listed in §7 can match on `ArchiveError::exit_code()`, while callers
//! that want the precise sub-error can still downcast via `source()`.

use thiserror::Error;

/// Security-policy violations raised by the extraction orchestrator
/// (spec §7 "Security kinds").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("absolute path {0:?} is not allowed by the extraction policy")]
    AbsolutePathNotAllowed(String),
    #[error("path {0:?} attempts to traverse outside the extraction destination")]
    PathTraversalAttempt(String),
    #[error("entry {0:?} is a symlink and the extraction policy forbids symlinks")]
    SymlinkNotAllowed(String),
    #[error("symlink {0:?} has an absolute target, which the extraction policy forbids")]
    AbsoluteSymlinkNotAllowed(String),
    #[error("symlink {entry:?} resolves to {target:?}, which escapes the extraction destination")]
    SymlinkEscapeAttempt { entry: String, target: String },
    #[error("entry {path:?} ({size} bytes) exceeds the {limit}-byte per-file size limit")]
    FileSizeExceedsLimit { path: String, size: u64, limit: u64 },
    #[error("cumulative extracted size {total} bytes exceeds the {limit}-byte total size limit")]
    TotalSizeExceedsLimit { total: u64, limit: u64 },
    #[error("compression ratio {ratio:.1}x exceeds the {limit:.1}x suspicious-ratio limit")]
    SuspiciousCompressionRatio { ratio: f64, limit: f64 },
    #[error("path {0:?} contains a NUL byte")]
    NullByteInPath(String),
    #[error("path {0:?} exceeds the maximum path length")]
    PathTooLong(String),
    #[error("path {0:?} contains a character the destination filesystem cannot represent")]
    InvalidCharacterInPath(String),
}

/// The top-level error type the CLI matches against to pick an exit code.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("could not determine the archive format for {0:?}")]
    UnsupportedFormat(String),
    #[error("detected format {0:?} is recognized but not supported for decoding")]
    UnsupportedCompressionMethod(String),
    #[error("archive entry data ended unexpectedly")]
    IncompleteArchive,
    #[error("security policy violation: {0}")]
    Security(#[from] SecurityError),
    #[error(transparent)]
    Tar(#[from] zarc_tar::TarError),
    #[error(transparent)]
    Gzip(#[from] zarc_gzip::GzipError),
    #[error(transparent)]
    Deflate(#[from] zarc_deflate::DeflateError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// CLI exit codes per spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ArgumentError = 2,
    FileNotFound = 3,
    PermissionDenied = 4,
    CorruptedArchive = 5,
    UnsupportedFormat = 6,
}

impl ArchiveError {
    /// Map this error to the exit code the CLI should terminate with.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ArchiveError::FileNotFound(_) => ExitCode::FileNotFound,
            ArchiveError::PermissionDenied(_) => ExitCode::PermissionDenied,
            ArchiveError::UnsupportedFormat(_) | ArchiveError::UnsupportedCompressionMethod(_) => {
                ExitCode::UnsupportedFormat
            }
            ArchiveError::IncompleteArchive => ExitCode::CorruptedArchive,
            ArchiveError::Security(_) => ExitCode::GeneralError,
            ArchiveError::Tar(_) => ExitCode::CorruptedArchive,
            ArchiveError::Gzip(e) => match e {
                zarc_gzip::GzipError::BadMagic
                | zarc_gzip::GzipError::UnsupportedMethod(_) => ExitCode::UnsupportedFormat,
                zarc_gzip::GzipError::CrcMismatch { .. }
                | zarc_gzip::GzipError::SizeMismatch { .. }
                | zarc_gzip::GzipError::TruncatedHeader
                | zarc_gzip::GzipError::HeaderChecksumMismatch => ExitCode::CorruptedArchive,
                zarc_gzip::GzipError::Io(io) => io_exit_code(io),
            },
            ArchiveError::Deflate(_) => ExitCode::GeneralError,
            ArchiveError::Io(io) => io_exit_code(io),
        }
    }

    /// The three-line user-visible rendering the CLI's error path prints:
    /// what failed, why, and a suggestion (spec §7).
    pub fn render(&self, context: &str) -> String {
        let (why, suggestion) = self.why_and_suggestion();
        format!("error: {context} failed\n  cause: {why}\n  suggestion: {suggestion}")
    }

    fn why_and_suggestion(&self) -> (String, &'static str) {
        match self {
            ArchiveError::FileNotFound(p) => {
                (format!("{p} does not exist"), "check the path and try again")
            }
            ArchiveError::PermissionDenied(p) => (
                format!("insufficient permissions to access {p}"),
                "check file ownership and permissions, or re-run with elevated privileges",
            ),
            ArchiveError::UnsupportedFormat(p) => (
                format!("{p} is not a recognized archive format"),
                "pass --format explicitly or verify the file is not corrupted",
            ),
            ArchiveError::UnsupportedCompressionMethod(name) => (
                format!("{name} archives are not supported by this build"),
                "re-extract with a tool that supports this format, then re-compress as tar.gz",
            ),
            ArchiveError::IncompleteArchive => (
                "the archive ended before all entry data was read".to_string(),
                "the archive is truncated; re-download or re-create it",
            ),
            ArchiveError::Security(e) => (e.to_string(), "inspect the archive contents before extracting with a relaxed policy"),
            ArchiveError::Tar(e) => (e.to_string(), "the archive's tar structure is corrupted; try `zarc test` for details"),
            ArchiveError::Gzip(e) => (e.to_string(), "the gzip stream is corrupted or truncated"),
            ArchiveError::Deflate(e) => (e.to_string(), "re-run with a valid compression level (0..=9)"),
            ArchiveError::Io(e) => (e.to_string(), "check disk space and filesystem permissions"),
        }
    }
}

fn io_exit_code(e: &std::io::Error) -> ExitCode {
    match e.kind() {
        std::io::ErrorKind::NotFound => ExitCode::FileNotFound,
        std::io::ErrorKind::PermissionDenied => ExitCode::PermissionDenied,
        _ => ExitCode::GeneralError,
    }
}
