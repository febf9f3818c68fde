//! Format detection, extraction security policy, platform filesystem glue,
//! and the format-agnostic reader/writer traits that tie `zarc-tar` and
//! `zarc-gzip` together into one archive abstraction.

mod error;
mod extract;
mod format;
mod platform;
mod policy;
mod traits;

pub use error::{ArchiveError, ExitCode, SecurityError};
pub use extract::{extract, read_all_entries, ExtractOptions, ExtractSummary, ExtractWarning};
pub use format::{detect, detect_bytes, detect_extension, Format};
pub use platform::{HostPlatform, Platform};
pub use policy::{
    check_zip_bomb, sanitize_path, sanitize_symlink_target, verify_no_escape, ExtractionPolicy,
    SymlinkPolicy,
};
pub use traits::{AnyArchiveReader, AnyArchiveWriter, ArchiveReader, ArchiveWriter};
