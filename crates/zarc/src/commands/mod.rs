//! Command dispatch plumbing shared by every subcommand: archive-format
//! sniffing, the `CommandError` the binary's error path renders, and small
//! helpers each command reuses.

pub mod compress;
pub mod extract;
pub mod info;
pub mod list;

use std::io::Read;
use std::path::Path;

use thiserror::Error;

use zarc_archive::{AnyArchiveReader, ArchiveError, ArchiveReader, Format};

/// Everything that can stop a subcommand before it exits successfully. Kept
/// distinct from `zarc_archive::ArchiveError` so argument-validation
/// mistakes (a malformed glob, an out-of-range level) get their own exit
/// code instead of being forced into the archive error taxonomy.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{context} failed: {error}")]
    Archive { context: String, error: ArchiveError },
    #[error("invalid arguments: {0}")]
    Argument(String),
}

impl CommandError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Archive { error, .. } => error.exit_code() as i32,
            CommandError::Argument(_) => 2,
        }
    }

    pub fn render(&self) -> String {
        match self {
            CommandError::Archive { context, error } => error.render(context),
            CommandError::Argument(msg) => format!(
                "error: invalid arguments\n  cause: {msg}\n  suggestion: check `zarc <subcommand> --help`"
            ),
        }
    }
}

/// Attaches a human-readable "what were we doing" context to an
/// `ArchiveError`, matching `ArchiveError::render`'s three-line format.
pub trait ArchiveContext<T> {
    fn context(self, ctx: &str) -> Result<T, CommandError>;
}

impl<T> ArchiveContext<T> for Result<T, ArchiveError> {
    fn context(self, ctx: &str) -> Result<T, CommandError> {
        self.map_err(|error| CommandError::Archive { context: ctx.to_string(), error })
    }
}

pub fn io_err(path: &Path, e: std::io::Error) -> CommandError {
    let error = if e.kind() == std::io::ErrorKind::NotFound {
        ArchiveError::FileNotFound(path.display().to_string())
    } else {
        ArchiveError::Io(e)
    };
    CommandError::Archive { context: format!("opening {}", path.display()), error }
}

pub fn unsupported_format_error(path: &Path, format: Format) -> CommandError {
    CommandError::Archive {
        context: format!("opening {}", path.display()),
        error: ArchiveError::UnsupportedFormat(format.name().to_string()),
    }
}

/// Sniff `path`'s format from its first 512 bytes (enough to see the ustar
/// magic at offset 257), falling back to the extension when the file is
/// shorter than that.
pub fn detect_archive_format(path: &Path) -> Result<Format, CommandError> {
    let mut file = std::fs::File::open(path).map_err(|e| io_err(path, e))?;
    let mut header = [0u8; 512];
    let n = read_fill(&mut file, &mut header).map_err(|e| io_err(path, e))?;
    Ok(zarc_archive::detect(&header[..n], path))
}

fn read_fill(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = r.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

/// Read and discard the rest of the current entry's data.
pub fn drain_all<R: Read>(reader: &mut AnyArchiveReader<R>) -> std::io::Result<u64> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader.read_data(&mut buf)?;
        if n == 0 {
            break;
        }
        total += n as u64;
    }
    Ok(total)
}

fn parse_globs(patterns: &[String]) -> Result<Vec<glob::Pattern>, CommandError> {
    patterns
        .iter()
        .map(|p| glob::Pattern::new(p).map_err(|e| CommandError::Argument(format!("invalid glob {p:?}: {e}"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::cli::{CompressArgs, ExtractArgs, InfoArgs, ListArgs, TestArgs};

    #[test]
    fn compress_then_extract_round_trips_a_directory() {
        let workdir = tempfile::tempdir().unwrap();
        let src = workdir.path().join("project");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("a.txt"), b"hello").unwrap();
        std::fs::write(src.join("sub/b.txt"), b"world").unwrap();

        let archive = workdir.path().join("out.tar.gz");
        super::compress::run(&CompressArgs {
            archive: archive.clone(),
            source: vec![src.clone()],
            format: None,
            level: Some(6),
            fast: false,
            best: false,
            verbose: false,
            exclude: Vec::new(),
            follow_symlinks: false,
        })
        .unwrap();
        assert!(archive.exists());

        super::test::run(&TestArgs { archive: archive.clone(), verbose: false }).unwrap();

        let dest = workdir.path().join("extracted");
        super::extract::run(&ExtractArgs {
            archive: archive.clone(),
            destination: Some(dest.clone()),
            output: None,
            overwrite: false,
            keep_existing: false,
            verbose: false,
            quiet: true,
            preserve_permissions: false,
            no_preserve_permissions: false,
            include: Vec::new(),
            exclude: Vec::new(),
            strip_components: 0,
            continue_on_error: false,
            allow_symlinks: false,
        })
        .unwrap();

        assert_eq!(std::fs::read(dest.join("project/a.txt")).unwrap(), b"hello");
        assert_eq!(std::fs::read(dest.join("project/sub/b.txt")).unwrap(), b"world");
    }

    #[test]
    fn list_and_info_read_an_archive_without_extracting() {
        let workdir = tempfile::tempdir().unwrap();
        let src = workdir.path().join("files");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("one.txt"), b"12345").unwrap();

        let archive = workdir.path().join("files.tar.gz");
        super::compress::run(&CompressArgs {
            archive: archive.clone(),
            source: vec![src],
            format: None,
            level: None,
            fast: false,
            best: false,
            verbose: false,
            exclude: Vec::new(),
            follow_symlinks: false,
        })
        .unwrap();

        super::list::run(&ListArgs { archive: archive.clone(), verbose: true, long: true, human_readable: true })
            .unwrap();
        super::info::run(&InfoArgs { archive }).unwrap();
    }

    #[test]
    fn compress_rejects_an_unsupported_explicit_format() {
        let workdir = tempfile::tempdir().unwrap();
        let archive = workdir.path().join("out.zip");
        let err = super::compress::run(&CompressArgs {
            archive,
            source: vec![PathBuf::from(".")],
            format: Some("zip".to_string()),
            level: None,
            fast: false,
            best: false,
            verbose: false,
            exclude: Vec::new(),
            follow_symlinks: false,
        })
        .unwrap_err();
        assert!(matches!(err, super::CommandError::Argument(_)));
    }
}
