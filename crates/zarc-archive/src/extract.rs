//! The extraction orchestrator: walks an `ArchiveReader`, materializes
//! entries under a destination directory through a `Platform`, and applies
//! the `ExtractionPolicy` security checks (spec §4 intro diagram, §7
//! "continue_on_error").

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{ArchiveError, SecurityError};
use crate::platform::Platform;
use crate::policy::{self, ExtractionPolicy};
use crate::traits::{AnyArchiveReader, ArchiveReader};

/// One entry's worth of failure collected when `continue_on_error` is set,
/// instead of aborting the whole run (spec §7 "Propagation policy").
#[derive(Debug)]
pub struct ExtractWarning {
    pub path: String,
    pub error: ArchiveError,
}

/// Aggregate result of a successful (possibly partially-failed) extraction.
#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub entries_written: u64,
    pub bytes_written: u64,
    pub warnings: Vec<ExtractWarning>,
}

/// Options governing one extraction run, combining the security policy
/// (§3) with the CLI-level behavior flags of the `extract` subcommand
/// (§6's option table).
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub policy: ExtractionPolicy,
    pub continue_on_error: bool,
    pub overwrite: bool,
    pub keep_existing: bool,
    pub strip_components: usize,
    pub include: Vec<Pattern>,
    pub exclude: Vec<Pattern>,
    /// Size of the compressed archive stream, used as the numerator-free
    /// side of the running compression-ratio check (§8 S8). `0` disables
    /// the ratio check (the caller couldn't determine it, e.g. reading
    /// from a non-seekable pipe).
    pub compressed_size_hint: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            policy: ExtractionPolicy::default(),
            continue_on_error: false,
            overwrite: false,
            keep_existing: false,
            strip_components: 0,
            include: Vec::new(),
            exclude: Vec::new(),
            compressed_size_hint: 0,
        }
    }
}

fn matches_filters(path: &str, options: &ExtractOptions) -> bool {
    if !options.include.is_empty() && !options.include.iter().any(|p| p.matches(path)) {
        return false;
    }
    if options.exclude.iter().any(|p| p.matches(path)) {
        return false;
    }
    true
}

fn strip_components(path: &Path, n: usize) -> Option<PathBuf> {
    let mut components = path.components();
    for _ in 0..n {
        components.next()?;
    }
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Extract every entry of `reader` under `destination`, applying `options`.
///
/// Aborts on the first error unless `options.continue_on_error` is set, in
/// which case per-entry failures are collected into
/// `ExtractSummary::warnings` and extraction continues with the next entry.
pub fn extract<R: Read, P: Platform>(
    reader: &mut AnyArchiveReader<R>,
    destination: &Path,
    options: &ExtractOptions,
    platform: &P,
) -> Result<ExtractSummary, ArchiveError> {
    fs::create_dir_all(destination)?;
    let destination_canonical = destination.canonicalize()?;

    let mut summary = ExtractSummary::default();
    let mut total_bytes: u64 = 0;

    loop {
        let (path, entry_type, size, mode, mtime, link_target) = {
            let entry = match reader.next_entry()? {
                Some(e) => e,
                None => break,
            };
            (
                entry.path.to_string(),
                entry.entry_type,
                entry.size,
                entry.mode,
                entry.mtime,
                entry.link_target.to_string(),
            )
        };

        let outcome = extract_one(
            reader,
            &path,
            entry_type,
            size,
            mode,
            mtime,
            &link_target,
            destination,
            &destination_canonical,
            options,
            platform,
            &mut total_bytes,
        );

        match outcome {
            Ok(Some(written)) => {
                summary.entries_written += 1;
                summary.bytes_written += written;
            }
            Ok(None) => {} // filtered out by include/exclude
            Err(e) => {
                if options.continue_on_error {
                    summary.warnings.push(ExtractWarning { path, error: e });
                } else {
                    return Err(e);
                }
            }
        }
    }

    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn extract_one<R: Read, P: Platform>(
    reader: &mut AnyArchiveReader<R>,
    path: &str,
    entry_type: zarc_tar::EntryType,
    size: u64,
    mode: u32,
    mtime: i64,
    link_target: &str,
    destination: &Path,
    destination_canonical: &Path,
    options: &ExtractOptions,
    platform: &P,
    total_bytes: &mut u64,
) -> Result<Option<u64>, ArchiveError> {
    if !matches_filters(path, options) {
        drain_entry(reader)?;
        return Ok(None);
    }

    if size > options.policy.max_file_size {
        return Err(SecurityError::FileSizeExceedsLimit {
            path: path.to_string(),
            size,
            limit: options.policy.max_file_size,
        }
        .into());
    }

    let sanitized = policy::sanitize_path(path, &options.policy)?;
    let sanitized = match options.strip_components {
        0 => sanitized,
        n => match strip_components(&sanitized, n) {
            Some(p) => p,
            None => {
                drain_entry(reader)?;
                return Ok(None);
            }
        },
    };

    let dest_path = destination.join(&sanitized);
    policy::verify_no_escape(destination_canonical, &dest_path)?;

    if dest_path.exists() {
        if options.keep_existing {
            drain_entry(reader)?;
            return Ok(None);
        }
        if !options.overwrite && matches!(entry_type, zarc_tar::EntryType::Regular) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists (pass --overwrite to replace it)", dest_path.display()),
            )
            .into());
        }
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = match entry_type {
        zarc_tar::EntryType::Directory => {
            fs::create_dir_all(&dest_path)?;
            0
        }
        zarc_tar::EntryType::SymbolicLink => {
            policy::sanitize_symlink_target(path, link_target, &options.policy)?;
            if dest_path.exists() || platform.is_symlink(&dest_path).unwrap_or(false) {
                fs::remove_file(&dest_path).ok();
            }
            platform.create_symlink(Path::new(link_target), &dest_path)?;

            // sanitize_symlink_target only reasons lexically; now that the
            // link exists, resolve it for real and confirm the destination
            // it points at is still under destination_canonical. Catches
            // targets that escape through a symlinked parent directory,
            // which no amount of lexical checking on the raw strings can see.
            if !matches!(options.policy.symlink_policy, crate::policy::SymlinkPolicy::AllowAll) {
                if let Ok(resolved) = dest_path.canonicalize() {
                    policy::verify_no_escape(destination_canonical, &resolved)?;
                }
            }
            0
        }
        zarc_tar::EntryType::HardLink => {
            let existing = destination.join(
                policy::sanitize_path(link_target, &options.policy)?,
            );
            platform.create_hardlink(&existing, &dest_path)?;
            0
        }
        _ => {
            let mut file = fs::File::create(&dest_path)?;
            let mut buf = [0u8; 64 * 1024];
            let mut written = 0u64;
            loop {
                let n = reader.read_data(&mut buf)?;
                if n == 0 {
                    break;
                }
                std::io::Write::write_all(&mut file, &buf[..n])?;
                written += n as u64;
                *total_bytes += n as u64;

                if *total_bytes > options.policy.max_total_size {
                    return Err(SecurityError::TotalSizeExceedsLimit {
                        total: *total_bytes,
                        limit: options.policy.max_total_size,
                    }
                    .into());
                }
            }
            written
        }
    };

    if options.compressed_size_hint > 0 {
        policy::check_zip_bomb(options.compressed_size_hint, *total_bytes, &options.policy)?;
    }

    if options.policy.preserve_permissions && !matches!(entry_type, zarc_tar::EntryType::SymbolicLink) {
        platform.set_permissions(&dest_path, mode).ok();
    }
    if !matches!(entry_type, zarc_tar::EntryType::SymbolicLink | zarc_tar::EntryType::HardLink) {
        platform.set_file_time(&dest_path, mtime).ok();
    }

    Ok(Some(written))
}

fn drain_entry<R: Read>(reader: &mut AnyArchiveReader<R>) -> std::io::Result<()> {
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read_data(&mut buf)?;
        if n == 0 {
            break;
        }
    }
    Ok(())
}

/// Read every entry of `reader` into an owned `Vec`, deep-copying each
/// entry's string fields up front so the result outlives the reader (spec
/// §9's required owning helper, §4.6's "a helper that reads all entries
/// must perform this deep-copy itself").
pub fn read_all_entries<R: Read>(
    reader: &mut AnyArchiveReader<R>,
) -> Result<Vec<zarc_tar::OwnedEntry>, ArchiveError> {
    let mut out = Vec::new();
    while let Some(entry) = reader.next_entry()? {
        out.push(entry.to_owned_entry());
        drain_entry(reader)?;
    }
    Ok(out)
}
