//! Extraction security policy: path sanitization and decompression-bomb
//! guards (spec §3 "ExtractionPolicy", §7 "Security kinds", §8.7/§8.9).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SecurityError;

/// How the extraction orchestrator treats symlink entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SymlinkPolicy {
    /// Refuse to materialize any symlink entry.
    #[default]
    Disallow,
    /// Allow symlinks whose target is a relative path that stays inside
    /// the destination directory once resolved.
    OnlyRelative,
    /// Materialize any symlink target, including absolute ones. Dangerous;
    /// only meant for trusted archives.
    AllowAll,
}

/// Configuration governing what the extraction orchestrator will and won't
/// do to the filesystem (spec §3). Serializable so a host application can
/// persist or load a policy alongside its own configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionPolicy {
    pub allow_absolute_paths: bool,
    pub allow_path_traversal: bool,
    pub symlink_policy: SymlinkPolicy,
    pub max_file_size: u64,
    pub max_total_size: u64,
    pub max_compression_ratio: f64,
    pub verify_checksums: bool,
    pub preserve_permissions: bool,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            allow_absolute_paths: false,
            allow_path_traversal: false,
            symlink_policy: SymlinkPolicy::Disallow,
            max_file_size: 10 * 1024 * 1024 * 1024,        // 10 GiB
            max_total_size: 100 * 1024 * 1024 * 1024,      // 100 GiB
            max_compression_ratio: 1000.0,
            verify_checksums: true,
            preserve_permissions: false,
        }
    }
}

const MAX_PATH_LEN: usize = 4096;

/// Validate and normalize an archive-entry path against `policy`, returning
/// the path to join onto the extraction destination.
///
/// Normalization resolves `.` and `..` components purely lexically (no
/// filesystem access; the entry need not exist yet) and rejects any path
/// whose `..` components would walk above the destination root, unless
/// `policy.allow_path_traversal` is set.
pub fn sanitize_path(path: &str, policy: &ExtractionPolicy) -> Result<PathBuf, SecurityError> {
    if path.contains('\0') {
        return Err(SecurityError::NullByteInPath(path.to_string()));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(SecurityError::PathTooLong(path.to_string()));
    }
    if path.chars().any(|c| c.is_control() && c != '\0') {
        return Err(SecurityError::InvalidCharacterInPath(path.to_string()));
    }

    let is_absolute = path.starts_with('/') || path.starts_with('\\') || has_windows_drive_prefix(path);
    if is_absolute && !policy.allow_absolute_paths {
        return Err(SecurityError::AbsolutePathNotAllowed(path.to_string()));
    }

    let mut normalized: Vec<&str> = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => continue,
            ".." => {
                if normalized.pop().is_none() && !policy.allow_path_traversal {
                    return Err(SecurityError::PathTraversalAttempt(path.to_string()));
                }
            }
            other => normalized.push(other),
        }
    }

    Ok(normalized.into_iter().collect())
}

fn has_windows_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Reject a symlink target that escapes `destination` once resolved against
/// `entry_dir` (the symlink's own parent directory under the destination).
///
/// Resolution is purely lexical plus the policy's symlink mode; the caller
/// is responsible for the stronger invariant of §8.7 (canonicalizing the
/// actual written path against the destination's canonical path once the
/// parent directories exist on disk).
pub fn sanitize_symlink_target(
    entry_path: &str,
    target: &str,
    policy: &ExtractionPolicy,
) -> Result<(), SecurityError> {
    match policy.symlink_policy {
        SymlinkPolicy::Disallow => {
            Err(SecurityError::SymlinkNotAllowed(entry_path.to_string()))
        }
        SymlinkPolicy::AllowAll => Ok(()),
        SymlinkPolicy::OnlyRelative => {
            let is_absolute =
                target.starts_with('/') || target.starts_with('\\') || has_windows_drive_prefix(target);
            if is_absolute {
                return Err(SecurityError::AbsoluteSymlinkNotAllowed(entry_path.to_string()));
            }

            let entry_dir: Vec<&str> = entry_path
                .split(['/', '\\'])
                .filter(|c| !c.is_empty())
                .collect();
            let mut stack: Vec<&str> = entry_dir[..entry_dir.len().saturating_sub(1)].to_vec();
            for component in target.split(['/', '\\']) {
                match component {
                    "" | "." => continue,
                    ".." => {
                        if stack.pop().is_none() {
                            return Err(SecurityError::SymlinkEscapeAttempt {
                                entry: entry_path.to_string(),
                                target: target.to_string(),
                            });
                        }
                    }
                    other => stack.push(other),
                }
            }
            Ok(())
        }
    }
}

/// Verify a candidate extracted path, once joined and lexically normalized
/// onto a *canonicalized* destination, still has that destination as a
/// prefix (spec §8.7's stronger, filesystem-aware invariant). Called by the
/// extraction orchestrator after `sanitize_path` and after any parent
/// directories have been created.
pub fn verify_no_escape(destination_canonical: &Path, candidate: &Path) -> Result<(), SecurityError> {
    let lexically_normalized = lexical_normalize(candidate);
    if lexically_normalized.starts_with(destination_canonical) {
        Ok(())
    } else {
        Err(SecurityError::PathTraversalAttempt(candidate.display().to_string()))
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Reject a decompression whose ratio of decompressed-to-compressed bytes
/// suggests a zip bomb (spec §8 S8).
pub fn check_zip_bomb(
    compressed_size: u64,
    decompressed_size: u64,
    policy: &ExtractionPolicy,
) -> Result<(), SecurityError> {
    let ratio = decompressed_size as f64 / (compressed_size.max(1) as f64);
    if ratio > policy.max_compression_ratio {
        return Err(SecurityError::SuspiciousCompressionRatio {
            ratio,
            limit: policy.max_compression_ratio,
        });
    }
    Ok(())
}
