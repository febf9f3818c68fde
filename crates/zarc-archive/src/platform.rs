//! Per-OS filesystem glue behind one capability (spec §9 "Dynamic dispatch
//! for platform filesystem"): permissions, timestamps, symlinks, hardlinks.
//!
//! Mirrors the teacher's per-target-OS `cfg` split (see
//! `virtue/src/cpuid/Cargo.toml`'s `target.'cfg(target_os = "linux")'`
//! dependency table) rather than a runtime-dispatched trait object, since
//! the concrete OS is known at compile time and never changes mid-process.

use std::io;
use std::path::Path;

use filetime::FileTime;

/// Filesystem operations whose implementation differs by platform. A
/// free-function module (`self::imp`) provides the concrete bodies per
/// `cfg(unix)`/`cfg(windows)`; this trait exists so the extraction
/// orchestrator can be written once against an abstract `Platform` and,
/// in tests, substituted with a fake.
pub trait Platform {
    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()>;
    fn get_permissions(&self, path: &Path) -> io::Result<u32>;
    fn set_file_time(&self, path: &Path, mtime_unix: i64) -> io::Result<()>;
    fn create_symlink(&self, target: &Path, link: &Path) -> io::Result<()>;
    fn read_symlink(&self, link: &Path) -> io::Result<std::path::PathBuf>;
    fn is_symlink(&self, path: &Path) -> io::Result<bool>;
    fn create_hardlink(&self, existing: &Path, link: &Path) -> io::Result<()>;
    fn platform_name(&self) -> &'static str;
}

/// The platform matching the OS this binary was built for.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()> {
        imp::set_permissions(path, mode)
    }

    fn get_permissions(&self, path: &Path) -> io::Result<u32> {
        imp::get_permissions(path)
    }

    fn set_file_time(&self, path: &Path, mtime_unix: i64) -> io::Result<()> {
        let ft = FileTime::from_unix_time(mtime_unix, 0);
        filetime::set_file_times(path, ft, ft)
    }

    fn create_symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        imp::create_symlink(target, link)
    }

    fn read_symlink(&self, link: &Path) -> io::Result<std::path::PathBuf> {
        std::fs::read_link(link)
    }

    fn is_symlink(&self, path: &Path) -> io::Result<bool> {
        Ok(std::fs::symlink_metadata(path)?.file_type().is_symlink())
    }

    fn create_hardlink(&self, existing: &Path, link: &Path) -> io::Result<()> {
        std::fs::hard_link(existing, link)
    }

    fn platform_name(&self) -> &'static str {
        imp::PLATFORM_NAME
    }
}

#[cfg(unix)]
mod imp {
    use std::io;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    pub const PLATFORM_NAME: &str = "unix";

    pub fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }

    pub fn get_permissions(path: &Path) -> io::Result<u32> {
        Ok(std::fs::symlink_metadata(path)?.permissions().mode() & 0o7777)
    }

    pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }
}

#[cfg(windows)]
mod imp {
    use std::io;
    use std::path::Path;

    pub const PLATFORM_NAME: &str = "windows";

    /// Windows has no POSIX mode bits; approximate by toggling the
    /// readonly attribute on the owner-write bit, matching what archivers
    /// commonly do when a ustar archive crosses onto this platform.
    pub fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
        let mut perm = std::fs::metadata(path)?.permissions();
        perm.set_readonly(mode & 0o200 == 0);
        std::fs::set_permissions(path, perm)
    }

    pub fn get_permissions(path: &Path) -> io::Result<u32> {
        let perm = std::fs::metadata(path)?.permissions();
        Ok(if perm.readonly() { 0o444 } else { 0o644 })
    }

    pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
        if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}

#[cfg(all(not(unix), not(windows)))]
mod imp {
    use std::io;
    use std::path::Path;

    pub const PLATFORM_NAME: &str = "unknown";

    pub fn set_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
        Ok(())
    }

    pub fn get_permissions(_path: &Path) -> io::Result<u32> {
        Ok(0o644)
    }

    pub fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported on this platform"))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn round_trips_permissions_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, b"hi").unwrap();

        let platform = HostPlatform;
        platform.set_permissions(&file, 0o600).unwrap();
        assert_eq!(platform.get_permissions(&file).unwrap(), 0o600);

        platform.set_file_time(&file, 1_000_000).unwrap();
        let meta = std::fs::metadata(&file).unwrap();
        let mtime = filetime::FileTime::from_last_modification_time(&meta);
        assert_eq!(mtime.seconds(), 1_000_000);
    }

    #[test]
    fn creates_and_reads_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.txt");
        std::fs::write(&target, b"hi").unwrap();
        let link = dir.path().join("link.txt");

        let platform = HostPlatform;
        platform.create_symlink(Path::new("target.txt"), &link).unwrap();
        assert!(platform.is_symlink(&link).unwrap());
        assert_eq!(platform.read_symlink(&link).unwrap(), Path::new("target.txt"));
    }

    #[test]
    fn creates_hardlink() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("a.txt");
        std::fs::write(&existing, b"hi").unwrap();
        let link = dir.path().join("b.txt");

        HostPlatform.create_hardlink(&existing, &link).unwrap();
        assert_eq!(std::fs::read(&link).unwrap(), b"hi");
    }
}
