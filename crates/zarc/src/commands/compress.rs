use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use colored::Colorize;
use walkdir::WalkDir;

use zarc_archive::{AnyArchiveWriter, ArchiveWriter, Format};
use zarc_gzip::GzHeader;
use zarc_tar::{EntryBuilder, EntryType};

use crate::cli::CompressArgs;
use crate::commands::{io_err, parse_globs, ArchiveContext, CommandError};

pub fn run(args: &CompressArgs) -> Result<(), CommandError> {
    let format = resolve_format(args)?;
    let level = resolve_level(args)?;
    let exclude = parse_globs(&args.exclude)?;

    let context = format!("creating {}", args.archive.display());

    let file = File::create(&args.archive).map_err(|e| io_err(&args.archive, e))?;
    let header = GzHeader {
        os: zarc_gzip::host_os_byte(),
        mtime: unix_time_now(),
        ..GzHeader::new()
    };
    let mut writer = AnyArchiveWriter::create_with_header(format, BufWriter::new(file), level, header)
        .context(&context)?;

    let mut entries_written = 0u64;
    let mut bytes_written = 0u64;

    for source in &args.source {
        for entry in WalkDir::new(source).follow_links(args.follow_symlinks) {
            let entry = entry.map_err(|e| CommandError::Archive {
                context: format!("reading {}", source.display()),
                error: zarc_archive::ArchiveError::Io(e.into()),
            })?;

            let rel = archive_relpath(source, entry.path());
            if rel.is_empty() || exclude.iter().any(|p| p.matches(&rel)) {
                continue;
            }

            let meta = entry
                .metadata()
                .map_err(|e| io_err(entry.path(), e.into()))?;
            let file_type = entry.file_type();

            if args.verbose {
                println!("{rel}");
            }

            if file_type.is_symlink() {
                let target = std::fs::read_link(entry.path()).map_err(|e| io_err(entry.path(), e))?;
                let builder = entry_builder(&meta, EntryType::SymbolicLink, target.to_string_lossy().into_owned());
                writer.add_entry(&rel, &[], builder).context(&context)?;
            } else if file_type.is_dir() {
                let builder = entry_builder(&meta, EntryType::Directory, String::new());
                writer.add_entry(&format!("{rel}/"), &[], builder).context(&context)?;
            } else {
                let data = std::fs::read(entry.path()).map_err(|e| io_err(entry.path(), e))?;
                bytes_written += data.len() as u64;
                let builder = entry_builder(&meta, EntryType::Regular, String::new());
                writer.add_entry(&rel, &data, builder).context(&context)?;
            }

            entries_written += 1;
        }
    }

    writer.finalize().context(&context)?;

    println!(
        "{}",
        format!(
            "wrote {entries_written} {} ({bytes_written} bytes) to {}",
            if entries_written == 1 { "entry" } else { "entries" },
            args.archive.display()
        )
        .green()
    );
    Ok(())
}

/// Compute the path an entry should carry inside the archive: the given
/// source path, rooted at its own parent, so `zarc c out.tar dir` produces
/// entries prefixed with `dir/` the way `tar` itself does.
fn archive_relpath(root: &Path, entry_path: &Path) -> String {
    let base = root.parent().unwrap_or_else(|| Path::new(""));
    let rel = entry_path.strip_prefix(base).unwrap_or(entry_path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn entry_builder(meta: &std::fs::Metadata, entry_type: EntryType, link_target: String) -> EntryBuilder {
    let (uid, gid) = owner_from_meta(meta);
    EntryBuilder {
        mode: mode_from_meta(meta),
        uid,
        gid,
        mtime: mtime_from_meta(meta),
        entry_type,
        link_target,
        ..EntryBuilder::default()
    }
}

fn mtime_from_meta(meta: &std::fs::Metadata) -> i64 {
    match meta.modified() {
        Ok(t) => match t.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        },
        Err(_) => 0,
    }
}

#[cfg(unix)]
fn mode_from_meta(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_from_meta(meta: &std::fs::Metadata) -> u32 {
    if meta.is_dir() {
        0o755
    } else {
        0o644
    }
}

#[cfg(unix)]
fn owner_from_meta(meta: &std::fs::Metadata) -> (u32, u32) {
    use std::os::unix::fs::MetadataExt;
    (meta.uid(), meta.gid())
}

#[cfg(not(unix))]
fn owner_from_meta(_meta: &std::fs::Metadata) -> (u32, u32) {
    (0, 0)
}

fn unix_time_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn resolve_format(args: &CompressArgs) -> Result<Format, CommandError> {
    let format = if let Some(s) = &args.format {
        parse_format(s)?
    } else {
        let detected = zarc_archive::detect_extension(&args.archive);
        if detected == Format::Unknown {
            Format::TarGz
        } else {
            detected
        }
    };
    if !format.is_supported() {
        return Err(CommandError::Argument(format!(
            "{} is not supported for writing (only tar and tar.gz are)",
            format.name()
        )));
    }
    Ok(format)
}

fn parse_format(s: &str) -> Result<Format, CommandError> {
    match s.to_ascii_lowercase().as_str() {
        "tar" => Ok(Format::Tar),
        "tar.gz" | "tgz" | "gz" | "gzip" => Ok(Format::TarGz),
        other => Err(CommandError::Argument(format!(
            "unsupported --format {other:?} (expected \"tar\" or \"tar.gz\")"
        ))),
    }
}

fn resolve_level(args: &CompressArgs) -> Result<u8, CommandError> {
    let level = if let Some(l) = args.level {
        l
    } else if args.fast {
        1
    } else if args.best {
        9
    } else {
        6
    };
    if level > 9 {
        return Err(CommandError::Argument(format!("--level {level} is out of range (expected 0..=9)")));
    }
    Ok(level)
}
