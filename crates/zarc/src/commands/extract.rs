use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use colored::Colorize;

use zarc_archive::{
    extract as do_extract, AnyArchiveReader, ExtractOptions, ExtractionPolicy, HostPlatform,
    SymlinkPolicy,
};

use crate::cli::ExtractArgs;
use crate::commands::{
    detect_archive_format, io_err, parse_globs, unsupported_format_error, ArchiveContext, CommandError,
};

pub fn run(args: &ExtractArgs) -> Result<(), CommandError> {
    let format = detect_archive_format(&args.archive)?;
    if !format.is_supported() {
        return Err(unsupported_format_error(&args.archive, format));
    }

    let destination = args
        .output
        .clone()
        .or_else(|| args.destination.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let include = parse_globs(&args.include)?;
    let exclude = parse_globs(&args.exclude)?;

    let policy = ExtractionPolicy {
        preserve_permissions: args.preserve_permissions && !args.no_preserve_permissions,
        symlink_policy: if args.allow_symlinks {
            SymlinkPolicy::OnlyRelative
        } else {
            SymlinkPolicy::Disallow
        },
        ..ExtractionPolicy::default()
    };

    let compressed_size_hint = std::fs::metadata(&args.archive).map(|m| m.len()).unwrap_or(0);

    let options = ExtractOptions {
        policy,
        continue_on_error: args.continue_on_error,
        overwrite: args.overwrite,
        keep_existing: args.keep_existing,
        strip_components: args.strip_components,
        include,
        exclude,
        compressed_size_hint,
    };

    let context = format!("extracting {}", args.archive.display());

    let file = File::open(&args.archive).map_err(|e| io_err(&args.archive, e))?;
    let mut reader = AnyArchiveReader::open(format, BufReader::new(file)).context(&context)?;

    let summary = do_extract(&mut reader, &destination, &options, &HostPlatform).context(&context)?;

    if !args.quiet {
        println!(
            "{}",
            format!(
                "extracted {} {} ({} bytes) to {}",
                summary.entries_written,
                if summary.entries_written == 1 { "entry" } else { "entries" },
                summary.bytes_written,
                destination.display()
            )
            .green()
        );
    }

    if args.verbose {
        for warning in &summary.warnings {
            eprintln!("{}", format!("  warning: {}: {}", warning.path, warning.error).yellow());
        }
    }

    Ok(())
}
