use std::fs::File;
use std::io::BufReader;

use colored::Colorize;

use zarc_archive::{AnyArchiveReader, ArchiveReader};

use crate::cli::ListArgs;
use crate::commands::{detect_archive_format, drain_all, io_err, unsupported_format_error, ArchiveContext, CommandError};
use crate::format::{format_mode, human_size, type_char};

pub fn run(args: &ListArgs) -> Result<(), CommandError> {
    let format = detect_archive_format(&args.archive)?;
    if !format.is_supported() {
        return Err(unsupported_format_error(&args.archive, format));
    }

    let context = format!("listing {}", args.archive.display());
    let file = File::open(&args.archive).map_err(|e| io_err(&args.archive, e))?;
    let mut reader = AnyArchiveReader::open(format, BufReader::new(file)).context(&context)?;

    let mut count = 0u64;
    let mut total_size = 0u64;

    loop {
        let (path, entry_type, size, mode, mtime) = {
            let entry = reader.next_entry().context(&context)?;
            match entry {
                Some(e) => (e.path.to_string(), e.entry_type, e.size, e.mode, e.mtime),
                None => break,
            }
        };
        drain_all(&mut reader).map_err(|e| CommandError::Archive {
            context: context.clone(),
            error: zarc_archive::ArchiveError::Io(e),
        })?;

        count += 1;
        total_size += size;

        if args.long {
            let size_str = if args.human_readable { human_size(size) } else { size.to_string() };
            println!(
                "{}{} {:>10}  {}  {path}",
                type_char(entry_type),
                format_mode(mode),
                size_str,
                format_mtime(mtime),
            );
        } else {
            println!("{path}");
        }
    }

    if args.verbose {
        let size_str = if args.human_readable { human_size(total_size) } else { total_size.to_string() };
        println!("{}", format!("{count} entries, {size_str} total").dimmed());
    }

    Ok(())
}

fn format_mtime(mtime: i64) -> String {
    match chrono::DateTime::from_timestamp(mtime, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "                ".to_string(),
    }
}
