use std::fs::File;
use std::io::BufReader;

use zarc_archive::{AnyArchiveReader, ArchiveReader, Format};

use crate::cli::InfoArgs;
use crate::commands::{detect_archive_format, drain_all, io_err, ArchiveContext, CommandError};
use crate::format::{gzip_os_name, human_size};

pub fn run(args: &InfoArgs) -> Result<(), CommandError> {
    let format = detect_archive_format(&args.archive)?;
    let compressed_size = std::fs::metadata(&args.archive).map(|m| m.len()).unwrap_or(0);

    println!("path:              {}", args.archive.display());
    println!("format:            {}", format.name());

    if !format.is_supported() {
        println!("entries:           unknown (this build cannot decode {} contents)", format.name());
        return Ok(());
    }

    let context = format!("reading {}", args.archive.display());
    let file = File::open(&args.archive).map_err(|e| io_err(&args.archive, e))?;
    let mut reader = AnyArchiveReader::open(format, BufReader::new(file)).context(&context)?;

    let mut entries = 0u64;
    let mut total_uncompressed = 0u64;
    loop {
        let size = {
            match reader.next_entry().context(&context)? {
                Some(e) => e.size,
                None => break,
            }
        };
        drain_all(&mut reader).map_err(|e| CommandError::Archive {
            context: context.clone(),
            error: zarc_archive::ArchiveError::Io(e),
        })?;
        entries += 1;
        total_uncompressed += size;
    }

    println!("entries:           {entries}");
    println!("compressed size:   {} ({compressed_size} bytes)", human_size(compressed_size));
    println!("uncompressed size: {} ({total_uncompressed} bytes)", human_size(total_uncompressed));
    let ratio = if compressed_size > 0 {
        total_uncompressed as f64 / compressed_size as f64
    } else {
        0.0
    };
    println!("compression ratio: {ratio:.2}x");

    if format == Format::TarGz {
        print_gzip_header(&args.archive)?;
    }

    Ok(())
}

fn print_gzip_header(path: &std::path::Path) -> Result<(), CommandError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let gz = zarc_gzip::GzipReader::new(BufReader::new(file)).map_err(|e| CommandError::Archive {
        context: format!("reading {}", path.display()),
        error: zarc_archive::ArchiveError::Gzip(e),
    })?;
    let header = gz.header();
    println!("gzip mtime:        {}", header.mtime);
    println!("gzip os:           {}", gzip_os_name(header.os));
    if let Some(name) = &header.filename {
        println!("gzip filename:     {}", String::from_utf8_lossy(name));
    }
    Ok(())
}
