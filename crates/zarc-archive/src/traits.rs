//! The format-agnostic `ArchiveReader`/`ArchiveWriter` capability (spec §6,
//! §9 "VTable / polymorphism"): readers/writers of different container
//! formats expose the same operations, and format detection picks the
//! concrete implementation at open time.

use std::io::{self, Read, Write};

use crate::error::ArchiveError;
use crate::format::Format;

/// A sequential archive reader. `next_entry` is a lending iterator: the
/// returned entry borrows from the reader's internal scratch buffers and is
/// valid only until the following call (spec §4.6 "Borrow semantics").
///
/// This is the zero-copy mode spec §9 requires; pair it with
/// [`crate::extract::read_all_entries`] for the owning mode the same
/// section requires callers also have available.
pub trait ArchiveReader {
    type EntryRef<'a>
    where
        Self: 'a;

    fn next_entry(&mut self) -> Result<Option<Self::EntryRef<'_>>, ArchiveError>;
    fn read_data(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A sequential archive writer. Entries are appended in call order and the
/// archive is only well-formed once `finalize` has run (spec §4.7, §5
/// "Cancellation": dropping a writer without finalizing leaves a truncated
/// archive).
pub trait ArchiveWriter {
    fn add_entry(
        &mut self,
        path: &str,
        data: &[u8],
        builder: zarc_tar::EntryBuilder,
    ) -> Result<(), ArchiveError>;

    fn finalize(self) -> Result<(), ArchiveError>;
}

/// A reader over either a bare tar stream or a tar.gz stream, chosen by
/// format detection at construction time.
pub enum AnyArchiveReader<R: Read> {
    Tar(zarc_tar::TarReader<R>),
    TarGz(zarc_tar::TarReader<zarc_gzip::GzipReader<R>>),
}

impl<R: Read> AnyArchiveReader<R> {
    /// Open `inner` as the given `format`. Only `Format::Tar` and
    /// `Format::TarGz` are constructible; anything else is a programmer
    /// error to attempt (callers should have already turned an unsupported
    /// format into `ArchiveError::UnsupportedFormat` before reaching here).
    pub fn open(format: Format, inner: R) -> Result<Self, ArchiveError> {
        match format {
            Format::Tar => Ok(AnyArchiveReader::Tar(zarc_tar::TarReader::new(inner))),
            Format::TarGz => {
                let gz = zarc_gzip::GzipReader::new(inner)?;
                Ok(AnyArchiveReader::TarGz(zarc_tar::TarReader::new(gz)))
            }
            other => Err(ArchiveError::UnsupportedFormat(other.name().to_string())),
        }
    }
}

impl<R: Read> ArchiveReader for AnyArchiveReader<R> {
    type EntryRef<'a>
        = zarc_tar::Entry<'a>
    where
        Self: 'a;

    fn next_entry(&mut self) -> Result<Option<Self::EntryRef<'_>>, ArchiveError> {
        match self {
            AnyArchiveReader::Tar(r) => Ok(r.next()?),
            AnyArchiveReader::TarGz(r) => Ok(r.next()?),
        }
    }

    fn read_data(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            AnyArchiveReader::Tar(r) => r.read_data(buf),
            AnyArchiveReader::TarGz(r) => r.read_data(buf),
        }
    }
}

/// A writer over either a bare tar stream or a tar.gz stream.
pub enum AnyArchiveWriter<W: Write> {
    Tar(zarc_tar::TarWriter<W>),
    TarGz(zarc_tar::TarWriter<zarc_gzip::GzipWriter<W>>),
}

impl<W: Write> AnyArchiveWriter<W> {
    pub fn create(format: Format, inner: W, level: u8) -> Result<Self, ArchiveError> {
        Self::create_with_header(format, inner, level, zarc_gzip::GzHeader::new())
    }

    /// Like [`Self::create`], but lets the caller supply the gzip member
    /// header (filename, mtime, OS byte) instead of the library default.
    /// Ignored for `Format::Tar`.
    pub fn create_with_header(
        format: Format,
        inner: W,
        level: u8,
        header: zarc_gzip::GzHeader,
    ) -> Result<Self, ArchiveError> {
        match format {
            Format::Tar => Ok(AnyArchiveWriter::Tar(zarc_tar::TarWriter::new(inner))),
            Format::TarGz => {
                let gz = zarc_gzip::GzipWriter::new(inner, level, header)?;
                Ok(AnyArchiveWriter::TarGz(zarc_tar::TarWriter::new(gz)))
            }
            other => Err(ArchiveError::UnsupportedFormat(other.name().to_string())),
        }
    }
}

impl<W: Write> ArchiveWriter for AnyArchiveWriter<W> {
    fn add_entry(
        &mut self,
        path: &str,
        data: &[u8],
        builder: zarc_tar::EntryBuilder,
    ) -> Result<(), ArchiveError> {
        match self {
            AnyArchiveWriter::Tar(w) => Ok(w.append_data(path, data, builder)?),
            AnyArchiveWriter::TarGz(w) => Ok(w.append_data(path, data, builder)?),
        }
    }

    fn finalize(self) -> Result<(), ArchiveError> {
        match self {
            AnyArchiveWriter::Tar(w) => {
                w.finish()?;
                Ok(())
            }
            AnyArchiveWriter::TarGz(w) => {
                let gz = w.finish()?;
                gz.finish()?;
                Ok(())
            }
        }
    }
}
