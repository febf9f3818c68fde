//! Streaming tar reader.
//!
//! `TarReader::next` is a lending iterator (not `std::iter::Iterator`,
//! since the returned `Entry` borrows from reusable internal buffers that
//! are overwritten by the following call).

use std::io::{self, Read};

use crate::entry::{Entry, EntryType};
use crate::error::TarError;
use crate::header::{self, BLOCK_SIZE};

pub struct TarReader<R: Read> {
    inner: R,
    name_buf: String,
    link_buf: String,
    uname_buf: String,
    gname_buf: String,
    entry_type: EntryType,
    mode: u32,
    uid: u32,
    gid: u32,
    size: u64,
    mtime: i64,
    devmajor: u32,
    devminor: u32,
    remaining: u64,
    padding: u64,
    finished: bool,
}

impl<R: Read> TarReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            name_buf: String::new(),
            link_buf: String::new(),
            uname_buf: String::new(),
            gname_buf: String::new(),
            entry_type: EntryType::Regular,
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            mtime: 0,
            devmajor: 0,
            devminor: 0,
            remaining: 0,
            padding: 0,
            finished: false,
        }
    }

    /// Advance to the next entry. Discards any unread data and padding left
    /// over from the previous entry first.
    pub fn next(&mut self) -> Result<Option<Entry<'_>>, TarError> {
        if self.finished {
            return Ok(None);
        }

        self.skip_current_entry()?;

        let mut pending_long_name: Option<String> = None;
        let mut pending_long_link: Option<String> = None;

        loop {
            let block = match self.read_block()? {
                Some(b) => b,
                None => {
                    self.finished = true;
                    return Ok(None);
                }
            };

            if header::is_zero_block(&block) {
                // A single zero block at end-of-archive is tolerated even
                // though POSIX specifies two; real EOF follows either way.
                match self.read_block()? {
                    Some(b) if !header::is_zero_block(&b) => {
                        return Err(TarError::CorruptedHeader(
                            "non-zero block follows a zero block before end-of-archive".into(),
                        ));
                    }
                    _ => {
                        self.finished = true;
                        return Ok(None);
                    }
                }
            }

            let fields = header::parse_block(&block)?;
            let entry_type = EntryType::from_typeflag(fields.typeflag);

            if entry_type.is_gnu_extension() {
                let data = self.read_gnu_extension_data(fields.size)?;
                match entry_type {
                    EntryType::GnuLongName => pending_long_name = Some(data),
                    EntryType::GnuLongLink => pending_long_link = Some(data),
                    _ => unreachable!(),
                }
                continue;
            }

            let name = pending_long_name.take().unwrap_or_else(|| {
                if fields.prefix.is_empty() {
                    fields.name.clone()
                } else {
                    format!("{}/{}", fields.prefix, fields.name)
                }
            });
            let linkname = pending_long_link.take().unwrap_or(fields.linkname);

            self.name_buf = name;
            self.link_buf = linkname;
            self.uname_buf = fields.uname;
            self.gname_buf = fields.gname;
            self.entry_type = entry_type;
            self.mode = fields.mode;
            self.uid = fields.uid;
            self.gid = fields.gid;
            self.size = fields.size;
            self.mtime = fields.mtime;
            self.devmajor = fields.devmajor;
            self.devminor = fields.devminor;
            self.remaining = fields.size;
            self.padding = padding_for(fields.size);

            return Ok(Some(Entry {
                path: &self.name_buf,
                link_target: &self.link_buf,
                entry_type: self.entry_type,
                mode: self.mode,
                uid: self.uid,
                gid: self.gid,
                size: self.size,
                mtime: self.mtime,
                uname: &self.uname_buf,
                gname: &self.gname_buf,
                devmajor: self.devmajor,
                devminor: self.devminor,
            }));
        }
    }

    /// Read up to `buf.len()` bytes of the current entry's file data.
    ///
    /// Per §4.6's data-window contract, a stream that runs out before
    /// `size` bytes have been delivered surfaces `TarError::IncompleteArchive`
    /// (wrapped as `io::ErrorKind::UnexpectedEof`) rather than silently
    /// returning a short read.
    pub fn read_data(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(self.remaining) as usize;
        if want == 0 {
            return Ok(0);
        }
        let n = self.inner.read(&mut buf[..want])?;
        if n == 0 {
            let err = TarError::IncompleteArchive { remaining: self.remaining };
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, err));
        }
        self.remaining -= n as u64;
        Ok(n)
    }

    /// Read the entire current entry's data into a fresh buffer.
    pub fn read_data_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.remaining as usize);
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read_data(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }

    fn skip_current_entry(&mut self) -> Result<(), TarError> {
        if self.remaining > 0 {
            io::copy(&mut (&mut self.inner).take(self.remaining), &mut io::sink())?;
            self.remaining = 0;
        }
        if self.padding > 0 {
            io::copy(&mut (&mut self.inner).take(self.padding), &mut io::sink())?;
            self.padding = 0;
        }
        Ok(())
    }

    const MAX_GNU_EXTENSION_SIZE: u64 = 16 * 1024 * 1024;

    fn read_gnu_extension_data(&mut self, size: u64) -> Result<String, TarError> {
        if size > Self::MAX_GNU_EXTENSION_SIZE {
            return Err(TarError::LongNameTooLarge(size));
        }
        let mut data = vec![0u8; size as usize];
        self.inner.read_exact(&mut data).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                TarError::IncompleteArchive { remaining: size }
            } else {
                TarError::Io(e)
            }
        })?;
        let pad = padding_for(size);
        if pad > 0 {
            io::copy(&mut (&mut self.inner).take(pad), &mut io::sink())?;
        }
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        String::from_utf8(data[..end].to_vec()).map_err(|_| TarError::MalformedLongName)
    }

    /// Unwrap the reader, discarding any buffered entry state. Callers that
    /// need to drive the underlying stream past the tar end-of-archive
    /// marker (e.g. to force a wrapping `GzipReader`'s footer check) can
    /// keep reading from the returned value.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_block(&mut self) -> Result<Option<[u8; BLOCK_SIZE]>, TarError> {
        let mut block = [0u8; BLOCK_SIZE];
        match self.inner.read_exact(&mut block) {
            Ok(()) => Ok(Some(block)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(TarError::Io(e)),
        }
    }
}

fn padding_for(size: u64) -> u64 {
    let rem = size % BLOCK_SIZE as u64;
    if rem == 0 {
        0
    } else {
        BLOCK_SIZE as u64 - rem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::TarWriter;

    #[test]
    fn reads_back_a_simple_entry() {
        let mut buf = Vec::new();
        {
            let mut w = TarWriter::new(&mut buf);
            w.append_data("hello.txt", b"hi there", crate::writer::EntryBuilder::file(0o644))
                .unwrap();
            w.finish().unwrap();
        }

        let mut r = TarReader::new(&buf[..]);
        let entry = r.next().unwrap().unwrap();
        assert_eq!(entry.path, "hello.txt");
        assert_eq!(entry.size, 8);
        let data = r.read_data_to_vec().unwrap();
        assert_eq!(data, b"hi there");
        assert!(r.next().unwrap().is_none());
    }

    #[test]
    fn reads_back_gnu_long_name() {
        let long_name = format!("deeply/nested/{}/file.bin", "d".repeat(200));
        let mut buf = Vec::new();
        {
            let mut w = TarWriter::new(&mut buf);
            w.append_data(&long_name, b"payload", crate::writer::EntryBuilder::file(0o600))
                .unwrap();
            w.finish().unwrap();
        }

        let mut r = TarReader::new(&buf[..]);
        let entry = r.next().unwrap().unwrap();
        assert_eq!(entry.path, long_name);
    }

    #[test]
    fn skips_unread_data_between_entries() {
        let mut buf = Vec::new();
        {
            let mut w = TarWriter::new(&mut buf);
            w.append_data("a.txt", b"aaaaaaaaaa", crate::writer::EntryBuilder::file(0o644))
                .unwrap();
            w.append_data("b.txt", b"bbbbbbbbbb", crate::writer::EntryBuilder::file(0o644))
                .unwrap();
            w.finish().unwrap();
        }

        let mut r = TarReader::new(&buf[..]);
        r.next().unwrap().unwrap(); // a.txt, data not read
        let b = r.next().unwrap().unwrap();
        assert_eq!(b.path, "b.txt");
        assert_eq!(r.read_data_to_vec().unwrap(), b"bbbbbbbbbb");
    }
}
