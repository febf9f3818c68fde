//! Streaming tar writer.

use std::io::{self, Write};

use crate::entry::EntryType;
use crate::error::TarError;
use crate::header::{self, HeaderFields, BLOCK_SIZE};

/// Per-entry metadata supplied by the caller; everything not overridden
/// keeps a sane default (root-owned, mode 0o644, mtime 0).
#[derive(Clone, Debug)]
pub struct EntryBuilder {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: i64,
    pub uname: String,
    pub gname: String,
    pub entry_type: EntryType,
    pub link_target: String,
    pub devmajor: u32,
    pub devminor: u32,
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self {
            mode: 0o644,
            uid: 0,
            gid: 0,
            mtime: 0,
            uname: String::new(),
            gname: String::new(),
            entry_type: EntryType::Regular,
            link_target: String::new(),
            devmajor: 0,
            devminor: 0,
        }
    }
}

impl EntryBuilder {
    pub fn file(mode: u32) -> Self {
        Self {
            mode,
            entry_type: EntryType::Regular,
            ..Default::default()
        }
    }

    pub fn directory(mode: u32) -> Self {
        Self {
            mode,
            entry_type: EntryType::Directory,
            ..Default::default()
        }
    }

    pub fn symlink(target: impl Into<String>, mode: u32) -> Self {
        Self {
            mode,
            entry_type: EntryType::SymbolicLink,
            link_target: target.into(),
            ..Default::default()
        }
    }
}

const GNU_LONGLINK_MARKER: &str = "././@LongLink";

pub struct TarWriter<W: Write> {
    inner: W,
    finished: bool,
}

impl<W: Write> TarWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    pub fn append_data(
        &mut self,
        path: &str,
        data: &[u8],
        builder: EntryBuilder,
    ) -> Result<(), TarError> {
        if path.len() > 100 && builder.link_target.len() > 100 {
            self.write_gnu_extension(EntryType::GnuLongLink, &builder.link_target)?;
            self.write_gnu_extension(EntryType::GnuLongName, path)?;
        } else if builder.link_target.len() > 100 {
            self.write_gnu_extension(EntryType::GnuLongLink, &builder.link_target)?;
        } else if path.len() > 100 {
            self.write_gnu_extension(EntryType::GnuLongName, path)?;
        }

        let (prefix, name) = match header::split_path_for_ustar(path) {
            Some(split) => split,
            None => (String::new(), truncate_to(path, 100)),
        };
        let link_target = if builder.link_target.len() > 100 {
            truncate_to(&builder.link_target, 100)
        } else {
            builder.link_target.clone()
        };

        let fields = HeaderFields {
            name,
            mode: builder.mode,
            uid: builder.uid,
            gid: builder.gid,
            size: data.len() as u64,
            mtime: builder.mtime,
            typeflag: builder.entry_type.to_typeflag(),
            linkname: link_target,
            uname: builder.uname,
            gname: builder.gname,
            devmajor: builder.devmajor,
            devminor: builder.devminor,
            prefix,
        };

        self.inner.write_all(&header::build_block(&fields))?;
        self.inner.write_all(data)?;
        self.write_padding(data.len() as u64)?;
        Ok(())
    }

    /// Finalize the archive: two all-zero 512-byte blocks mark the end.
    pub fn finish(mut self) -> Result<W, TarError> {
        self.inner.write_all(&[0u8; BLOCK_SIZE * 2])?;
        self.finished = true;
        Ok(self.inner)
    }

    fn write_gnu_extension(&mut self, kind: EntryType, content: &str) -> Result<(), TarError> {
        let mut payload = content.as_bytes().to_vec();
        payload.push(0);

        let fields = HeaderFields {
            name: GNU_LONGLINK_MARKER.to_string(),
            mode: 0,
            size: payload.len() as u64,
            typeflag: kind.to_typeflag(),
            ..Default::default()
        };

        self.inner.write_all(&header::build_block(&fields))?;
        self.inner.write_all(&payload)?;
        self.write_padding(payload.len() as u64)?;
        Ok(())
    }

    fn write_padding(&mut self, data_len: u64) -> io::Result<()> {
        let rem = data_len % BLOCK_SIZE as u64;
        if rem != 0 {
            let pad = BLOCK_SIZE as u64 - rem;
            self.inner.write_all(&vec![0u8; pad as usize])?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for TarWriter<W> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("TarWriter dropped without calling finish(); archive is incomplete");
        }
    }
}

fn truncate_to(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TarReader;

    #[test]
    fn writes_a_well_formed_header() {
        let mut buf = Vec::new();
        {
            let mut w = TarWriter::new(&mut buf);
            w.append_data("file.txt", b"content", EntryBuilder::file(0o644))
                .unwrap();
            w.finish().unwrap();
        }
        assert_eq!(buf.len() % BLOCK_SIZE, 0);

        let mut r = TarReader::new(&buf[..]);
        let e = r.next().unwrap().unwrap();
        assert_eq!(e.path, "file.txt");
        assert_eq!(e.mode, 0o644);
    }

    #[test]
    fn splits_path_into_prefix_and_name() {
        let long_dir = "d".repeat(120);
        let path = format!("{long_dir}/file.txt");
        let mut buf = Vec::new();
        {
            let mut w = TarWriter::new(&mut buf);
            w.append_data(&path, b"x", EntryBuilder::file(0o644)).unwrap();
            w.finish().unwrap();
        }
        let mut r = TarReader::new(&buf[..]);
        let e = r.next().unwrap().unwrap();
        assert_eq!(e.path, path);
    }
}
