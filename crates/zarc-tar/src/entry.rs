//! The entry metadata surface shared by the reader and writer.

pub use crate::header::EntryType;

/// One archive member's metadata, borrowed from the reader's internal
/// scratch buffers. Valid only until the next call to `TarReader::next()`;
/// call `to_owned_entry()` to keep it around longer.
#[derive(Debug)]
pub struct Entry<'a> {
    pub path: &'a str,
    pub link_target: &'a str,
    pub entry_type: EntryType,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: i64,
    pub uname: &'a str,
    pub gname: &'a str,
    pub devmajor: u32,
    pub devminor: u32,
}

impl Entry<'_> {
    pub fn to_owned_entry(&self) -> OwnedEntry {
        OwnedEntry {
            path: self.path.to_string(),
            link_target: self.link_target.to_string(),
            entry_type: self.entry_type,
            mode: self.mode,
            uid: self.uid,
            gid: self.gid,
            size: self.size,
            mtime: self.mtime,
            uname: self.uname.to_string(),
            gname: self.gname.to_string(),
            devmajor: self.devmajor,
            devminor: self.devminor,
        }
    }
}

/// A deep copy of `Entry` with no borrow, for callers that need to hold
/// metadata past the next read (e.g. building a full listing before acting
/// on any of it).
#[derive(Clone, Debug)]
pub struct OwnedEntry {
    pub path: String,
    pub link_target: String,
    pub entry_type: EntryType,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: i64,
    pub uname: String,
    pub gname: String,
    pub devmajor: u32,
    pub devminor: u32,
}
