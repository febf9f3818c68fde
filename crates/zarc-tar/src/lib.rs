//! POSIX.1-1988 ustar reader/writer with GNU long-name/long-link support.

mod entry;
mod error;
mod header;
mod reader;
mod writer;

pub use entry::{Entry, EntryType, OwnedEntry};
pub use error::TarError;
pub use header::BLOCK_SIZE;
pub use reader::TarReader;
pub use writer::{EntryBuilder, TarWriter};
