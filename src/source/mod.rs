//! Byte sources the engine uploads from.
//!
//! A source is owned by the caller and only ever read: the engine asks for its
//! size and for byte ranges, nothing else.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use async_trait::async_trait;
use bytes::Bytes;

/// Read-only access to the bytes of one file.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Total size in bytes. Must not change for the lifetime of a transfer.
    fn size(&self) -> u64;

    /// Read `len` bytes starting at `offset`.
    ///
    /// Implementations return fewer bytes only when the range runs past the end
    /// of the source.
    async fn read_range(&self, offset: u64, len: usize) -> std::io::Result<Bytes>;
}
