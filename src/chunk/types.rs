use bytes::Bytes;

use crate::hash::Digest;

/// Byte range of one chunk. `index` is 0-based; the wire uses `index + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: u32,
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    /// 1-based block number sent to the remote side.
    pub fn block_num(&self) -> u32 {
        self.index + 1
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A chunk read for one upload attempt. Never cached across attempts.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub range: ChunkRange,
    pub digest: Digest,
    pub data: Bytes,
}
