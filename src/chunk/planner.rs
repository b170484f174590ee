use super::error::{ChunkError, Result};
use super::types::ChunkRange;

/// Default chunk size: 5 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Derives fixed-size chunk ranges from a file size. Stateless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlanner {
    chunk_size: u64,
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ChunkPlanner {
    pub fn new(chunk_size: u64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidChunkSize(
                "chunk size must be greater than zero".into(),
            ));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// `ceil(total_size / chunk_size)`. A zero-byte file has no chunks.
    pub fn plan(&self, total_size: u64) -> Result<u32> {
        let count = total_size.div_ceil(self.chunk_size);
        u32::try_from(count).map_err(|_| ChunkError::TooManyChunks {
            total_size,
            chunk_size: self.chunk_size,
        })
    }

    /// Range of chunk `index` (0-based). The last chunk is clamped to `total_size`.
    pub fn range_for(&self, index: u32, total_size: u64) -> Result<ChunkRange> {
        let count = self.plan(total_size)?;
        if index >= count {
            return Err(ChunkError::IndexOutOfRange { index, count });
        }

        let start = index as u64 * self.chunk_size;
        let end = std::cmp::min(start + self.chunk_size, total_size);
        Ok(ChunkRange { index, start, end })
    }
}
