use async_trait::async_trait;
use bytes::Bytes;

use super::ByteSource;

/// An in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_range(&self, offset: u64, len: usize) -> std::io::Result<Bytes> {
        let start = (offset as usize).min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data.slice(start..end))
    }
}
