use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("Chunk index {index} out of range: file has {count} chunks")]
    IndexOutOfRange { index: u32, count: u32 },

    #[error("File of {total_size} bytes needs more than u32::MAX chunks of {chunk_size} bytes")]
    TooManyChunks { total_size: u64, chunk_size: u64 },
}

pub type Result<T> = std::result::Result<T, ChunkError>;
