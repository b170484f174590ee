use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file given and no transfer to resume or restart")]
    NoActiveTransfer,

    #[error("Source is empty: nothing to upload")]
    EmptySource,

    #[error("An upload is already running on this session")]
    AlreadyRunning,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Chunk {index} read returned {actual} bytes, expected {expected}")]
    ShortChunk {
        index: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Chunk error: {0}")]
    Chunk(#[from] crate::chunk::ChunkError),

    #[error("Hash error: {0}")]
    Hash(#[from] crate::hash::HashError),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Short label used as a metrics tag.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::NoActiveTransfer => "no_active_transfer",
            UploadError::EmptySource => "empty_source",
            UploadError::AlreadyRunning => "already_running",
            UploadError::InvalidStateTransition(_) => "invalid_transition",
            UploadError::ShortChunk { .. } => "short_chunk",
            UploadError::Config(_) => "config",
            UploadError::Chunk(_) => "chunk",
            UploadError::Hash(_) => "hash",
            UploadError::Transport(_) => "transport",
            UploadError::Io(_) => "io",
        }
    }
}

pub type UploadResult<T> = Result<T, UploadError>;
