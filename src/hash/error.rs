use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Range {start}..{end} is outside of source of {size} bytes")]
    RangeOutOfBounds { start: u64, end: u64, size: u64 },

    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Read window must be greater than zero")]
    InvalidReadWindow,
}

pub type HashResult<T> = Result<T, HashError>;
