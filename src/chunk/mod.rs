pub mod error;
pub mod planner;
pub mod types;

pub use error::{ChunkError, Result};
pub use planner::{ChunkPlanner, DEFAULT_CHUNK_SIZE};
pub use types::{Chunk, ChunkRange};
