mod computer;
mod error;
mod types;

pub use computer::HashComputer;
pub use error::{HashError, HashResult};
pub use types::{ByteRange, Digest, DigestAlgorithm};
