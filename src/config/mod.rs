//! Engine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::hash::DigestAlgorithm;

/// Chunks uploaded concurrently per window
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Internal read window of the hash computer (256 KiB)
pub const DEFAULT_HASH_READ_WINDOW: usize = 256 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Fixed size of every chunk but the last
    pub chunk_size: u64,
    /// Maximum chunk requests in flight per window
    pub concurrency: usize,
    /// Bytes read per step while hashing
    pub hash_read_window: usize,
    pub digest: DigestAlgorithm,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            hash_read_window: DEFAULT_HASH_READ_WINDOW,
            digest: DigestAlgorithm::Sha256,
        }
    }
}

impl UploadConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_hash_read_window(mut self, hash_read_window: usize) -> Self {
        self.hash_read_window = hash_read_window;
        self
    }

    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be greater than zero".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be greater than zero".into()));
        }
        if self.hash_read_window == 0 {
            return Err(ConfigError::Invalid(
                "hash_read_window must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
