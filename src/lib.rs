//! Resumable, content-addressed chunked upload engine.
//!
//! A file is hashed, checked against the remote store for an existing copy,
//! cut into fixed-size chunks and sent in windows of concurrent requests. The
//! cursor only moves once a whole window is acknowledged, so a paused, failed
//! or restarted upload picks up at a window boundary.

pub mod chunk;
pub mod config;
pub mod controller;
pub mod hash;
pub mod metrics;
pub mod progress;
pub mod session;
pub mod source;
pub mod transport;

pub use config::UploadConfig;
pub use controller::{TransferController, UploadError, UploadOutcome, UploadRequest, UploadResult};
pub use session::{Operation, UploadStatus};
pub use source::{ByteSource, FileSource, MemorySource};
pub use transport::{InMemoryStore, UploadTransport};
