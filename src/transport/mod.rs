//! Remote store collaborator.
//!
//! The engine speaks to the remote side only through [`UploadTransport`]. HTTP,
//! retries, timeouts and authentication all belong to the implementation.

mod envelope;
mod error;
mod memory;
mod types;

pub use envelope::{describe_http_status, ResponseEnvelope, ResultCode};
pub use error::{TransportError, TransportResult};
pub use memory::{InMemoryStore, StoreStats};
pub use types::{
    AbortRequest, ChunkUpload, ContentType, Endpoint, MergeRequest, RequestOptions, StatusQuery,
    StatusReply, STATUS_STORED,
};

use async_trait::async_trait;

/// The four remote operations the engine needs.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Look up content by hash. Either reports it stored or allocates a transfer.
    async fn check_status(
        &self,
        query: StatusQuery,
        options: RequestOptions,
    ) -> TransportResult<StatusReply>;

    /// Send one chunk. Idempotent per `(transfer_id, block_num)`.
    async fn upload_chunk(&self, chunk: ChunkUpload, options: RequestOptions)
        -> TransportResult<()>;

    /// Finalize a transfer and return the stored file id.
    async fn merge(&self, request: MergeRequest, options: RequestOptions)
        -> TransportResult<String>;

    /// Discard a transfer. Best-effort.
    async fn abort(&self, request: AbortRequest, options: RequestOptions) -> TransportResult<()>;
}
