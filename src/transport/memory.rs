//! In-process remote store.
//!
//! Behaves like the remote side of the upload protocol: content lookup by hash,
//! transfer allocation, per-block digest checks and ordered reassembly on merge.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::hash::HashComputer;
use crate::transport::error::{TransportError, TransportResult};
use crate::transport::envelope::ResultCode;
use crate::transport::types::{
    AbortRequest, ChunkUpload, MergeRequest, RequestOptions, StatusQuery, StatusReply,
    STATUS_STORED,
};
use crate::transport::UploadTransport;

#[derive(Debug, Clone)]
struct StoredFile {
    file_name: String,
    data: Bytes,
}

#[derive(Debug)]
struct PendingTransfer {
    file_hash: String,
    blocks: BTreeMap<u32, Bytes>,
}

/// Call counters, one per remote operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub status_checks: u64,
    pub chunk_uploads: u64,
    pub merges: u64,
    pub aborts: u64,
}

#[derive(Default)]
struct Counters {
    status_checks: AtomicU64,
    chunk_uploads: AtomicU64,
    merges: AtomicU64,
    aborts: AtomicU64,
}

pub struct InMemoryStore {
    hasher: HashComputer,
    files: DashMap<String, StoredFile>,
    by_hash: DashMap<String, String>,
    transfers: DashMap<String, PendingTransfer>,
    counters: Counters,
    unavailable: AtomicBool,
}

fn rejected(code: ResultCode, message: impl Into<String>) -> TransportError {
    TransportError::Rejected {
        code: code as i64,
        message: message.into(),
    }
}

impl InMemoryStore {
    /// `hasher` must use the same algorithm as the uploading engine.
    pub fn new(hasher: HashComputer) -> Self {
        Self {
            hasher,
            files: DashMap::new(),
            by_hash: DashMap::new(),
            transfers: DashMap::new(),
            counters: Counters::default(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Store content directly, as if uploaded earlier. Returns its file id.
    pub fn seed(&self, file_name: &str, data: impl Into<Bytes>) -> String {
        let data = data.into();
        let file_hash = self.hasher.digest_bytes(&data).to_hex();
        self.store(file_hash, file_name.to_string(), data)
    }

    fn store(&self, file_hash: String, file_name: String, data: Bytes) -> String {
        let file_id = uuid::Uuid::new_v4().to_string();
        self.files
            .insert(file_id.clone(), StoredFile { file_name, data });
        self.by_hash.insert(file_hash, file_id.clone());
        file_id
    }

    pub fn file(&self, file_id: &str) -> Option<Bytes> {
        self.files.get(file_id).map(|f| f.data.clone())
    }

    pub fn file_name(&self, file_id: &str) -> Option<String> {
        self.files.get(file_id).map(|f| f.file_name.clone())
    }

    pub fn pending_transfers(&self) -> usize {
        self.transfers.len()
    }

    /// Block numbers received so far for a transfer, ascending.
    pub fn received_blocks(&self, transfer_id: &str) -> Vec<u32> {
        self.transfers
            .get(transfer_id)
            .map(|t| t.blocks.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Simulate an outage: while unavailable every call fails with HTTP 503.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> TransportResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TransportError::http(503));
        }
        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            status_checks: self.counters.status_checks.load(Ordering::Relaxed),
            chunk_uploads: self.counters.chunk_uploads.load(Ordering::Relaxed),
            merges: self.counters.merges.load(Ordering::Relaxed),
            aborts: self.counters.aborts.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl UploadTransport for InMemoryStore {
    async fn check_status(
        &self,
        query: StatusQuery,
        _options: RequestOptions,
    ) -> TransportResult<StatusReply> {
        self.counters.status_checks.fetch_add(1, Ordering::Relaxed);
        self.ensure_available()?;

        if let Some(file_id) = self.by_hash.get(&query.file_hash) {
            return Ok(StatusReply {
                status: STATUS_STORED,
                file_id: file_id.clone(),
            });
        }

        let transfer_id = uuid::Uuid::new_v4().to_string();
        self.transfers.insert(
            transfer_id.clone(),
            PendingTransfer {
                file_hash: query.file_hash,
                blocks: BTreeMap::new(),
            },
        );
        Ok(StatusReply {
            status: 0,
            file_id: transfer_id,
        })
    }

    async fn upload_chunk(
        &self,
        chunk: ChunkUpload,
        _options: RequestOptions,
    ) -> TransportResult<()> {
        self.counters.chunk_uploads.fetch_add(1, Ordering::Relaxed);
        self.ensure_available()?;

        if chunk.block_num == 0 {
            return Err(rejected(ResultCode::ValidateFailed, "blockNum is 1-based"));
        }
        if self.hasher.digest_bytes(&chunk.data).to_hex() != chunk.block_hash {
            return Err(rejected(
                ResultCode::ValidateFailed,
                format!("block {} hash mismatch", chunk.block_num),
            ));
        }

        let mut transfer = self.transfers.get_mut(&chunk.transfer_id).ok_or_else(|| {
            rejected(
                ResultCode::Failed,
                format!("unknown transfer {}", chunk.transfer_id),
            )
        })?;
        if transfer.file_hash != chunk.file_hash {
            return Err(rejected(
                ResultCode::ValidateFailed,
                "file hash does not match transfer",
            ));
        }
        transfer.blocks.insert(chunk.block_num, chunk.data);
        Ok(())
    }

    async fn merge(&self, request: MergeRequest, _options: RequestOptions) -> TransportResult<String> {
        self.counters.merges.fetch_add(1, Ordering::Relaxed);
        self.ensure_available()?;

        let assembled = {
            let transfer = self.transfers.get(&request.transfer_id).ok_or_else(|| {
                rejected(
                    ResultCode::Failed,
                    format!("unknown transfer {}", request.transfer_id),
                )
            })?;
            if transfer.file_hash != request.file_hash {
                return Err(rejected(
                    ResultCode::ValidateFailed,
                    "file hash does not match transfer",
                ));
            }

            // Blocks must be exactly 1..=n
            let contiguous = transfer
                .blocks
                .keys()
                .enumerate()
                .all(|(i, block)| *block as usize == i + 1);
            if !contiguous {
                return Err(rejected(ResultCode::Failed, "missing blocks"));
            }

            let mut assembled = BytesMut::new();
            for data in transfer.blocks.values() {
                assembled.extend_from_slice(data);
            }
            assembled.freeze()
        };

        if self.hasher.digest_bytes(&assembled).to_hex() != request.file_hash {
            return Err(rejected(ResultCode::Failed, "merged content hash mismatch"));
        }

        self.transfers.remove(&request.transfer_id);
        Ok(self.store(request.file_hash, request.file_name, assembled))
    }

    async fn abort(&self, request: AbortRequest, _options: RequestOptions) -> TransportResult<()> {
        self.counters.aborts.fetch_add(1, Ordering::Relaxed);
        self.ensure_available()?;
        self.transfers.remove(&request.transfer_id);
        Ok(())
    }
}
