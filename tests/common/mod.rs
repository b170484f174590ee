//! Scripted transport for driving the controller through exact interleavings.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chunkstream_upload::source::{ByteSource, MemorySource};
use chunkstream_upload::transport::{
    AbortRequest, ChunkUpload, ContentType, MergeRequest, RequestOptions, ResultCode, StatusQuery,
    StatusReply, TransportError, TransportResult, UploadTransport, STATUS_STORED,
};
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Status {
        file_hash: String,
    },
    Upload {
        transfer_id: String,
        block_num: u32,
        block_hash: String,
        len: usize,
    },
    Merge {
        transfer_id: String,
    },
    Abort {
        transfer_id: String,
    },
}

/// Holds one request or read in flight until released.
#[derive(Default)]
pub struct Gate {
    arrived: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated request is in flight.
    pub async fn arrived(&self) {
        self.arrived.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    stored: Mutex<HashMap<String, String>>,
    gates: Mutex<HashMap<u32, Arc<Gate>>>,
    failures: Mutex<HashMap<u32, usize>>,
    next_transfer: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    progress_probe: Mutex<Option<watch::Receiver<f64>>>,
    progress_at_merge: Mutex<Option<f64>>,
    content_types: Mutex<Vec<(&'static str, ContentType)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Report `file_hash` as already stored under `file_id`.
    pub fn mark_stored(&self, file_hash: &str, file_id: &str) {
        self.stored
            .lock()
            .insert(file_hash.to_string(), file_id.to_string());
    }

    /// Hold the next request for `block_num` until the returned gate is released.
    pub fn gate_block(&self, block_num: u32) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().insert(block_num, gate.clone());
        gate
    }

    /// Reject the next request for `block_num`.
    pub fn fail_block(&self, block_num: u32) {
        *self.failures.lock().entry(block_num).or_insert(0) += 1;
    }

    /// Record the progress value seen when merge is called.
    pub fn probe_progress(&self, rx: watch::Receiver<f64>) {
        *self.progress_probe.lock() = Some(rx);
    }

    pub fn progress_at_merge(&self) -> Option<f64> {
        *self.progress_at_merge.lock()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn uploaded_blocks(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Upload { block_num, .. } => Some(*block_num),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .cloned()
            .collect()
    }

    pub fn status_checks(&self) -> usize {
        self.count(|c| matches!(c, Call::Status { .. }))
    }

    pub fn merges(&self) -> usize {
        self.count(|c| matches!(c, Call::Merge { .. }))
    }

    pub fn aborts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Abort { transfer_id } => Some(transfer_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Content type used per operation, in call order.
    pub fn content_types(&self) -> Vec<(&'static str, ContentType)> {
        self.content_types.lock().clone()
    }

    fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| f(c)).count()
    }

    fn take_failure(&self, block_num: u32) -> bool {
        let mut failures = self.failures.lock();
        match failures.get_mut(&block_num) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl UploadTransport for MockTransport {
    async fn check_status(
        &self,
        query: StatusQuery,
        options: RequestOptions,
    ) -> TransportResult<StatusReply> {
        self.content_types
            .lock()
            .push(("status", options.content_type));
        self.calls.lock().push(Call::Status {
            file_hash: query.file_hash.clone(),
        });

        let stored = self.stored.lock().get(&query.file_hash).cloned();
        if let Some(file_id) = stored {
            return Ok(StatusReply {
                status: STATUS_STORED,
                file_id,
            });
        }

        let n = self.next_transfer.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StatusReply {
            status: 0,
            file_id: format!("transfer-{n}"),
        })
    }

    async fn upload_chunk(
        &self,
        chunk: ChunkUpload,
        options: RequestOptions,
    ) -> TransportResult<()> {
        self.content_types
            .lock()
            .push(("upload", options.content_type));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Let sibling requests of the window start before this one settles
        tokio::task::yield_now().await;

        let gate = self.gates.lock().remove(&chunk.block_num);
        if let Some(gate) = gate {
            gate.arrived.notify_one();
            gate.release.notified().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().push(Call::Upload {
            transfer_id: chunk.transfer_id.clone(),
            block_num: chunk.block_num,
            block_hash: chunk.block_hash.clone(),
            len: chunk.data.len(),
        });

        if self.take_failure(chunk.block_num) {
            return Err(TransportError::Rejected {
                code: ResultCode::Failed as i64,
                message: format!("block {} rejected", chunk.block_num),
            });
        }
        Ok(())
    }

    async fn merge(
        &self,
        request: MergeRequest,
        options: RequestOptions,
    ) -> TransportResult<String> {
        self.content_types
            .lock()
            .push(("merge", options.content_type));
        let probed = self
            .progress_probe
            .lock()
            .as_ref()
            .map(|rx| *rx.borrow());
        *self.progress_at_merge.lock() = probed;

        self.calls.lock().push(Call::Merge {
            transfer_id: request.transfer_id.clone(),
        });
        Ok(format!("file-{}", request.transfer_id))
    }

    async fn abort(&self, request: AbortRequest, _options: RequestOptions) -> TransportResult<()> {
        self.calls.lock().push(Call::Abort {
            transfer_id: request.transfer_id,
        });
        Ok(())
    }
}

/// In-memory source whose first read waits on a gate, to hold whole-file hashing.
pub struct GatedSource {
    inner: MemorySource,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl GatedSource {
    pub fn new(data: Vec<u8>) -> (Arc<Self>, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        let source = Arc::new(Self {
            inner: MemorySource::new(data),
            gate: Mutex::new(Some(gate.clone())),
        });
        (source, gate)
    }
}

#[async_trait]
impl ByteSource for GatedSource {
    fn size(&self) -> u64 {
        self.inner.size()
    }

    async fn read_range(&self, offset: u64, len: usize) -> std::io::Result<Bytes> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.arrived.notify_one();
            gate.release.notified().await;
        }
        self.inner.read_range(offset, len).await
    }
}
