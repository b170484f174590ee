use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::chunk::{Chunk, ChunkPlanner};
use crate::controller::error::{UploadError, UploadResult};
use crate::hash::HashComputer;
use crate::metrics::{record_chunk_sent, WindowTimer};
use crate::session::TransferSession;
use crate::source::ByteSource;
use crate::transport::{ChunkUpload, RequestOptions, UploadTransport};

/// Walks a session's chunks in windows of `concurrency`, one barrier per window.
pub struct UploadScheduler {
    planner: ChunkPlanner,
    hasher: HashComputer,
    transport: Arc<dyn UploadTransport>,
    concurrency: u32,
}

impl UploadScheduler {
    pub fn new(
        planner: ChunkPlanner,
        hasher: HashComputer,
        transport: Arc<dyn UploadTransport>,
        concurrency: usize,
    ) -> Self {
        Self {
            planner,
            hasher,
            transport,
            concurrency: u32::try_from(concurrency.max(1)).unwrap_or(u32::MAX),
        }
    }

    /// Upload every chunk from the session cursor to the end.
    ///
    /// Returns `Ok(true)` when all chunks are confirmed, `Ok(false)` when the
    /// session intent stopped the loop at a window boundary. A failed request
    /// fails the whole window, after all its siblings have settled, and leaves
    /// the cursor at the window start.
    pub async fn run(
        &self,
        session: &TransferSession,
        source: &dyn ByteSource,
    ) -> UploadResult<bool> {
        let total_size = source.size();
        let total_chunks = self.planner.plan(total_size)?;
        let transfer_id = session.transfer_id();
        let file_hash = session.file_hash();

        let mut window_start = session.cursor();
        while window_start < total_chunks {
            let operation = session.operation();
            if !operation.permits_upload() {
                debug!(
                    transfer_id = %transfer_id,
                    cursor = window_start,
                    ?operation,
                    "Leaving upload loop at window boundary"
                );
                return Ok(false);
            }

            let window_end = window_start
                .saturating_add(self.concurrency)
                .min(total_chunks);
            let timer = WindowTimer::start((window_end - window_start) as usize);

            let uploads = (window_start..window_end).map(|index| {
                self.send_chunk(session, source, &transfer_id, &file_hash, index, total_size)
            });
            // Every request settles before the window is judged
            let results = join_all(uploads).await;
            if let Some(err) = results.into_iter().find_map(|r| r.err()) {
                debug!(
                    transfer_id = %transfer_id,
                    window_start,
                    window_end,
                    error = %err,
                    "Window failed"
                );
                return Err(err);
            }

            timer.stop();
            session.advance_cursor(window_end);
            debug!(
                transfer_id = %transfer_id,
                window_start,
                window_end,
                progress = session.progress().percent(),
                "Window confirmed"
            );

            window_start = window_end;
        }

        Ok(true)
    }

    async fn send_chunk(
        &self,
        session: &TransferSession,
        source: &dyn ByteSource,
        transfer_id: &str,
        file_hash: &str,
        index: u32,
        total_size: u64,
    ) -> UploadResult<()> {
        let range = self.planner.range_for(index, total_size)?;
        let data = source.read_range(range.start, range.len()).await?;
        if data.len() != range.len() {
            return Err(UploadError::ShortChunk {
                index,
                expected: range.len(),
                actual: data.len(),
            });
        }

        let chunk = Chunk {
            range,
            digest: self.hasher.digest_bytes(&data),
            data,
        };
        let len = chunk.data.len();

        self.transport
            .upload_chunk(
                ChunkUpload {
                    transfer_id: transfer_id.to_string(),
                    file_hash: file_hash.to_string(),
                    block_num: chunk.range.block_num(),
                    block_hash: chunk.digest.to_hex(),
                    data: chunk.data,
                },
                RequestOptions::multipart(),
            )
            .await?;

        record_chunk_sent(len);
        let percent = session.progress().record_chunk(index);
        debug!(chunk = range.block_num(), percent, "Chunk acknowledged");
        Ok(())
    }
}
