use std::sync::Arc;

use async_trait::async_trait;
use chunkstream_upload::hash::HashComputer;
use chunkstream_upload::transport::{
    AbortRequest, ChunkUpload, MergeRequest, RequestOptions, StatusQuery, StatusReply,
    TransportResult,
};
use chunkstream_upload::{
    FileSource, InMemoryStore, TransferController, UploadConfig, UploadRequest, UploadTransport,
};
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::time::{sleep, Duration};

/// In-memory store with a little latency on every chunk, so pause has time to land.
struct SlowStore {
    inner: InMemoryStore,
    delay: Duration,
}

#[async_trait]
impl UploadTransport for SlowStore {
    async fn check_status(
        &self,
        query: StatusQuery,
        options: RequestOptions,
    ) -> TransportResult<StatusReply> {
        self.inner.check_status(query, options).await
    }

    async fn upload_chunk(
        &self,
        chunk: ChunkUpload,
        options: RequestOptions,
    ) -> TransportResult<()> {
        sleep(self.delay).await;
        self.inner.upload_chunk(chunk, options).await
    }

    async fn merge(
        &self,
        request: MergeRequest,
        options: RequestOptions,
    ) -> TransportResult<String> {
        self.inner.merge(request, options).await
    }

    async fn abort(&self, request: AbortRequest, options: RequestOptions) -> TransportResult<()> {
        self.inner.abort(request, options).await
    }
}

#[tokio::main]
async fn main() {
    println!("\n📤 Chunked Upload Engine Demo");
    println!("=============================\n");

    let store = Arc::new(SlowStore {
        inner: InMemoryStore::new(HashComputer::default()),
        delay: Duration::from_millis(20),
    });
    let config = UploadConfig::default()
        .with_chunk_size(64 * 1024)
        .with_concurrency(4);
    let controller = Arc::new(TransferController::new(config, store.clone()).unwrap());

    let mut file = NamedTempFile::new().unwrap();
    let data: Vec<u8> = (0..2 * 1024 * 1024).map(|i| (i % 253) as u8).collect();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    // Demo 1: start, pause half-way, resume
    println!("📦 Demo 1: Pause and resume");
    println!("---------------------------");

    let mut progress = controller.subscribe_progress();
    let watcher = {
        let controller = controller.clone();
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let percent = *progress.borrow_and_update();
                if percent >= 50.0 && percent < 100.0 {
                    controller.pause();
                    break;
                }
            }
        })
    };

    let source = FileSource::open(file.path()).await.unwrap();
    let name = source.file_name();
    let outcome = controller
        .start(Some(UploadRequest::new(Arc::new(source), name)))
        .await
        .unwrap();
    watcher.await.unwrap();

    let snapshot = controller.snapshot();
    println!("✅ First run ended: {:?}", outcome);
    println!(
        "   Status: {:?}, cursor {}/{}, progress {:.1}%",
        snapshot.status, snapshot.cursor, snapshot.total_chunks, snapshot.progress
    );

    let outcome = controller.start(None).await.unwrap();
    println!("✅ Resumed run ended: {:?}", outcome);
    println!("   Progress: {:.1}%", controller.progress());

    let file_id = outcome.file_id().unwrap_or_default().to_string();
    let stored = store.inner.file(&file_id).map(|b| b.len()).unwrap_or(0);
    println!("   Stored {} bytes as {}", stored, file_id);

    // Demo 2: same content again is a dedup hit
    println!("\n\n♻️  Demo 2: Deduplication");
    println!("---------------------------");

    let before = store.inner.stats().chunk_uploads;
    let source = FileSource::open(file.path()).await.unwrap();
    let outcome = controller
        .start(Some(UploadRequest::new(Arc::new(source), "copy.bin")))
        .await
        .unwrap();
    println!("✅ {:?}", outcome);
    println!(
        "   Chunk requests sent: {}",
        store.inner.stats().chunk_uploads - before
    );

    // Demo 3: stop discards the remote transfer
    println!("\n\n🛑 Demo 3: Stop");
    println!("---------------------------");

    let other: Vec<u8> = (0..512 * 1024).map(|i| (i % 7) as u8).collect();
    let task = {
        let controller = controller.clone();
        let req = UploadRequest::new(
            Arc::new(chunkstream_upload::MemorySource::new(other)),
            "other.bin",
        );
        tokio::spawn(async move { controller.start(Some(req)).await })
    };
    sleep(Duration::from_millis(10)).await;
    controller.stop().await;

    let outcome = task.await.unwrap();
    println!("✅ Run ended: {:?}", outcome);
    println!(
        "   Status: {:?}, pending remote transfers: {}",
        controller.status(),
        store.inner.pending_transfers()
    );

    println!("\n✨ Demo complete");
}
