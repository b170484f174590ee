//! Metrics recorder for chunked uploads

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Register metric descriptions. Safe to call more than once.
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    describe_counter!("upload_chunks_sent_total", "Chunks acknowledged by the server");
    describe_counter!("upload_bytes_sent_total", "Payload bytes acknowledged by the server");
    describe_counter!("upload_windows_total", "Concurrency windows completed");
    describe_counter!(
        "upload_dedup_hits_total",
        "Uploads short-circuited because the server already had the file"
    );

    describe_counter!("upload_transfers_started_total", "Upload runs started");
    describe_counter!("upload_transfers_completed_total", "Uploads merged successfully");
    describe_counter!("upload_transfers_failed_total", "Upload runs ended by an error");
    describe_counter!("upload_transfers_stopped_total", "Uploads stopped by the caller");

    describe_histogram!(
        "upload_window_duration_seconds",
        "Time from dispatching a window to its barrier"
    );
    describe_histogram!(
        "upload_transfer_duration_seconds",
        "Duration of a run that ended in a merge"
    );
}

// ============== Chunk Operations ==============

pub fn record_chunk_sent(chunk_len: usize) {
    counter!("upload_chunks_sent_total").increment(1);
    counter!("upload_bytes_sent_total").increment(chunk_len as u64);
}

/// Record a window that passed its barrier
pub fn record_window(chunks: usize, duration: Duration) {
    counter!("upload_windows_total").increment(1);
    histogram!("upload_window_duration_seconds", "chunks" => chunks.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_dedup_hit() {
    counter!("upload_dedup_hits_total").increment(1);
}

// ============== Transfer Operations ==============

/// Tracks one `start` call from dispatch to outcome.
pub struct TransferMetrics {
    intent: &'static str,
    start_time: Instant,
}

impl TransferMetrics {
    pub fn start(intent: &'static str) -> Self {
        counter!("upload_transfers_started_total", "intent" => intent).increment(1);
        Self {
            intent,
            start_time: Instant::now(),
        }
    }

    pub fn complete(self) {
        counter!("upload_transfers_completed_total", "intent" => self.intent).increment(1);
        histogram!("upload_transfer_duration_seconds").record(self.elapsed().as_secs_f64());
    }

    pub fn fail(self, reason: &str) {
        counter!(
            "upload_transfers_failed_total",
            "intent" => self.intent,
            "reason" => reason.to_string()
        )
        .increment(1);
    }

    pub fn stopped(self) {
        counter!("upload_transfers_stopped_total", "intent" => self.intent).increment(1);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Times a single window
pub struct WindowTimer {
    chunks: usize,
    start_time: Instant,
}

impl WindowTimer {
    pub fn start(chunks: usize) -> Self {
        Self {
            chunks,
            start_time: Instant::now(),
        }
    }

    /// Record the window as completed
    pub fn stop(self) {
        record_window(self.chunks, self.start_time.elapsed());
    }
}
