use parking_lot::Mutex;
use std::collections::HashSet;
use tokio::sync::watch;

/// Share of the percentage earned by chunk acknowledgements. The last unit is
/// reserved for the merge step.
pub const UPLOAD_SHARE: f64 = 99.0;

pub const COMPLETE: f64 = 100.0;

/// Turns per-chunk acknowledgements into a 0-100 percentage.
///
/// Acknowledgements are counted per distinct chunk index, so a chunk sent twice
/// (a window retried after a sibling failed) is only counted once and the value
/// never moves backwards until [`reset`](Self::reset).
pub struct ProgressTracker {
    inner: Mutex<TrackerInner>,
    tx: watch::Sender<f64>,
}

struct TrackerInner {
    total_chunks: u32,
    confirmed: HashSet<u32>,
    percent: f64,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0.0);
        Self {
            inner: Mutex::new(TrackerInner {
                total_chunks: 0,
                confirmed: HashSet::new(),
                percent: 0.0,
            }),
            tx,
        }
    }

    /// Start over for a transfer of `total_chunks` chunks.
    pub fn reset(&self, total_chunks: u32) {
        let mut inner = self.inner.lock();
        inner.total_chunks = total_chunks;
        inner.confirmed.clear();
        inner.percent = 0.0;
        self.tx.send_replace(0.0);
    }

    /// Record that chunk `index` (0-based) was acknowledged. Returns the new percentage.
    pub fn record_chunk(&self, index: u32) -> f64 {
        let mut inner = self.inner.lock();
        if index >= inner.total_chunks || inner.percent >= COMPLETE {
            return inner.percent;
        }
        if !inner.confirmed.insert(index) {
            return inner.percent;
        }

        let earned =
            (inner.confirmed.len() as f64 * UPLOAD_SHARE) / inner.total_chunks as f64;
        inner.percent = inner.percent.max(earned.min(UPLOAD_SHARE));
        self.tx.send_replace(inner.percent);
        inner.percent
    }

    /// Report 100%. Only called once the transfer is finalized remotely.
    pub fn complete(&self) {
        let mut inner = self.inner.lock();
        inner.percent = COMPLETE;
        self.tx.send_replace(COMPLETE);
    }

    pub fn percent(&self) -> f64 {
        self.inner.lock().percent
    }

    pub fn confirmed_chunks(&self) -> usize {
        self.inner.lock().confirmed.len()
    }

    pub fn total_chunks(&self) -> u32 {
        self.inner.lock().total_chunks
    }

    /// Watch the percentage as it changes.
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.tx.subscribe()
    }
}
