//! Upload metrics
//!
//! Counters and histograms go through the `metrics` facade. Nothing is
//! exported here; the embedding application installs whatever recorder it
//! wants, and without one every call is a no-op.

pub mod recorder;

pub use recorder::{
    init_metrics, record_chunk_sent, record_dedup_hit, record_window, TransferMetrics,
    WindowTimer,
};
