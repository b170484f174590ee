mod tracker;

pub use tracker::{ProgressTracker, COMPLETE, UPLOAD_SHARE};
