use std::fmt;
use std::sync::Arc;

use crate::source::ByteSource;

/// A new file for [`TransferController::start`](super::TransferController::start).
#[derive(Clone)]
pub struct UploadRequest {
    pub source: Arc<dyn ByteSource>,
    pub file_name: String,
    /// Precomputed whole-file hash (hex). Computed on demand when absent.
    pub file_hash: Option<String>,
}

impl UploadRequest {
    pub fn new(source: Arc<dyn ByteSource>, file_name: impl Into<String>) -> Self {
        Self {
            source,
            file_name: file_name.into(),
            file_hash: None,
        }
    }

    pub fn with_hash(mut self, file_hash: impl Into<String>) -> Self {
        self.file_hash = Some(file_hash.into());
        self
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("size", &self.source.size())
            .field("file_name", &self.file_name)
            .field("file_hash", &self.file_hash)
            .finish()
    }
}

/// How a `start` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// All chunks sent and merged
    Completed { file_id: String },
    /// The remote side already had the content
    Deduplicated { file_id: String },
    /// Left at a window boundary on a pause; resumable
    Paused,
    /// Left at a window boundary on a stop; the transfer was reset
    Stopped,
}

impl UploadOutcome {
    /// Remote file id, or `None` if the call ended early.
    pub fn file_id(&self) -> Option<&str> {
        match self {
            UploadOutcome::Completed { file_id } | UploadOutcome::Deduplicated { file_id } => {
                Some(file_id)
            }
            UploadOutcome::Paused | UploadOutcome::Stopped => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.file_id().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn test_outcome_file_id() {
        let done = UploadOutcome::Completed {
            file_id: "f-1".into(),
        };
        assert_eq!(done.file_id(), Some("f-1"));
        assert!(done.is_finished());

        assert_eq!(UploadOutcome::Paused.file_id(), None);
        assert!(!UploadOutcome::Stopped.is_finished());
    }

    #[test]
    fn test_request_debug_hides_source() {
        let req = UploadRequest::new(Arc::new(MemorySource::new(vec![0u8; 16])), "a.bin")
            .with_hash("abcd");
        let text = format!("{:?}", req);
        assert!(text.contains("size: 16"));
        assert!(text.contains("abcd"));
    }
}
