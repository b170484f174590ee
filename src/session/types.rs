use serde::{Deserialize, Serialize};

/// Last intent requested by the caller. Read cooperatively by the scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    None,
    Start,
    Pause,
    Stop,
    Continue,
    Restart,
}

impl Operation {
    /// Whether the scheduler may begin another window.
    pub fn permits_upload(&self) -> bool {
        matches!(
            self,
            Operation::Start | Operation::Continue | Operation::Restart
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::None => "none",
            Operation::Start => "start",
            Operation::Pause => "pause",
            Operation::Stop => "stop",
            Operation::Continue => "continue",
            Operation::Restart => "restart",
        }
    }
}

/// Externally observable lifecycle phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum UploadStatus {
    /// No file attached
    #[default]
    None,
    /// File attached, nothing done yet
    Init,
    CalcHash,
    Upload,
    Pause,
    /// Stopped by the caller, or failed
    Stop,
    Success,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, UploadStatus::Init | UploadStatus::Pause)
    }

    pub fn can_pause(&self) -> bool {
        matches!(self, UploadStatus::Upload)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, UploadStatus::Upload | UploadStatus::Pause)
    }

    pub fn can_restart(&self) -> bool {
        matches!(self, UploadStatus::Stop)
    }
}

/// Point-in-time copy of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub transfer_id: String,
    pub file_hash: String,
    pub file_name: String,
    pub cursor: u32,
    pub total_chunks: u32,
    pub operation: Operation,
    pub status: UploadStatus,
    pub progress: f64,
    pub uploading: bool,
    pub updated_at: i64,
}
