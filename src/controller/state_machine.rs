use crate::controller::error::{UploadError, UploadResult};
use crate::session::UploadStatus;

/// Things that move an upload between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// Whole-file digest started
    BeginHash,
    /// Existence check about to be sent, or a resume
    BeginUpload,
    /// Scheduler left the loop on a pause intent
    Paused,
    /// Stop applied
    Stopped,
    /// Merge call succeeded
    Merged,
    /// Existence check reported the content already stored
    Deduplicated,
    /// A remote call or a read failed
    Failed,
}

/// Transition table for [`UploadStatus`].
pub struct StatusMachine;

impl StatusMachine {
    pub fn next(current: UploadStatus, event: StatusEvent) -> UploadResult<UploadStatus> {
        let next = match (current, event) {
            // Hashing and negotiating never interrupt a running upload
            (UploadStatus::Upload, StatusEvent::BeginHash | StatusEvent::BeginUpload) => {
                return Err(Self::invalid(current, event));
            }
            (_, StatusEvent::BeginHash) => UploadStatus::CalcHash,
            (_, StatusEvent::BeginUpload) => UploadStatus::Upload,

            (UploadStatus::Upload, StatusEvent::Paused) => UploadStatus::Pause,

            (UploadStatus::Success, StatusEvent::Stopped) => {
                return Err(Self::invalid(current, event));
            }
            (_, StatusEvent::Stopped) => UploadStatus::Stop,

            (UploadStatus::Upload, StatusEvent::Merged) => UploadStatus::Success,

            (UploadStatus::Upload | UploadStatus::CalcHash, StatusEvent::Deduplicated) => {
                UploadStatus::Success
            }

            (UploadStatus::Upload | UploadStatus::CalcHash, StatusEvent::Failed) => {
                UploadStatus::Stop
            }

            _ => return Err(Self::invalid(current, event)),
        };

        Ok(next)
    }

    fn invalid(current: UploadStatus, event: StatusEvent) -> UploadError {
        UploadError::InvalidStateTransition(format!(
            "Cannot handle {:?} in status {:?}",
            event, current
        ))
    }
}
