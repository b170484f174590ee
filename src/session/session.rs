use parking_lot::RwLock;
use tokio::sync::watch;

use crate::controller::{StatusEvent, StatusMachine};
use crate::progress::ProgressTracker;
use crate::session::types::{Operation, SessionSnapshot, UploadStatus};
use crate::transport::AbortRequest;

/// What `stop` has to do right away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopAction {
    /// Nothing was in flight and the session is already reset. Carries the
    /// remote transfer to abort, if one had been negotiated.
    Reset(Option<AbortRequest>),
    /// An upload is in flight; the reset runs when it settles.
    Deferred,
    /// The transfer already succeeded.
    Ignored,
}

struct SessionState {
    transfer_id: String,
    file_hash: String,
    file_name: String,
    cursor: u32,
    total_chunks: u32,
    operation: Operation,
    status: UploadStatus,
    uploading: bool,
    updated_at: i64,
}

impl SessionState {
    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}

/// Resumable state of one logical transfer.
///
/// The scheduler writes cursor and progress, the controller writes the
/// operation; every field sits behind one lock so a stop request and the end of
/// an upload can never miss each other.
pub struct TransferSession {
    state: RwLock<SessionState>,
    progress: ProgressTracker,
    uploading_tx: watch::Sender<bool>,
}

impl Default for TransferSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferSession {
    pub fn new() -> Self {
        let (uploading_tx, _rx) = watch::channel(false);
        Self {
            state: RwLock::new(SessionState {
                transfer_id: String::new(),
                file_hash: String::new(),
                file_name: String::new(),
                cursor: 0,
                total_chunks: 0,
                operation: Operation::None,
                status: UploadStatus::None,
                uploading: false,
                updated_at: chrono::Utc::now().timestamp(),
            }),
            progress: ProgressTracker::new(),
            uploading_tx,
        }
    }

    pub fn transfer_id(&self) -> String {
        self.state.read().transfer_id.clone()
    }

    /// True while a remote transfer is negotiated and not yet finalized or reset.
    pub fn has_transfer(&self) -> bool {
        !self.state.read().transfer_id.is_empty()
    }

    pub fn file_hash(&self) -> String {
        self.state.read().file_hash.clone()
    }

    pub fn file_name(&self) -> String {
        self.state.read().file_name.clone()
    }

    pub fn cursor(&self) -> u32 {
        self.state.read().cursor
    }

    pub fn total_chunks(&self) -> u32 {
        self.state.read().total_chunks
    }

    pub fn operation(&self) -> Operation {
        self.state.read().operation
    }

    pub fn status(&self) -> UploadStatus {
        self.state.read().status
    }

    pub fn is_uploading(&self) -> bool {
        self.state.read().uploading
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn subscribe_uploading(&self) -> watch::Receiver<bool> {
        self.uploading_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.state.read();
        SessionSnapshot {
            transfer_id: s.transfer_id.clone(),
            file_hash: s.file_hash.clone(),
            file_name: s.file_name.clone(),
            cursor: s.cursor,
            total_chunks: s.total_chunks,
            operation: s.operation,
            status: s.status,
            progress: self.progress.percent(),
            uploading: s.uploading,
            updated_at: s.updated_at,
        }
    }

    pub fn set_operation(&self, operation: Operation) {
        let mut s = self.state.write();
        s.operation = operation;
        s.touch();
    }

    /// Record the intent of the running upload unless a pause or stop already
    /// arrived. Returns the operation in effect.
    pub fn set_intent(&self, intent: Operation) -> Operation {
        let mut s = self.state.write();
        if s.operation.permits_upload() {
            s.operation = intent;
            s.touch();
        }
        s.operation
    }

    /// Apply a status change computed from the current status, atomically.
    pub fn apply_status<E>(
        &self,
        next: impl FnOnce(UploadStatus) -> Result<UploadStatus, E>,
    ) -> Result<UploadStatus, E> {
        let mut s = self.state.write();
        let status = next(s.status)?;
        s.status = status;
        s.touch();
        Ok(status)
    }

    /// Forget the previous file and its transfer.
    pub fn attach_file(&self, file_name: &str) {
        let mut s = self.state.write();
        s.transfer_id.clear();
        s.file_hash.clear();
        s.file_name = file_name.to_string();
        s.cursor = 0;
        s.total_chunks = 0;
        s.status = UploadStatus::Init;
        s.touch();
        self.progress.reset(0);
    }

    pub fn set_file_hash(&self, file_hash: &str) {
        let mut s = self.state.write();
        s.file_hash = file_hash.to_string();
        s.touch();
    }

    /// Record a freshly allocated remote transfer. Rewinds the cursor.
    pub fn negotiate(&self, transfer_id: &str, total_chunks: u32) {
        let mut s = self.state.write();
        s.transfer_id = transfer_id.to_string();
        s.cursor = 0;
        s.total_chunks = total_chunks;
        s.touch();
        self.progress.reset(total_chunks);
    }

    /// Move the cursor forward to `cursor`. Never moves it back.
    pub fn advance_cursor(&self, cursor: u32) {
        let mut s = self.state.write();
        if cursor > s.cursor {
            s.cursor = cursor;
            s.touch();
        }
    }

    /// The remote transfer is merged; it is no longer resumable.
    pub fn finalize(&self) {
        let mut s = self.state.write();
        s.transfer_id.clear();
        s.cursor = 0;
        s.touch();
        self.progress.complete();
    }

    /// Claim the single upload slot. False if an upload is already running.
    ///
    /// The operation is set to START in the same step, so a pause or stop
    /// requested from here on is never overwritten by [`set_intent`](Self::set_intent).
    pub fn try_begin_uploading(&self) -> bool {
        let mut s = self.state.write();
        if s.uploading {
            return false;
        }
        s.uploading = true;
        s.operation = Operation::Start;
        s.touch();
        self.uploading_tx.send_replace(true);
        true
    }

    /// Release the upload slot. If a stop was requested meanwhile, reset the
    /// session and return the transfer to abort.
    pub fn finish_uploading(&self) -> Option<Option<AbortRequest>> {
        let mut s = self.state.write();
        s.uploading = false;
        s.touch();
        self.uploading_tx.send_replace(false);

        if s.operation == Operation::Stop && s.status != UploadStatus::Success {
            Some(self.reset_for_stop(&mut s))
        } else {
            None
        }
    }

    /// Record a stop request and decide whether the reset can happen now.
    pub fn request_stop(&self) -> StopAction {
        let mut s = self.state.write();
        if s.status == UploadStatus::Success {
            return StopAction::Ignored;
        }

        s.operation = Operation::Stop;
        s.touch();
        if s.uploading {
            StopAction::Deferred
        } else {
            StopAction::Reset(self.reset_for_stop(&mut s))
        }
    }

    fn reset_for_stop(&self, s: &mut SessionState) -> Option<AbortRequest> {
        let transfer_id = std::mem::take(&mut s.transfer_id);
        // Callers never reset a SUCCESS session, the only status the table refuses
        if let Ok(status) = StatusMachine::next(s.status, StatusEvent::Stopped) {
            s.status = status;
        }
        self.progress.reset(0);

        if transfer_id.is_empty() {
            None
        } else {
            Some(AbortRequest {
                transfer_id,
                file_hash: s.file_hash.clone(),
            })
        }
    }
}
