use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chunk::ChunkPlanner;
use crate::config::UploadConfig;
use crate::controller::error::{UploadError, UploadResult};
use crate::controller::scheduler::UploadScheduler;
use crate::controller::state_machine::{StatusEvent, StatusMachine};
use crate::controller::types::{UploadOutcome, UploadRequest};
use crate::hash::HashComputer;
use crate::metrics::{init_metrics, record_dedup_hit, TransferMetrics};
use crate::session::{Operation, SessionSnapshot, StopAction, TransferSession, UploadStatus};
use crate::source::ByteSource;
use crate::transport::{AbortRequest, MergeRequest, RequestOptions, StatusQuery, UploadTransport};

#[derive(Clone)]
struct ActiveFile {
    source: Arc<dyn ByteSource>,
}

/// Public face of the engine: start, pause and stop one transfer at a time.
///
/// The controller owns the session; the scheduler borrows it for the length of
/// one `start` call.
pub struct TransferController {
    config: UploadConfig,
    transport: Arc<dyn UploadTransport>,
    hasher: HashComputer,
    planner: ChunkPlanner,
    scheduler: UploadScheduler,
    session: Arc<TransferSession>,
    active: Mutex<Option<ActiveFile>>,
}

impl TransferController {
    pub fn new(config: UploadConfig, transport: Arc<dyn UploadTransport>) -> UploadResult<Self> {
        config.validate()?;
        init_metrics();

        let hasher = HashComputer::new(config.digest, config.hash_read_window)?;
        let planner = ChunkPlanner::new(config.chunk_size)?;
        let scheduler = UploadScheduler::new(
            planner,
            hasher.clone(),
            transport.clone(),
            config.concurrency,
        );

        Ok(Self {
            config,
            transport,
            hasher,
            planner,
            scheduler,
            session: Arc::new(TransferSession::new()),
            active: Mutex::new(None),
        })
    }

    /// Upload a new file, or resume/restart the current one when `request` is `None`.
    ///
    /// With `None`, a negotiated transfer is continued from its cursor; a file
    /// whose transfer was stopped is restarted with a fresh existence check.
    /// Transport rejections propagate unchanged and leave the status at STOP
    /// with the cursor kept, so a later `start(None)` resumes.
    pub async fn start(&self, request: Option<UploadRequest>) -> UploadResult<UploadOutcome> {
        if !self.session.try_begin_uploading() {
            return Err(UploadError::AlreadyRunning);
        }
        let slot = UploadSlot {
            controller: self,
            released: false,
        };

        let result = self.drive(request).await;
        if let Err(err) = &result {
            // Usage errors raised before any transition leave the status alone
            let _ = self
                .session
                .apply_status(|s| StatusMachine::next(s, StatusEvent::Failed));
            warn!(
                transfer_id = %self.session.transfer_id(),
                cursor = self.session.cursor(),
                error = %err,
                "Upload failed"
            );
        }

        let stopped = slot.release().await;
        match result {
            Ok(UploadOutcome::Paused) if stopped => Ok(UploadOutcome::Stopped),
            other => other,
        }
    }

    /// Ask the running upload to leave at the next window boundary.
    ///
    /// In-flight chunk requests are not cancelled.
    pub fn pause(&self) {
        self.session.set_operation(Operation::Pause);
        debug!(transfer_id = %self.session.transfer_id(), "Pause requested");
    }

    /// Stop the transfer and discard it remotely.
    ///
    /// When nothing is in flight the abort call is made right away. Otherwise it
    /// is made by the running `start` once its window settles.
    pub async fn stop(&self) {
        match self.session.request_stop() {
            StopAction::Reset(abort) => {
                info!("Upload stopped");
                if let Some(request) = abort {
                    self.send_abort(request).await;
                }
            }
            StopAction::Deferred => {
                debug!("Stop deferred until the running window settles");
            }
            StopAction::Ignored => {
                debug!("Stop ignored: transfer already succeeded");
            }
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn session(&self) -> Arc<TransferSession> {
        self.session.clone()
    }

    pub fn progress(&self) -> f64 {
        self.session.progress().percent()
    }

    pub fn status(&self) -> UploadStatus {
        self.session.status()
    }

    pub fn operation(&self) -> Operation {
        self.session.operation()
    }

    pub fn is_uploading(&self) -> bool {
        self.session.is_uploading()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.session.progress().subscribe()
    }

    pub fn subscribe_uploading(&self) -> watch::Receiver<bool> {
        self.session.subscribe_uploading()
    }

    async fn drive(&self, request: Option<UploadRequest>) -> UploadResult<UploadOutcome> {
        let (source, intent) = self.prepare(request).await?;

        let metrics = TransferMetrics::start(intent.as_str());
        match self.upload(source.as_ref(), intent).await {
            Ok(outcome) => {
                match outcome {
                    UploadOutcome::Completed { .. } | UploadOutcome::Deduplicated { .. } => {
                        metrics.complete()
                    }
                    UploadOutcome::Stopped => metrics.stopped(),
                    UploadOutcome::Paused => {}
                }
                Ok(outcome)
            }
            Err(err) => {
                metrics.fail(err.kind());
                Err(err)
            }
        }
    }

    /// Resolve the source and the intent of this `start` call.
    async fn prepare(
        &self,
        request: Option<UploadRequest>,
    ) -> UploadResult<(Arc<dyn ByteSource>, Operation)> {
        match request {
            Some(request) => {
                if request.source.size() == 0 {
                    return Err(UploadError::EmptySource);
                }

                self.session.attach_file(&request.file_name);
                *self.active.lock() = Some(ActiveFile {
                    source: request.source.clone(),
                });
                self.session.set_intent(Operation::Start);

                let file_hash = match request.file_hash {
                    Some(hash) => hash,
                    None => self.compute_hash(request.source.as_ref()).await?,
                };
                self.session.set_file_hash(&file_hash);

                Ok((request.source, Operation::Start))
            }
            None => {
                let active = self
                    .active
                    .lock()
                    .clone()
                    .ok_or(UploadError::NoActiveTransfer)?;

                let intent = if self.session.has_transfer() {
                    Operation::Continue
                } else {
                    Operation::Restart
                };
                self.session.set_intent(intent);

                if self.session.file_hash().is_empty() {
                    let file_hash = self.compute_hash(active.source.as_ref()).await?;
                    self.session.set_file_hash(&file_hash);
                }

                Ok((active.source, intent))
            }
        }
    }

    async fn compute_hash(&self, source: &dyn ByteSource) -> UploadResult<String> {
        self.session
            .apply_status(|s| StatusMachine::next(s, StatusEvent::BeginHash))?;
        let digest = self.hasher.digest(source, None).await?;
        debug!(file_hash = %digest, size = source.size(), "Whole-file digest computed");
        Ok(digest.to_hex())
    }

    async fn upload(&self, source: &dyn ByteSource, intent: Operation) -> UploadResult<UploadOutcome> {
        self.session
            .apply_status(|s| StatusMachine::next(s, StatusEvent::BeginUpload))?;

        if intent != Operation::Continue {
            // Stopped while hashing: nothing negotiated yet, nothing to abort
            if self.session.operation() == Operation::Stop {
                info!("Upload stopped before negotiation");
                return Ok(UploadOutcome::Stopped);
            }

            let reply = self
                .transport
                .check_status(
                    StatusQuery {
                        file_hash: self.session.file_hash(),
                        file_name: self.session.file_name(),
                    },
                    RequestOptions::default(),
                )
                .await?;

            if reply.is_stored() {
                record_dedup_hit();
                self.session.progress().complete();
                self.session
                    .apply_status(|s| StatusMachine::next(s, StatusEvent::Deduplicated))?;
                info!(file_id = %reply.file_id, "Content already stored, upload skipped");
                return Ok(UploadOutcome::Deduplicated {
                    file_id: reply.file_id,
                });
            }

            let total_chunks = self.planner.plan(source.size())?;
            self.session.negotiate(&reply.file_id, total_chunks);
            info!(
                transfer_id = %reply.file_id,
                total_chunks,
                intent = intent.as_str(),
                "Transfer negotiated"
            );
        } else {
            info!(
                transfer_id = %self.session.transfer_id(),
                cursor = self.session.cursor(),
                "Resuming transfer"
            );
        }

        if !self.scheduler.run(&self.session, source).await? {
            return match self.session.operation() {
                Operation::Pause => {
                    self.session
                        .apply_status(|s| StatusMachine::next(s, StatusEvent::Paused))?;
                    info!(
                        transfer_id = %self.session.transfer_id(),
                        cursor = self.session.cursor(),
                        "Upload paused"
                    );
                    Ok(UploadOutcome::Paused)
                }
                _ => Ok(UploadOutcome::Stopped),
            };
        }

        let transfer_id = self.session.transfer_id();
        let file_id = self
            .transport
            .merge(
                MergeRequest {
                    transfer_id: transfer_id.clone(),
                    file_hash: self.session.file_hash(),
                    file_name: self.session.file_name(),
                },
                RequestOptions::default(),
            )
            .await?;

        self.session.finalize();
        self.session
            .apply_status(|s| StatusMachine::next(s, StatusEvent::Merged))?;
        info!(transfer_id = %transfer_id, file_id = %file_id, "Upload merged");

        Ok(UploadOutcome::Completed { file_id })
    }

    async fn send_abort(&self, request: AbortRequest) {
        let transfer_id = request.transfer_id.clone();
        match self.transport.abort(request, RequestOptions::default()).await {
            Ok(()) => debug!(transfer_id = %transfer_id, "Remote transfer aborted"),
            Err(e) => warn!(transfer_id = %transfer_id, error = %e, "Abort call failed"),
        }
    }
}

/// The session's single upload slot, held for one `start` call.
///
/// Released explicitly so a deferred abort can be awaited. If the `start`
/// future is dropped instead, the slot is released on drop and the abort is
/// spawned onto the current runtime.
struct UploadSlot<'a> {
    controller: &'a TransferController,
    released: bool,
}

impl UploadSlot<'_> {
    /// Returns true if a stop requested during the upload was applied.
    async fn release(mut self) -> bool {
        self.released = true;
        match self.controller.session.finish_uploading() {
            Some(abort) => {
                info!("Upload stopped");
                if let Some(request) = abort {
                    self.controller.send_abort(request).await;
                }
                true
            }
            None => false,
        }
    }
}

impl Drop for UploadSlot<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if let Some(Some(request)) = self.controller.session.finish_uploading() {
            let transport = self.controller.transport.clone();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = transport.abort(request, RequestOptions::default()).await {
                        warn!(error = %e, "Abort call failed");
                    }
                });
            }
        }
    }
}
