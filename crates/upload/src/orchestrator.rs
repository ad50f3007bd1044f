//! Upload orchestrator: check → upload all chunks → merge.
//!
//! Drives files through the pipeline, emits progress events, and supports
//! cancellation.

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chunkup_protocol::types::{TaskProgress, TaskStatus};
use chunkup_protocol::{CheckRequest, MergeRequest, ProgressEvent};
use chunkup_transfer::{
    ChunkSpan, ProcessOptions, ProcessedFile, SpeedCalculator, TransferError, UploadTask,
    process_file, spawn_job, upload_file_name,
};
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::{ChunkUpload, UploadBackend};
use crate::error::UploadError;
use crate::types::{UploadEvent, UploadOptions, UploadOutcome};

/// Orchestrates chunked uploads against an [`UploadBackend`].
pub struct UploadOrchestrator {
    options: UploadOptions,
    events_tx: mpsc::UnboundedSender<UploadEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<UploadEvent>>,
    /// Parent of every upload's token; replaced once a cancelled upload ends.
    cancel: Mutex<CancellationToken>,
    current: Mutex<Option<Arc<UploadTask>>>,
}

/// Per-upload state: the task record and its own cancellation token.
struct ActiveUpload {
    task: Arc<UploadTask>,
    cancel: CancellationToken,
}

impl ActiveUpload {
    /// Races `fut` against cancellation.
    async fn guarded<T>(
        &self,
        fut: impl Future<Output = Result<T, UploadError>>,
    ) -> Result<T, UploadError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(UploadError::Cancelled),
            result = fut => result,
        }
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new(UploadOptions::default())
    }
}

impl UploadOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(options: UploadOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            options,
            events_tx,
            events_rx: Some(events_rx),
            cancel: Mutex::new(CancellationToken::new()),
            current: Mutex::new(None),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a token that cancels the uploads in flight.
    ///
    /// Cancelling it before an upload starts cancels that upload too. Once a
    /// cancelled upload has ended, later uploads get a fresh token, so call
    /// this again to cancel them.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap().clone()
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Snapshot of the most recent upload task, if any.
    pub fn task_progress(&self) -> Option<TaskProgress> {
        let current = self.current.lock().unwrap();
        current.as_ref().map(|task| task.progress())
    }

    /// Hashes and chunks `path` in the background, then uploads it.
    pub async fn upload_file(
        &self,
        path: &Path,
        backend: &dyn UploadBackend,
    ) -> Result<UploadOutcome, UploadError> {
        let file_name = upload_file_name(path).unwrap_or_else(|_| path.display().to_string());
        let options = ProcessOptions::with_chunk_size(self.options.chunk_size);
        let path = path.to_path_buf();

        self.upload_job(file_name, backend, move |tx, cancel| {
            process_file(&path, &options, Some(tx), cancel)
        })
        .await
    }

    /// Uploads an already chunked and hashed file.
    pub async fn upload_processed(
        &self,
        file: &ProcessedFile,
        backend: &dyn UploadBackend,
    ) -> Result<UploadOutcome, UploadError> {
        let active = self.begin(file.file_name.clone());
        active.task.set_processed(file);

        let result = self.run_stages(file, backend, &active).await;
        self.finish(&active, result)
    }

    /// Runs `job` on the blocking pool to produce the file, then uploads it.
    async fn upload_job<F>(
        &self,
        file_name: String,
        backend: &dyn UploadBackend,
        job: F,
    ) -> Result<UploadOutcome, UploadError>
    where
        F: FnOnce(
                &mpsc::Sender<ProgressEvent>,
                &CancellationToken,
            ) -> Result<ProcessedFile, TransferError>
            + Send
            + 'static,
    {
        let active = self.begin(file_name);
        active.task.set_status(TaskStatus::Hashing);

        let result = self.run_job(job, backend, &active).await;
        self.finish(&active, result)
    }

    async fn run_job<F>(
        &self,
        job: F,
        backend: &dyn UploadBackend,
        active: &ActiveUpload,
    ) -> Result<UploadOutcome, UploadError>
    where
        F: FnOnce(
                &mpsc::Sender<ProgressEvent>,
                &CancellationToken,
            ) -> Result<ProcessedFile, TransferError>
            + Send
            + 'static,
    {
        let file = self.hash_file(job, active).await?;
        active.task.set_processed(&file);
        self.emit(UploadEvent::Hashed {
            file_hash: file.file_hash.clone(),
            total_size: file.total_size,
            total_chunks: file.total_chunks,
        });
        self.run_stages(&file, backend, active).await
    }

    /// Runs the chunking/hashing job, relaying its progress.
    async fn hash_file<F>(&self, job: F, active: &ActiveUpload) -> Result<ProcessedFile, UploadError>
    where
        F: FnOnce(
                &mpsc::Sender<ProgressEvent>,
                &CancellationToken,
            ) -> Result<ProcessedFile, TransferError>
            + Send
            + 'static,
    {
        active.check_cancelled()?;

        let mut handle = spawn_job(job);

        if let Some(mut progress) = handle.take_progress() {
            loop {
                tokio::select! {
                    ev = progress.recv() => match ev {
                        Some(ev) => self.emit(UploadEvent::Hashing(ev)),
                        None => break,
                    },
                    _ = active.cancel.cancelled() => {
                        handle.cancel();
                        break;
                    }
                }
            }
        }

        Ok(handle.join().await?)
    }

    async fn run_stages(
        &self,
        file: &ProcessedFile,
        backend: &dyn UploadBackend,
        active: &ActiveUpload,
    ) -> Result<UploadOutcome, UploadError> {
        let task = &active.task;

        // 1. Existence check
        active.check_cancelled()?;
        task.set_status(TaskStatus::Checking);
        self.emit(UploadEvent::Checking);

        let check = CheckRequest {
            file_hash: file.file_hash.clone(),
            file_name: file.file_name.clone(),
            file_size: file.total_size,
        };
        let resp = active.guarded(backend.check_exists(&check)).await?;

        if resp.uploaded {
            info!(file = %file.file_name, hash = %file.file_hash, "content already stored");
            self.emit(UploadEvent::InstantUpload {
                message: resp.message.clone(),
            });
            return Ok(UploadOutcome::AlreadyStored {
                file_hash: file.file_hash.clone(),
                message: resp.message,
            });
        }

        // 2. Upload chunks
        task.set_status(TaskStatus::Uploading);
        self.upload_chunks(file, backend, active).await?;

        // 3. Merge
        active.check_cancelled()?;
        task.set_status(TaskStatus::Merging);
        self.emit(UploadEvent::Merging);

        let merge = MergeRequest {
            file_hash: file.file_hash.clone(),
            file_name: file.file_name.clone(),
            size: file.total_size,
        };
        active.guarded(backend.merge(&merge)).await?;

        Ok(UploadOutcome::Uploaded {
            file_hash: file.file_hash.clone(),
            chunks: file.total_chunks,
        })
    }

    /// Uploads every chunk, at most `concurrency` at a time.
    ///
    /// Only in-flight chunks are held in memory. Returns on the first
    /// failure; uploads still in flight are dropped.
    async fn upload_chunks(
        &self,
        file: &ProcessedFile,
        backend: &dyn UploadBackend,
        active: &ActiveUpload,
    ) -> Result<(), UploadError> {
        let limit = match self.options.concurrency {
            0 => file.chunks.len().max(1),
            n => n,
        };
        debug!(
            file = %file.file_name,
            chunks = file.total_chunks,
            concurrency = limit,
            "uploading chunks"
        );

        let speed = SpeedCalculator::default();
        let mut uploads = stream::iter(&file.chunks)
            .map(|span| self.upload_one(file, span, backend, active))
            .buffer_unordered(limit);

        while let Some(result) = uploads.next().await {
            let span = result?;
            speed.add_sample(span.len());
            let uploaded = active.task.record_chunk(span.len());

            debug!(chunk = span.index, uploaded, total = file.total_chunks, "chunk acknowledged");
            self.emit(UploadEvent::ChunkUploaded {
                index: span.index,
                uploaded,
                total: file.total_chunks,
                percent: ProgressEvent::new(uploaded, file.total_chunks).percent,
                bytes_per_second: speed.bytes_per_second(),
            });
        }

        Ok(())
    }

    /// Reads one chunk and uploads it, retrying network failures up to
    /// `chunk_retries` times.
    async fn upload_one<'a>(
        &self,
        file: &'a ProcessedFile,
        span: &'a ChunkSpan,
        backend: &dyn UploadBackend,
        active: &ActiveUpload,
    ) -> Result<&'a ChunkSpan, UploadError> {
        active.check_cancelled()?;
        let chunk = active
            .guarded(async { file.read_chunk(span).await.map_err(UploadError::from) })
            .await?;

        let upload = ChunkUpload {
            file_hash: &file.file_hash,
            file_name: &file.file_name,
            total_chunks: file.total_chunks,
            chunk: &chunk,
        };

        let mut attempt = 0;
        loop {
            active.check_cancelled()?;

            match active.guarded(backend.upload_chunk(upload)).await {
                Ok(()) => return Ok(span),
                Err(e) if e.is_network() && attempt < self.options.chunk_retries => {
                    attempt += 1;
                    warn!(chunk = span.index, attempt, error = %e, "chunk upload failed, retrying");
                    self.emit(UploadEvent::ChunkRetry {
                        index: span.index,
                        attempt,
                        error: e.to_string(),
                    });
                    let backoff = self.options.retry_backoff;
                    active
                        .guarded(async move {
                            tokio::time::sleep(backoff).await;
                            Ok::<_, UploadError>(())
                        })
                        .await?;
                }
                Err(e) => {
                    debug!(chunk = span.index, error = %e, "chunk upload failed");
                    return Err(e);
                }
            }
        }
    }

    fn begin(&self, file_name: String) -> ActiveUpload {
        let task = Arc::new(UploadTask::new(file_name));
        let cancel = self.cancel.lock().unwrap().child_token();
        let mut current = self.current.lock().unwrap();
        *current = Some(Arc::clone(&task));
        ActiveUpload { task, cancel }
    }

    /// Records the terminal state and emits exactly one terminal event.
    fn finish(
        &self,
        active: &ActiveUpload,
        result: Result<UploadOutcome, UploadError>,
    ) -> Result<UploadOutcome, UploadError> {
        let task = &active.task;
        let task_id = task.id();
        let elapsed_ms = task.elapsed().as_millis() as u64;

        match &result {
            Ok(outcome) => {
                task.complete();
                info!(
                    task = %task_id,
                    hash = %outcome.file_hash(),
                    instant = outcome.is_instant(),
                    elapsed_ms,
                    "upload completed"
                );
                self.emit(UploadEvent::Completed(outcome.clone()));
            }
            Err(e) => {
                if matches!(e, UploadError::Cancelled) {
                    task.cancel();
                    warn!(task = %task_id, "upload cancelled");
                } else {
                    task.fail(&e.to_string());
                    error!(task = %task_id, error = %e, "upload failed");
                }
                self.emit(UploadEvent::Failed {
                    kind: e.kind(),
                    error: e.to_string(),
                });
            }
        }

        // A spent parent would cancel every later upload at birth.
        let mut parent = self.cancel.lock().unwrap();
        if parent.is_cancelled() {
            *parent = CancellationToken::new();
        }

        result
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.send(event);
    }
}
