//! Job queue and worker pool for lossy transcodes.
//!
//! [`Transcoder`] owns a bounded `mpsc` queue shared by a fixed number of
//! worker tasks. Each worker takes one [`Job`] at a time and walks its
//! track file through `pending -> processing -> completed | failed`,
//! persisting every transition and notifying the owner as it goes.
//!
//! Shutdown cancels a shared [`CancellationToken`], closes the queue and
//! waits for every worker to exit. Jobs already running finish; jobs still
//! queued are dropped and their rows stay `pending` until the next
//! [`Transcoder::requeue_unfinished`].

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vault_core::error::CoreError;
use vault_core::quality::Quality;
use vault_core::transcoding::{
    lossy_output_path, TranscodingNotifier, TranscodingStatus, LOSSY_BITRATE, LOSSY_FORMAT,
};
use vault_core::waveform::waveform_to_json;
use vault_db::models::track_file::{CreateTrackFile, TrackFile};

use crate::config::TranscoderConfig;
use crate::error::PipelineError;
use crate::job::{Job, TranscodeVersionInput};
use crate::store::TranscodeStore;
use crate::tools::MediaTools;

/// Something that can produce the lossy copy of an uploaded version.
///
/// Upload handlers depend on this rather than on the worker pool.
#[async_trait]
pub trait VersionTranscoder: Send + Sync {
    /// Create the `pending` lossy row, then schedule the encode.
    ///
    /// Fails only if the row cannot be created, in which case nothing is
    /// scheduled. The returned row is still `pending`.
    async fn transcode_version(
        &self,
        input: TranscodeVersionInput,
    ) -> Result<TrackFile, PipelineError>;
}

/// Everything a worker needs to process a job.
struct JobContext {
    store: Arc<dyn TranscodeStore>,
    tools: Arc<dyn MediaTools>,
    notifier: Arc<dyn TranscodingNotifier>,
    waveform_bars: usize,
}

/// Bounded transcode queue with a fixed worker pool.
pub struct Transcoder {
    ctx: Arc<JobContext>,
    sender: mpsc::Sender<Job>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    cancel: CancellationToken,
    workers: usize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Transcoder {
    pub fn new(
        store: Arc<dyn TranscodeStore>,
        tools: Arc<dyn MediaTools>,
        notifier: Arc<dyn TranscodingNotifier>,
        config: TranscoderConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            ctx: Arc::new(JobContext {
                store,
                tools,
                notifier,
                waveform_bars: config.waveform_bars,
            }),
            sender,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            cancel: CancellationToken::new(),
            workers: config.workers.max(1),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the worker tasks. Calling this more than once, or after
    /// [`stop`](Self::stop), does nothing.
    pub fn start(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if !handles.is_empty() || self.cancel.is_cancelled() {
            tracing::warn!("Transcoder already started or stopped");
            return;
        }

        tracing::info!(workers = self.workers, "Starting transcoding workers");
        for worker_id in 0..self.workers {
            let ctx = Arc::clone(&self.ctx);
            let receiver = Arc::clone(&self.receiver);
            let cancel = self.cancel.clone();
            handles.push(tokio::spawn(run_worker(worker_id, ctx, receiver, cancel)));
        }
    }

    /// Enqueue a job, waiting for room if the queue is full.
    ///
    /// Returns `false` without enqueuing once shutdown has begun, including
    /// when shutdown starts while this call is waiting for room.
    pub async fn queue_job(&self, job: Job) -> bool {
        let version_id = job.version_id;
        let queued = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.sender.send(job) => sent.is_ok(),
        };

        if queued {
            tracing::debug!(version_id, "Queued transcoding job");
        } else {
            tracing::warn!(version_id, "Cannot queue job: transcoder is shutting down");
        }
        queued
    }

    /// Stop accepting work and wait for every worker to exit.
    ///
    /// In-flight jobs run to completion. Jobs still queued are discarded.
    pub async fn stop(&self) {
        tracing::info!("Stopping transcoding workers");
        self.cancel.cancel();

        let abandoned = {
            let mut receiver = self.receiver.lock().await;
            receiver.close();
            let mut abandoned = 0usize;
            while receiver.try_recv().is_ok() {
                abandoned += 1;
            }
            abandoned
        };
        if abandoned > 0 {
            tracing::warn!(abandoned, "Discarded queued transcoding jobs on shutdown");
        }

        let handles = std::mem::take(
            &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Transcoding worker panicked");
            }
        }

        tracing::info!("All transcoding workers stopped");
    }

    /// Queue every lossy encode a previous run left `pending` or
    /// `processing`. Returns how many were queued.
    ///
    /// Call after [`start`](Self::start) so a backlog larger than the queue
    /// does not block forever.
    pub async fn requeue_unfinished(&self) -> Result<usize, PipelineError> {
        let rows = self
            .ctx
            .store
            .list_unfinished_lossy()
            .await
            .map_err(PipelineError::ListUnfinished)?;

        let total = rows.len();
        let mut queued = 0;
        for row in rows {
            if !self.queue_job(Job::from(row)).await {
                break;
            }
            queued += 1;
        }

        tracing::info!(found = total, queued, "Requeued unfinished transcodes");
        Ok(queued)
    }
}

#[async_trait]
impl VersionTranscoder for Transcoder {
    async fn transcode_version(
        &self,
        input: TranscodeVersionInput,
    ) -> Result<TrackFile, PipelineError> {
        if input.source_path.as_os_str().is_empty() {
            return Err(CoreError::Validation("source path is empty".into()).into());
        }
        if input.track_public_id.is_empty() {
            return Err(CoreError::Validation("track public id is empty".into()).into());
        }

        let output_path = lossy_output_path(&input.source_path);
        let track_file = self
            .ctx
            .store
            .create_track_file(&CreateTrackFile {
                version_id: input.version_id,
                quality: Quality::Lossy,
                file_path: output_path.to_string_lossy().into_owned(),
                file_size: 0,
                format: LOSSY_FORMAT.to_string(),
                bitrate: Some(LOSSY_BITRATE),
                content_hash: None,
                transcoding_status: Some(TranscodingStatus::Pending),
                original_filename: None,
            })
            .await
            .map_err(PipelineError::CreateTrackFile)?;

        let job = Job {
            track_file_id: track_file.id,
            version_id: input.version_id,
            track_public_id: input.track_public_id,
            user_id: input.user_id,
            source_path: input.source_path,
            output_path,
        };
        if !self.queue_job(job).await {
            tracing::warn!(
                track_file_id = track_file.id,
                version_id = input.version_id,
                "Lossy track file left pending, job was not queued"
            );
        }

        Ok(track_file)
    }
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

async fn run_worker(
    worker_id: usize,
    ctx: Arc<JobContext>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    cancel: CancellationToken,
) {
    tracing::debug!(worker_id, "Transcoding worker started");

    loop {
        let next = {
            let mut rx = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                rx = receiver.lock() => Some(rx),
            };
            match rx.as_mut() {
                None => None,
                Some(rx) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    job = rx.recv() => job,
                },
            }
        };

        let Some(job) = next else {
            break;
        };

        tracing::info!(
            worker_id,
            track_file_id = job.track_file_id,
            version_id = job.version_id,
            "Processing transcoding job"
        );
        process_job(&ctx, &job).await;
    }

    tracing::debug!(worker_id, "Transcoding worker exited");
}

/// Advance one lossy track file through the encode.
///
/// Never returns an error: every failure ends in a log line and, where the
/// encode itself failed, a `failed` status.
async fn process_job(ctx: &JobContext, job: &Job) {
    if let Err(e) = ctx
        .store
        .update_transcoding_status(job.track_file_id, TranscodingStatus::Processing)
        .await
    {
        tracing::error!(
            error = %e,
            track_file_id = job.track_file_id,
            version_id = job.version_id,
            "Failed to mark transcode processing, abandoning job"
        );
        return;
    }
    notify(ctx, job, TranscodingStatus::Processing);

    if let Err(e) = ctx.tools.transcode(&job.source_path, &job.output_path).await {
        tracing::error!(
            error = %e,
            track_file_id = job.track_file_id,
            version_id = job.version_id,
            source = %job.source_path.display(),
            "Transcoding failed"
        );
        if let Err(e) = ctx
            .store
            .update_transcoding_status(job.track_file_id, TranscodingStatus::Failed)
            .await
        {
            tracing::error!(
                error = %e,
                track_file_id = job.track_file_id,
                "Failed to mark transcode failed"
            );
        }
        notify(ctx, job, TranscodingStatus::Failed);
        return;
    }

    record_output(ctx, job).await;
    record_waveform(ctx, job).await;

    if let Err(e) = ctx
        .store
        .update_transcoding_status(job.track_file_id, TranscodingStatus::Completed)
        .await
    {
        tracing::error!(
            error = %e,
            track_file_id = job.track_file_id,
            version_id = job.version_id,
            "Failed to mark transcode completed"
        );
        return;
    }
    notify(ctx, job, TranscodingStatus::Completed);

    tracing::info!(
        track_file_id = job.track_file_id,
        version_id = job.version_id,
        "Transcoded version to MP3"
    );
}

/// Persist the real size and content hash of the encoded file. Best-effort.
async fn record_output(ctx: &JobContext, job: &Job) {
    match tokio::fs::metadata(&job.output_path).await {
        Ok(meta) => {
            let size = i64::try_from(meta.len()).unwrap_or(i64::MAX);
            if let Err(e) = ctx.store.update_file_size(job.track_file_id, size).await {
                tracing::warn!(
                    error = %e,
                    track_file_id = job.track_file_id,
                    "Failed to update lossy file size"
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                output = %job.output_path.display(),
                "Cannot stat lossy output"
            );
            return;
        }
    }

    match hash_file(&job.output_path).await {
        Ok(hash) => {
            if let Err(e) = ctx.store.update_content_hash(job.track_file_id, &hash).await {
                tracing::warn!(
                    error = %e,
                    track_file_id = job.track_file_id,
                    "Failed to update lossy content hash"
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                output = %job.output_path.display(),
                "Cannot hash lossy output"
            );
        }
    }
}

/// Generate the waveform from the source and store it. Best-effort.
async fn record_waveform(ctx: &JobContext, job: &Job) {
    let waveform = match ctx.tools.waveform(&job.source_path, ctx.waveform_bars).await {
        Ok(waveform) => waveform,
        Err(e) => {
            tracing::warn!(
                error = %e,
                version_id = job.version_id,
                "Failed to generate waveform"
            );
            return;
        }
    };

    let json = match waveform_to_json(&waveform) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, version_id = job.version_id, "Failed to encode waveform");
            return;
        }
    };

    match ctx.store.update_waveform(job.track_file_id, &json).await {
        Ok(()) => tracing::debug!(version_id = job.version_id, "Saved waveform"),
        Err(e) => tracing::warn!(
            error = %e,
            track_file_id = job.track_file_id,
            "Failed to save waveform"
        ),
    }
}

fn notify(ctx: &JobContext, job: &Job, status: TranscodingStatus) {
    ctx.notifier.notify_transcoding_update(
        job.user_id,
        &job.track_public_id,
        job.version_id,
        status,
    );
}

/// Hex SHA-256 of a file's contents, streamed on the blocking pool.
async fn hash_file(path: &Path) -> std::io::Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok::<_, std::io::Error>(format!("{:x}", hasher.finalize()))
    })
    .await
    .map_err(std::io::Error::other)?
}
