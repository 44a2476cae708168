//! Job lifecycle engine.
//!
//! One guarded tick per fetch interval: adopt an orphaned work item or claim
//! a fresh queue entry, then stage, probe, transcode, deliver and clean up.
//! Failures burn down a consecutive-failure budget; exhausting it asks the
//! process to exit so the orchestrator can restart on a clean slate.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use optibot_clients::{HistoryService, MetadataService, QueueService, WorkService};
use optibot_media::{format_percentage, TranscodeParams, Transcoder};
use optibot_models::{HistoryItem, WorkItem};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::slot::JobSlot;
use crate::transfer::TransferBackend;

/// Consecutive job failures tolerated before the engine requests exit.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 20;

/// Exit code requested after the failure budget is exhausted.
const FAILURE_EXIT_CODE: i32 = 1;

/// Temp files created for the current job, tracked so the failure path can
/// reclaim whatever stage the job died in.
#[derive(Default)]
struct TempFiles {
    staged: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl TempFiles {
    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.staged.iter().chain(self.output.iter())
    }

    /// Remove tracked files, failing the job if any removal fails.
    async fn remove_all(&self) -> WorkerResult<()> {
        for path in self.paths() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                return Err(WorkerError::cleanup(format!(
                    "unable to remove {}: {}",
                    path.display(),
                    e
                )));
            }
        }
        Ok(())
    }

    /// Remove tracked files on the failure path, logging instead of failing.
    async fn remove_best_effort(&self) {
        for path in self.paths() {
            if path.exists() {
                if let Err(e) = tokio::fs::remove_file(path).await {
                    warn!("Unable to remove temp file {}: {}", path.display(), e);
                }
            }
        }
    }
}

pub struct JobEngine {
    config: WorkerConfig,
    queue: Arc<dyn QueueService>,
    work: Arc<dyn WorkService>,
    metadata: Arc<dyn MetadataService>,
    history: Arc<dyn HistoryService>,
    transfer: Arc<dyn TransferBackend>,
    transcoder: Arc<dyn Transcoder>,
    slot: JobSlot,
    // Re-entrancy guard: a tick that arrives while a job is running is a
    // no-op, not a queued second job.
    run_guard: tokio::sync::Mutex<()>,
    fail_count: AtomicU32,
    exit: watch::Sender<Option<i32>>,
}

impl JobEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn QueueService>,
        work: Arc<dyn WorkService>,
        metadata: Arc<dyn MetadataService>,
        history: Arc<dyn HistoryService>,
        transfer: Arc<dyn TransferBackend>,
        transcoder: Arc<dyn Transcoder>,
        slot: JobSlot,
    ) -> Self {
        let (exit, _) = watch::channel(None);
        Self {
            config,
            queue,
            work,
            metadata,
            history,
            transfer,
            transcoder,
            slot,
            run_guard: tokio::sync::Mutex::new(()),
            fail_count: AtomicU32::new(0),
            exit,
        }
    }

    /// Subscribe to the exit request. The value becomes `Some(code)` when
    /// the failure budget is exhausted.
    pub fn exit_signal(&self) -> watch::Receiver<Option<i32>> {
        self.exit.subscribe()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.fail_count.load(Ordering::Relaxed)
    }

    /// One acquisition cycle. Re-entrant calls while a job is in flight
    /// return immediately.
    pub async fn tick(&self) {
        let Ok(_guard) = self.run_guard.try_lock() else {
            debug!("A job is already running, skipping this cycle");
            return;
        };

        if self.consecutive_failures() >= MAX_CONSECUTIVE_FAILURES {
            // The exit request is already pending; never claim more work.
            let _ = self.exit.send(Some(FAILURE_EXIT_CODE));
            return;
        }

        let item = match self.acquire().await {
            Ok(Some(item)) => item,
            Ok(None) => {
                debug!("No work available");
                return;
            }
            Err(e) => {
                warn!("Unable to acquire work: {}", e);
                self.record_failure();
                return;
            }
        };

        self.slot.begin(item.clone());

        let mut temp = TempFiles::default();
        match self.run_job(&item, &mut temp).await {
            Ok(()) => self.complete(&item).await,
            Err(e) => self.fail(&item, &temp, e).await,
        }
    }

    /// Adopt an orphaned work item left over from a previous run, or claim
    /// the next queue entry. Ordering on a fresh claim: the work item is
    /// persisted before the queue entry is deleted, so a crash in between
    /// leaves a duplicate rather than a lost job.
    async fn acquire(&self) -> WorkerResult<Option<WorkItem>> {
        for item in self.work.list().await? {
            if !item.is_owned_by(&self.config.worker_name) {
                continue;
            }
            let Some(id) = item.id else { continue };

            let media = self.metadata.get(item.media_kind, item.media_id).await?;
            if media.is_optimized() {
                // The previous run finished the encode but died before it
                // removed its record.
                info!("Removing stale work item {} (already optimized)", id);
                if let Err(e) = self.work.delete(id).await {
                    warn!("Unable to remove stale work item {}: {}", id, e);
                }
                continue;
            }

            info!(
                "Recovered orphaned work item {} ({} {})",
                id, item.media_kind, item.media_id
            );
            return Ok(Some(item));
        }

        let Some(queue_item) = self.queue.next().await? else {
            return Ok(None);
        };

        info!(
            "Claiming queue entry {} ({} {})",
            queue_item.id, queue_item.media_kind, queue_item.media_id
        );

        let mut item = WorkItem::claim(&queue_item, &self.config.worker_name);
        item.id = Some(self.work.create(&item).await?);
        self.queue.delete(queue_item.id).await?;

        Ok(Some(item))
    }

    async fn run_job(&self, item: &WorkItem, temp: &mut TempFiles) -> WorkerResult<()> {
        let media = self.metadata.get(item.media_kind, item.media_id).await?;

        let staged = self.config.staged_path(media.id(), media.filetype());
        let output = self.config.output_path(media.id());
        temp.staged = Some(staged.clone());
        temp.output = Some(output.clone());

        self.transfer.stage(&media, &staged, &self.slot).await?;

        self.slot.set_progress("gathering information");
        let duration_ms = self.transcoder.probe_duration(&staged).await?;
        debug!("Probed duration: {} ms", duration_ms);

        info!("Transcoding {} {} ({})", media.kind(), media.id(), media.title());
        let params = TranscodeParams {
            input: staged,
            output: output.clone(),
            title: media.title().to_string(),
            crf: self.config.crf,
        };
        let slot = self.slot.clone();
        self.transcoder
            .transcode(
                &params,
                Box::new(move |out_time_ms| {
                    slot.set_progress(format_percentage(out_time_ms, duration_ms));
                }),
            )
            .await?;

        self.slot.set_progress("uploading");
        self.transfer.deliver(&media, &output).await?;

        self.slot.set_progress("cleaning up");
        temp.remove_all().await?;

        Ok(())
    }

    async fn complete(&self, item: &WorkItem) {
        info!(
            "Finished encoding {} {}",
            item.media_kind, item.media_id
        );

        if let Some(id) = item.id {
            if let Err(e) = self.work.delete(id).await {
                warn!("Unable to remove finished work item {}: {}", id, e);
            }
        }

        self.record_history(item, "Completed").await;
        self.slot.finish();
        self.fail_count.store(0, Ordering::Relaxed);
    }

    async fn fail(&self, item: &WorkItem, temp: &TempFiles, err: WorkerError) {
        error!(
            "Job for {} {} failed: {}",
            item.media_kind, item.media_id, err
        );

        temp.remove_best_effort().await;

        if let Some(id) = item.id {
            if let Err(e) = self.work.delete(id).await {
                warn!("Unable to remove failed work item {}: {}", id, e);
            }
        }

        self.record_history(item, format!("Failed - {}", err)).await;
        self.slot.finish();
        self.record_failure();
    }

    async fn record_history(&self, item: &WorkItem, status: impl Into<String>) {
        let record = HistoryItem::new(
            item.media_id,
            item.media_kind,
            &self.config.worker_name,
            status,
        );
        if let Err(e) = self.history.create(&record).await {
            warn!(
                "Unable to record history for {} {}: {}",
                item.media_kind, item.media_id, e
            );
        }
    }

    fn record_failure(&self) {
        let failures = self.fail_count.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
            "Consecutive failures: {}/{}",
            failures, MAX_CONSECUTIVE_FAILURES
        );
        if failures >= MAX_CONSECUTIVE_FAILURES {
            error!("Too many consecutive failures, requesting exit");
            // Receivers may already be gone during shutdown.
            let _ = self.exit.send(Some(FAILURE_EXIT_CODE));
        }
    }
}
