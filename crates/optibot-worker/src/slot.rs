//! The shared "current job" slot.
//!
//! The lifecycle engine owns begin/finish; the staging loop and the
//! transcode progress callback write the progress string; the progress
//! reporter only takes snapshots. A plain sync mutex with short critical
//! sections serves both the async reporter and the synchronous ffmpeg
//! progress callback.

use std::sync::{Arc, Mutex, MutexGuard};

use optibot_models::WorkItem;

/// Guarded slot holding the single in-flight work item.
#[derive(Debug, Clone, Default)]
pub struct JobSlot {
    inner: Arc<Mutex<Option<WorkItem>>>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<WorkItem>> {
        // A poisoned lock only means a writer panicked mid-assignment of a
        // String; the slot contents stay usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Install a job as the current one.
    pub fn begin(&self, item: WorkItem) {
        *self.lock() = Some(item);
    }

    /// Update the progress string of the current job, if any.
    pub fn set_progress(&self, progress: impl Into<String>) {
        if let Some(item) = self.lock().as_mut() {
            item.progress = progress.into();
        }
    }

    /// Snapshot the current job.
    pub fn snapshot(&self) -> Option<WorkItem> {
        self.lock().clone()
    }

    /// Snapshot the identity and progress of a job that has been persisted.
    pub fn snapshot_active(&self) -> Option<(i64, String)> {
        self.lock()
            .as_ref()
            .and_then(|item| item.id.map(|id| (id, item.progress.clone())))
    }

    /// Clear the slot at a terminal state.
    pub fn finish(&self) {
        *self.lock() = None;
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }
}
