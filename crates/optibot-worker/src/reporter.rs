//! Periodic progress reporter.
//!
//! Pushes the current job's progress string to the work-tracking service on
//! a fixed cadence. Failures are logged and skipped; the next tick retries
//! with fresher state.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use optibot_clients::WorkService;

use crate::slot::JobSlot;

pub struct ProgressReporter {
    work: Arc<dyn WorkService>,
    slot: JobSlot,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(work: Arc<dyn WorkService>, slot: JobSlot, interval: Duration) -> Self {
        Self {
            work,
            slot,
            interval,
        }
    }

    /// Report the current job's progress once, if one is persisted.
    pub async fn report_once(&self) {
        let Some((id, progress)) = self.slot.snapshot_active() else {
            return;
        };
        debug!(work_item = id, %progress, "Reporting progress");
        if let Err(e) = self.work.update(id, &progress).await {
            warn!("Unable to report progress for work item {}: {}", id, e);
        }
    }

    /// Run the reporting loop until the task is dropped.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.report_once().await;
        }
    }
}
