//! Work items: the durable record of an in-flight encoding job.

use serde::{Deserialize, Serialize};

use crate::media::MediaKind;
use crate::queue::QueueItem;

/// Progress string a freshly claimed job starts with.
pub const INITIAL_PROGRESS: &str = "loading media file";

/// A job currently claimed by some worker, persisted by the work-tracking
/// service. The record outlives a crashed agent process and is rediscovered
/// by orphan recovery on the next acquisition cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Assigned by the work-tracking service on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub media_kind: MediaKind,
    pub media_id: i64,
    pub worker_agent_name: String,
    pub progress: String,
}

impl WorkItem {
    /// Build the work item for a freshly claimed queue entry.
    pub fn claim(queue_item: &QueueItem, worker_agent_name: impl Into<String>) -> Self {
        Self {
            id: None,
            media_kind: queue_item.media_kind,
            media_id: queue_item.media_id,
            worker_agent_name: worker_agent_name.into(),
            progress: INITIAL_PROGRESS.to_string(),
        }
    }

    /// Whether this record belongs to the given worker.
    pub fn is_owned_by(&self, worker_agent_name: &str) -> bool {
        self.worker_agent_name == worker_agent_name
    }
}
