//! Collaborator contracts the lifecycle engine depends on.
//!
//! The engine only sees these traits; the reqwest implementations live in
//! [`crate::http`] and tests substitute in-memory fakes.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use std::path::Path;

use optibot_models::{HistoryItem, MediaItem, MediaKind, QueueItem, WorkItem};

use crate::error::ClientResult;

/// A source media download: total size plus the byte stream.
pub struct MediaDownload {
    /// Total size in bytes, from the Content-Length header.
    pub size: u64,
    pub stream: BoxStream<'static, std::io::Result<Bytes>>,
}

/// Queue service: hands out unclaimed work.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Fetch the next unclaimed queue entry, `None` when the queue is empty.
    async fn next(&self) -> ClientResult<Option<QueueItem>>;

    /// Delete a queue entry after its ownership has been transferred to a
    /// durable work item.
    async fn delete(&self, id: i64) -> ClientResult<()>;
}

/// Work-tracking service: durable records of in-progress jobs.
#[async_trait]
pub trait WorkService: Send + Sync {
    async fn list(&self) -> ClientResult<Vec<WorkItem>>;

    /// Persist a new work item, returning its assigned identity.
    async fn create(&self, item: &WorkItem) -> ClientResult<i64>;

    async fn update(&self, id: i64, progress: &str) -> ClientResult<()>;

    async fn delete(&self, id: i64) -> ClientResult<()>;
}

/// Metadata services for both media kinds, including source file transfer.
#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn get(&self, kind: MediaKind, id: i64) -> ClientResult<MediaItem>;

    /// Open a streaming download of the source media file.
    async fn download(&self, kind: MediaKind, id: i64) -> ClientResult<MediaDownload>;

    /// Upload an encoded file as the new media source.
    async fn upload(&self, kind: MediaKind, id: i64, path: &Path) -> ClientResult<()>;
}

/// History service: write-once audit records.
#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn create(&self, item: &HistoryItem) -> ClientResult<i64>;
}
