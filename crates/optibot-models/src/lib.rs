//! Shared data models for the optibot encoding agent.
//!
//! This crate provides Serde-serializable types for:
//! - Work items (the durable record of an in-flight encoding job)
//! - Queue items (unclaimed units of work)
//! - Media metadata (movies and episodes)
//! - History records for completed/failed jobs

pub mod history;
pub mod media;
pub mod queue;
pub mod work;

// Re-export common types
pub use history::HistoryItem;
pub use media::{Episode, MediaItem, MediaKind, MediaKindParseError, Movie, Show};
pub use queue::QueueItem;
pub use work::WorkItem;
