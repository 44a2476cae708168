//! HTTP clients for the optibot backend services.
//!
//! This crate provides:
//! - The collaborator contracts the lifecycle engine depends on
//!   (queue, work tracking, media metadata, history)
//! - A reqwest-backed implementation with basic auth and bounded timeouts
//! - Streaming file download/upload for remote staging and delivery

pub mod error;
pub mod http;
pub mod services;

pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use services::{
    HistoryService, MediaDownload, MetadataService, QueueService, WorkService,
};
