//! Encoding agent.
//!
//! This crate provides:
//! - The job lifecycle engine (acquisition, staging, transcode, delivery,
//!   cleanup, consecutive-failure budget)
//! - The shared job slot read by the progress reporter
//! - Remote and library staging/delivery backends
//! - The startup temp-area janitor

pub mod config;
pub mod engine;
pub mod error;
pub mod janitor;
pub mod reporter;
pub mod slot;
pub mod transfer;

pub use config::{TransferMode, WorkerConfig};
pub use engine::{JobEngine, MAX_CONSECUTIVE_FAILURES};
pub use error::{WorkerError, WorkerResult};
pub use reporter::ProgressReporter;
pub use slot::JobSlot;
pub use transfer::{LibraryTransfer, RemoteTransfer, TransferBackend};
