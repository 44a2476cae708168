//! FFmpeg CLI wrapper for the optibot encoding agent.
//!
//! This crate provides:
//! - A command builder and runner with `-progress` parsing
//! - A duration probe (null-output encode pass)
//! - Video codec selection from platform and acceleration hardware
//! - Media file extension helpers used by the temp-area janitor

pub mod codec;
pub mod command;
pub mod error;
pub mod fs;
pub mod probe;
pub mod progress;
pub mod transcoder;

pub use codec::{select_video_codec, AccelVendor, Platform};
pub use command::{check_ffmpeg, TranscodeCommand, TranscodeRunner};
pub use error::{MediaError, MediaResult};
pub use fs::{
    is_hidden_file_name, is_media_file_name, is_reclaimable_media_file, MEDIA_FILE_EXTENSIONS,
};
pub use probe::probe_duration;
pub use progress::{format_percentage, TranscodeProgress};
pub use transcoder::{FfmpegTranscoder, ProgressFn, TranscodeParams, Transcoder};
