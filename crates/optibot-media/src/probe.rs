//! Media duration probe.
//!
//! Duration is measured with a null-output decode pass rather than a header
//! read: the container metadata for freshly downloaded files is not always
//! trustworthy, and the transcode percentage math needs the same clock the
//! encoder will report against.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::command::{TranscodeCommand, TranscodeRunner};
use crate::error::{MediaError, MediaResult};

/// Measure the total duration of a media file in milliseconds.
pub async fn probe_duration(input: impl AsRef<Path>) -> MediaResult<i64> {
    let input = input.as_ref();
    let cmd = TranscodeCommand::probe(input);

    let duration = Arc::new(AtomicI64::new(0));
    let duration_writer = Arc::clone(&duration);

    TranscodeRunner::new()
        .run_with_progress(&cmd, move |progress| {
            duration_writer.fetch_max(progress.out_time_ms, Ordering::Relaxed);
        })
        .await?;

    let total = duration.load(Ordering::Relaxed);
    if total <= 0 {
        return Err(MediaError::ProbeFailed(input.to_path_buf()));
    }

    Ok(total)
}
