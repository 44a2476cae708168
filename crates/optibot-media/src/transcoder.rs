//! Transcoder seam.
//!
//! The lifecycle engine talks to the transcoder through this trait so job
//! orchestration can be tested without an ffmpeg binary on PATH.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::codec::{select_video_codec, AccelVendor, Platform};
use crate::command::{TranscodeCommand, TranscodeRunner};
use crate::error::MediaResult;

/// Progress callback invoked with elapsed output time in milliseconds.
pub type ProgressFn = Box<dyn Fn(i64) + Send + Sync + 'static>;

/// Parameters for one transcode invocation.
#[derive(Debug, Clone)]
pub struct TranscodeParams {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Embedded title metadata tag.
    pub title: String,
    /// Constant rate factor passed to the encoder.
    pub crf: u8,
}

/// External transcoder invoked by the lifecycle engine.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Measure the input's total duration in milliseconds (no-output probe).
    async fn probe_duration(&self, input: &std::path::Path) -> MediaResult<i64>;

    /// Transcode input to output, reporting elapsed output time through
    /// `on_progress` as the encode runs.
    async fn transcode(&self, params: &TranscodeParams, on_progress: ProgressFn)
        -> MediaResult<()>;
}

/// Production transcoder backed by the ffmpeg CLI.
pub struct FfmpegTranscoder {
    vendor: AccelVendor,
}

impl FfmpegTranscoder {
    pub fn new(vendor: AccelVendor) -> Self {
        Self { vendor }
    }

    /// The encoder this instance will pass to ffmpeg on this host.
    pub fn video_codec(&self) -> &'static str {
        select_video_codec(Platform::current(), self.vendor)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe_duration(&self, input: &std::path::Path) -> MediaResult<i64> {
        crate::probe::probe_duration(input).await
    }

    async fn transcode(
        &self,
        params: &TranscodeParams,
        on_progress: ProgressFn,
    ) -> MediaResult<()> {
        let cmd = TranscodeCommand::new(&params.input, &params.output)
            .video_codec(self.video_codec())
            .crf(params.crf)
            .preset("medium")
            .copy_audio()
            .copy_subtitles()
            .title(&params.title);

        TranscodeRunner::new()
            .run_with_progress(&cmd, move |progress| on_progress(progress.out_time_ms))
            .await
    }
}
