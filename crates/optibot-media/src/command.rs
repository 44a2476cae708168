//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::TranscodeProgress;

/// Builder for FFmpeg invocations.
///
/// Two shapes are produced: a normal encode writing to an output file, and a
/// null-output probe pass (`-f null -`) used only to measure duration.
#[derive(Debug, Clone)]
pub struct TranscodeCommand {
    input: PathBuf,
    /// `None` selects the null-output probe mode.
    output: Option<PathBuf>,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl TranscodeCommand {
    /// Create an encode command writing to `output`.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: Some(output.as_ref().to_path_buf()),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Create a null-output probe command: decodes the input and discards
    /// every frame, emitting progress so the caller can read the final
    /// output time.
    pub fn probe(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: None,
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an output argument (after `-i`).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Pass audio streams through without re-encoding.
    pub fn copy_audio(self) -> Self {
        self.output_arg("-c:a").output_arg("copy")
    }

    /// Pass subtitle streams through without re-encoding.
    pub fn copy_subtitles(self) -> Self {
        self.output_arg("-c:s").output_arg("copy")
    }

    /// Embed a title metadata tag.
    pub fn title(self, title: impl AsRef<str>) -> Self {
        self.output_arg("-metadata")
            .output_arg(format!("title={}", title.as_ref()))
    }

    /// Build the full argument vector.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress key=value lines on stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        match &self.output {
            Some(output) => args.push(output.to_string_lossy().to_string()),
            None => {
                args.push("-f".to_string());
                args.push("null".to_string());
                args.push("-".to_string());
            }
        }

        args
    }
}

/// Runner for FFmpeg commands with progress reporting and an optional
/// timeout.
pub struct TranscodeRunner {
    timeout_secs: Option<u64>,
}

impl Default for TranscodeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscodeRunner {
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command, discarding progress.
    pub async fn run(&self, cmd: &TranscodeCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command, invoking `progress_callback` for every progress
    /// block FFmpeg emits.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &TranscodeCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(TranscodeProgress) + Send + 'static,
    {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        if !cmd.input.exists() {
            return Err(MediaError::FileNotFound(cmd.input.clone()));
        }

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().ok_or_else(|| {
            MediaError::ffmpeg_failed("stderr not captured", None, None)
        })?;
        let mut reader = BufReader::new(stderr).lines();

        let progress_handle = tokio::spawn(async move {
            let mut current = TranscodeProgress::default();
            let mut tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(progress) = parse_progress_line(&line, &mut current) {
                    progress_callback(progress);
                } else if !line.contains('=') {
                    // Non-progress stderr output, keep the last few lines
                    // for error reporting
                    if tail.len() >= 8 {
                        tail.remove(0);
                    }
                    tail.push(line);
                }
            }

            tail.join("\n")
        });

        let result = self.wait_for_completion(&mut child).await;
        let stderr_tail = progress_handle.await.unwrap_or_default();

        match result {
            Err(MediaError::FfmpegFailed {
                message,
                exit_code,
                ..
            }) => Err(MediaError::FfmpegFailed {
                message,
                stderr: (!stderr_tail.is_empty()).then_some(stderr_tail),
                exit_code,
            }),
            other => other,
        }
    }

    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<()> {
        let status = if let Some(timeout_secs) = self.timeout_secs {
            match tokio::time::timeout(
                std::time::Duration::from_secs(timeout_secs),
                child.wait(),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => {
                    warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(timeout_secs));
                }
            }
        } else {
            child.wait().await?
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                None,
                status.code(),
            ))
        }
    }
}

/// Parse one line of FFmpeg's `-progress` output. Returns a snapshot when a
/// `progress=` line closes the current block.
fn parse_progress_line(line: &str, current: &mut TranscodeProgress) -> Option<TranscodeProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // ffmpeg reports microseconds under both names
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    current.fps = fps;
                }
            }
            "speed" => {
                if value != "N/A" {
                    if let Some(speed_str) = value.strip_suffix('x') {
                        if let Ok(speed) = speed_str.parse() {
                            current.speed = speed;
                        }
                    }
                }
            }
            "progress" => {
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}

/// Check that FFmpeg is available on PATH.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_command_args() {
        let cmd = TranscodeCommand::new("in.mp4", "out.mkv")
            .video_codec("libx265")
            .crf(24)
            .preset("medium")
            .copy_audio()
            .copy_subtitles()
            .title("Example");

        let args = cmd.build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx265"));
        assert!(joined.contains("-crf 24"));
        assert!(joined.contains("-preset medium"));
        assert!(joined.contains("-c:a copy"));
        assert!(joined.contains("-c:s copy"));
        assert!(joined.contains("-metadata title=Example"));
        assert!(joined.contains("-progress pipe:2"));
        assert_eq!(args.last().unwrap(), "out.mkv");
    }

    #[test]
    fn probe_command_uses_null_output() {
        let args = TranscodeCommand::probe("in.mp4").build_args();
        let joined = args.join(" ");
        assert!(joined.ends_with("-f null -"));
        assert!(joined.contains("-i in.mp4"));
    }

    #[test]
    fn parses_progress_blocks() {
        let mut progress = TranscodeProgress::default();

        assert!(parse_progress_line("out_time_ms=60000000", &mut progress).is_none());
        assert_eq!(progress.out_time_ms, 60_000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.001);

        parse_progress_line("frame=1440", &mut progress);
        assert_eq!(progress.frame, 1440);

        let snapshot = parse_progress_line("progress=continue", &mut progress);
        assert!(snapshot.is_some());
        assert!(!snapshot.unwrap().is_complete);

        let snapshot = parse_progress_line("progress=end", &mut progress);
        assert!(snapshot.unwrap().is_complete);
    }

    #[test]
    fn ignores_speed_na_and_unknown_keys() {
        let mut progress = TranscodeProgress::default();
        parse_progress_line("speed=N/A", &mut progress);
        assert_eq!(progress.speed, 0.0);
        assert!(parse_progress_line("bitrate=1024.0kbits/s", &mut progress).is_none());
        assert!(parse_progress_line("random stderr noise", &mut progress).is_none());
    }
}
