//! FFmpeg progress samples and percentage formatting.

/// Progress information parsed from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default)]
pub struct TranscodeProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl TranscodeProgress {
    /// Progress percentage given the probed total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).min(100.0)
    }
}

/// Format elapsed output time against a total duration as a percentage with
/// two decimal places, e.g. `"50.00%"`. Clamped to `"100.00%"`.
pub fn format_percentage(out_time_ms: i64, total_duration_ms: i64) -> String {
    let pct = if total_duration_ms <= 0 {
        0.0
    } else {
        ((out_time_ms.max(0) as f64 / total_duration_ms as f64) * 100.0).min(100.0)
    };
    format!("{:.2}%", pct)
}
