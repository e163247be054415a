//! Render metrics recorded through the `metrics` facade.

use metrics::{counter, histogram};

pub mod names {
    pub const RENDERS_TOTAL: &str = "caption_renders_total";
    pub const RENDER_DURATION_SECONDS: &str = "caption_render_duration_seconds";
    pub const FFMPEG_DURATION_SECONDS: &str = "caption_ffmpeg_duration_seconds";
}

/// Record a finished render. `outcome` is `success` or the failed stage name.
pub fn record_render(outcome: &'static str, duration_secs: f64) {
    counter!(names::RENDERS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, "outcome" => outcome).record(duration_secs);
}

pub fn record_ffmpeg_duration(duration_secs: f64) {
    histogram!(names::FFMPEG_DURATION_SECONDS).record(duration_secs);
}
