//! Render configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use caption_models::limits::DEFAULT_MAX_SOURCE_BYTES;

/// Font locations tried in order when `FONT_PATH` is not set.
pub const FONT_FALLBACKS: &[&str] = &[
    "/app/assets/fonts/roboto-latin-700-normal.woff",
    "assets/fonts/roboto-latin-700-normal.woff",
];

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Root under which each run gets its own workspace directory
    pub work_dir: PathBuf,
    /// Explicit FFmpeg binary location (falls back to PATH lookup)
    pub ffmpeg_path: Option<String>,
    /// Font used by every drawtext stage
    pub font_path: PathBuf,
    /// Encoder for captioned output
    pub video_codec: String,
    /// Connect and per-read idle timeout for source downloads
    pub fetch_timeout: Duration,
    /// Largest accepted source body
    pub max_source_bytes: u64,
    /// User-Agent sent when fetching sources
    pub user_agent: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            ffmpeg_path: None,
            font_path: default_font_path(),
            video_codec: "libx264".to_string(),
            fetch_timeout: Duration::from_secs(300),
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            font_path: std::env::var("FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_path),
            video_codec: std::env::var("VIDEO_CODEC").unwrap_or(defaults.video_codec),
            fetch_timeout: Duration::from_secs(
                std::env::var("FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_source_bytes: std::env::var("MAX_SOURCE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_source_bytes),
            user_agent: std::env::var("FETCH_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// First fallback font that exists, or the first fallback if none do.
pub fn default_font_path() -> PathBuf {
    FONT_FALLBACKS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .unwrap_or_else(|| Path::new(FONT_FALLBACKS[0]))
        .to_path_buf()
}
