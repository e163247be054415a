#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for caption overlay rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Word wrapping for caption text
//! - Drawtext filter graph construction with path escaping
//! - Per-run temporary workspace with guaranteed cleanup
//! - Streaming source download over HTTP

pub mod command;
pub mod download;
pub mod error;
pub mod filter_graph;
pub mod filters;
pub mod progress;
pub mod workspace;
pub mod wrap;

pub use command::{check_ffmpeg, resolve_ffmpeg, FfmpegCommand, FfmpegRunner, VideoProcessor};
pub use download::SourceFetcher;
pub use error::{MediaError, MediaResult};
pub use filter_graph::{FilterGraph, FilterGraphBuilder, BASE_VIDEO_LABEL, LINE_SPACING};
pub use filters::{escape_filter_path, sanitize_caption};
pub use progress::FfmpegProgress;
pub use workspace::{ArtifactKind, TempWorkspace};
pub use wrap::{wrap_text, WRAP_WIDTH};
