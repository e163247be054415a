//! Resource limits applied to inbound render requests.
//!
//! Every limit here bounds something that would otherwise flow straight into
//! the FFmpeg argument list, the temp workspace, or the source download.

/// Maximum number of overlays accepted in a single request.
pub const MAX_OVERLAYS: usize = 100;

/// Maximum caption length in characters, measured on the raw caption text.
pub const MAX_CAPTION_CHARS: usize = 500;

/// Latest allowed overlay end time (6 hours).
pub const MAX_OVERLAY_END_SECS: f64 = 6.0 * 3600.0;

/// Maximum source URL length.
pub const MAX_URL_LENGTH: usize = 2048;

/// Default maximum source video size (2 GiB).
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 2 * 1024 * 1024 * 1024;
