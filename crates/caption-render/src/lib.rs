//! Caption overlay render pipeline.
//!
//! Drives one render job through its stages:
//! fetch the source, build the drawtext graph, run FFmpeg, publish the
//! result. Every temporary artifact lives in a per-run workspace that is
//! released on every exit path.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use logging::JobLogger;
pub use pipeline::{destination_name, RenderOutcome, RenderPipeline, RenderStage};
