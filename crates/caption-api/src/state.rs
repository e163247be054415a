//! Application state.

use std::sync::Arc;

use caption_media::FfmpegRunner;
use caption_render::{RenderConfig, RenderPipeline};
use caption_storage::BucketClient;
use tracing::{info, warn};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<RenderPipeline>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: Arc<RenderPipeline>) -> Self {
        Self { config, pipeline }
    }

    /// Build the production pipeline from environment configuration.
    pub async fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let render_config = RenderConfig::from_env();

        let runner = FfmpegRunner::resolve(render_config.ffmpeg_path.as_deref())?;
        info!(ffmpeg = %runner.binary().display(), "Resolved FFmpeg binary");

        if !render_config.font_path.exists() {
            warn!(
                font = %render_config.font_path.display(),
                "Caption font not found; renders will fail until it is provided"
            );
        }

        let storage = BucketClient::from_env().await?;
        info!(bucket = %storage.bucket(), "Storage client ready");

        let pipeline = RenderPipeline::new(render_config, Arc::new(runner), Arc::new(storage))?;

        Ok(Self::new(config, Arc::new(pipeline)))
    }
}
