//! The render pipeline.
//!
//! One call to [`RenderPipeline::render`] is one independent job:
//!
//! ```text
//! Start -> Fetching -> GraphBuilt -> Processing -> Publishing -> Done
//! ```
//!
//! Any stage may move to `Failed`. The run workspace is released before the
//! result is returned, whichever way the job ends.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use caption_media::{
    ArtifactKind, FfmpegCommand, FilterGraphBuilder, MediaError, SourceFetcher, TempWorkspace,
    VideoProcessor,
};
use caption_models::{CaptionStyle, RenderRequest, RunId, ValidatedRequest};
use caption_storage::Publisher;
use chrono::Utc;
use tracing::{debug, Instrument};

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::logging::JobLogger;
use crate::metrics;

const OPERATION: &str = "caption_overlay";

/// Stages of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Start,
    Fetching,
    GraphBuilt,
    Processing,
    Publishing,
    Done,
    Failed,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Fetching => "fetching",
            Self::GraphBuilt => "graph_built",
            Self::Processing => "processing",
            Self::Publishing => "publishing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub run_id: RunId,
    pub style: CaptionStyle,
    /// Public URL of the published video
    pub url: String,
    /// Object name the video was published under
    pub destination: String,
}

/// Object name for a run's output: `overlay_<unix-millis>_<run id prefix>.mp4`.
pub fn destination_name(run_id: &RunId) -> String {
    format!(
        "overlay_{}_{}.mp4",
        Utc::now().timestamp_millis(),
        run_id.short()
    )
}

/// Fetch, caption, encode and publish source videos.
pub struct RenderPipeline {
    config: RenderConfig,
    fetcher: SourceFetcher,
    graph_builder: FilterGraphBuilder,
    processor: Arc<dyn VideoProcessor>,
    publisher: Arc<dyn Publisher>,
}

impl RenderPipeline {
    pub fn new(
        config: RenderConfig,
        processor: Arc<dyn VideoProcessor>,
        publisher: Arc<dyn Publisher>,
    ) -> RenderResult<Self> {
        let fetcher = SourceFetcher::new(
            &config.user_agent,
            config.fetch_timeout,
            config.max_source_bytes,
        )
        .map_err(RenderError::Fetch)?;
        let graph_builder = FilterGraphBuilder::new(&config.font_path);

        Ok(Self {
            config,
            fetcher,
            graph_builder,
            processor,
            publisher,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn processor(&self) -> &Arc<dyn VideoProcessor> {
        &self.processor
    }

    pub fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }

    /// Validate a raw request and render it.
    ///
    /// Validation failures return before any workspace is created or any
    /// collaborator is called.
    pub async fn handle(&self, request: RenderRequest) -> RenderResult<RenderOutcome> {
        let request = match request.validate() {
            Ok(request) => request,
            Err(e) => {
                metrics::record_render("validation", 0.0);
                return Err(e.into());
            }
        };
        self.render(&request).await
    }

    /// Render with a randomly drawn style.
    pub async fn render(&self, request: &ValidatedRequest) -> RenderResult<RenderOutcome> {
        self.render_with_style(request, CaptionStyle::pick_random())
            .await
    }

    /// Render every overlay of `request` in `style`.
    pub async fn render_with_style(
        &self,
        request: &ValidatedRequest,
        style: CaptionStyle,
    ) -> RenderResult<RenderOutcome> {
        let run_id = RunId::new();
        let logger = JobLogger::new(&run_id, OPERATION);
        let span = logger.create_span();

        async move {
            let started = Instant::now();
            logger.log_start(&format!(
                "stage {}: {} overlays, style {}, source {}",
                RenderStage::Start,
                request.overlays().len(),
                style,
                request.video_url()
            ));

            let result = match TempWorkspace::create(&self.config.work_dir, &run_id).await {
                Ok(mut workspace) => {
                    let result = self
                        .run_stages(&run_id, request, style, &mut workspace, &logger)
                        .await;
                    let removed = workspace.release().await;
                    debug!(removed, "Released run workspace");
                    result
                }
                Err(e) => Err(RenderError::Workspace(e)),
            };

            let elapsed = started.elapsed().as_secs_f64();
            match &result {
                Ok(outcome) => {
                    metrics::record_render("success", elapsed);
                    logger.log_completion(&format!("{} in {:.2}s", outcome.url, elapsed));
                }
                Err(e) => {
                    metrics::record_render(e.stage(), elapsed);
                    logger.log_error(&format!(
                        "stage {} after {}: {}",
                        RenderStage::Failed,
                        e.stage(),
                        e
                    ));
                    if let Some(stderr) = e.ffmpeg_stderr() {
                        logger.log_error(&format!("FFmpeg stderr: {}", stderr));
                    }
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        run_id: &RunId,
        request: &ValidatedRequest,
        style: CaptionStyle,
        workspace: &mut TempWorkspace,
        logger: &JobLogger,
    ) -> RenderResult<RenderOutcome> {
        let input = workspace.allocate(ArtifactKind::Input);
        let output = workspace.allocate(ArtifactKind::Output);

        logger.log_progress(&format!("stage {}", RenderStage::Fetching));
        let bytes = self
            .fetcher
            .fetch(request.video_url().as_str(), &input)
            .await
            .map_err(RenderError::Fetch)?;
        debug!(bytes, "Fetched source video");

        let graph = self
            .graph_builder
            .build(request.overlays(), style, workspace)
            .await
            .map_err(RenderError::GraphBuild)?;
        logger.log_progress(&format!(
            "stage {} ({} drawtext stages)",
            RenderStage::GraphBuilt,
            graph.stage_count()
        ));

        logger.log_progress(&format!("stage {}", RenderStage::Processing));
        let cmd = FfmpegCommand::overlay(&input, &output, &graph, &self.config.video_codec);
        let ffmpeg_started = Instant::now();
        self.processor
            .process(&cmd)
            .await
            .map_err(RenderError::Processing)?;
        metrics::record_ffmpeg_duration(ffmpeg_started.elapsed().as_secs_f64());

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(RenderError::Processing(MediaError::FileNotFound(output)));
        }

        let destination = destination_name(run_id);
        logger.log_progress(&format!(
            "stage {} as {}",
            RenderStage::Publishing,
            destination
        ));
        let url = self.publisher.publish(&output, &destination).await?;

        logger.log_progress(&format!("stage {}", RenderStage::Done));
        Ok(RenderOutcome {
            run_id: run_id.clone(),
            style,
            url,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_name() {
        let run_id = RunId::from("0123456789abcdef");
        let name = destination_name(&run_id);

        assert!(name.starts_with("overlay_"));
        assert!(name.ends_with("_01234567.mp4"));

        let millis = name
            .trim_start_matches("overlay_")
            .trim_end_matches("_01234567.mp4");
        assert!(millis.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(RenderStage::GraphBuilt.to_string(), "graph_built");
        assert_eq!(RenderStage::Failed.as_str(), "failed");
    }
}
