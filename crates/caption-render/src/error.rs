//! Render error types.

use caption_media::MediaError;
use caption_models::RequestError;
use caption_storage::StorageError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// A failed render, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    Validation(#[from] RequestError),

    #[error("Failed to fetch source video: {0}")]
    Fetch(#[source] MediaError),

    #[error("Failed to build filter graph: {0}")]
    GraphBuild(#[source] MediaError),

    #[error("Video processing failed: {0}")]
    Processing(#[source] MediaError),

    #[error("Failed to publish render: {0}")]
    Publish(#[from] StorageError),

    #[error("Workspace error: {0}")]
    Workspace(#[source] MediaError),
}

impl RenderError {
    /// Name of the failed stage, also used as the metrics outcome label.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Fetch(_) => "fetch",
            Self::GraphBuild(_) => "graph_build",
            Self::Processing(_) => "processing",
            Self::Publish(_) => "publish",
            Self::Workspace(_) => "workspace",
        }
    }

    /// Whether the caller sent a bad request, as opposed to the job failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// FFmpeg stderr tail, when processing failed with one.
    pub fn ffmpeg_stderr(&self) -> Option<&str> {
        match self {
            Self::Processing(MediaError::FfmpegFailed { stderr, .. }) => stderr.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(RenderError::from(RequestError::MissingFields).stage(), "validation");
        assert_eq!(
            RenderError::Fetch(MediaError::download_failed("HTTP 404")).stage(),
            "fetch"
        );
        assert_eq!(
            RenderError::from(StorageError::upload_failed("denied")).stage(),
            "publish"
        );
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = RenderError::from(RequestError::MissingFields);
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Payload must include videoUrl and overlays array.");
    }

    #[test]
    fn test_ffmpeg_stderr() {
        let err = RenderError::Processing(MediaError::ffmpeg_failed(
            "exit 1",
            Some("No such filter".to_string()),
            Some(1),
        ));
        assert_eq!(err.ffmpeg_stderr(), Some("No such filter"));
        assert!(!err.is_client_error());
    }
}
