//! Render request payload and validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::limits::{MAX_CAPTION_CHARS, MAX_OVERLAYS, MAX_OVERLAY_END_SECS, MAX_URL_LENGTH};
use crate::Overlay;

/// Render request as received on the wire.
///
/// Both fields are optional here so that a missing field surfaces as a
/// validation error with a stable message rather than a deserializer error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub overlays: Option<Vec<Overlay>>,
}

/// A request that passed validation. Construct via [`RenderRequest::validate`].
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    video_url: Url,
    overlays: Vec<Overlay>,
}

impl ValidatedRequest {
    pub fn video_url(&self) -> &Url {
        &self.video_url
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }
}

/// Request validation failures.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Payload must include videoUrl and overlays array.")]
    MissingFields,

    #[error("Invalid videoUrl: {0}")]
    InvalidVideoUrl(String),

    #[error("Too many overlays: {count} (maximum {max})")]
    TooManyOverlays { count: usize, max: usize },

    #[error("Overlay {index} caption is too long: {length} characters (maximum {max})")]
    CaptionTooLong {
        index: usize,
        length: usize,
        max: usize,
    },

    #[error("Overlay {index} has an invalid time range: start={start}, end={end}")]
    InvalidTimeRange { index: usize, start: f64, end: f64 },
}

impl RenderRequest {
    pub fn new(video_url: impl Into<String>, overlays: Vec<Overlay>) -> Self {
        Self {
            video_url: Some(video_url.into()),
            overlays: Some(overlays),
        }
    }

    /// Validate the request, consuming it.
    pub fn validate(self) -> Result<ValidatedRequest, RequestError> {
        let video_url = self
            .video_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(RequestError::MissingFields)?;
        let overlays = self.overlays.ok_or(RequestError::MissingFields)?;

        let video_url = parse_video_url(&video_url)?;

        if overlays.len() > MAX_OVERLAYS {
            return Err(RequestError::TooManyOverlays {
                count: overlays.len(),
                max: MAX_OVERLAYS,
            });
        }

        for (index, overlay) in overlays.iter().enumerate() {
            let length = overlay.text.chars().count();
            if length > MAX_CAPTION_CHARS {
                return Err(RequestError::CaptionTooLong {
                    index,
                    length,
                    max: MAX_CAPTION_CHARS,
                });
            }

            if !overlay.has_valid_window() || overlay.end > MAX_OVERLAY_END_SECS {
                return Err(RequestError::InvalidTimeRange {
                    index,
                    start: overlay.start,
                    end: overlay.end,
                });
            }
        }

        Ok(ValidatedRequest {
            video_url,
            overlays,
        })
    }
}

fn parse_video_url(raw: &str) -> Result<Url, RequestError> {
    let raw = raw.trim();
    if raw.len() > MAX_URL_LENGTH {
        return Err(RequestError::InvalidVideoUrl(format!(
            "exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }

    let url = Url::parse(raw).map_err(|e| RequestError::InvalidVideoUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(RequestError::InvalidVideoUrl(format!(
                "unsupported protocol '{}'",
                scheme
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(RequestError::InvalidVideoUrl("missing host".to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RenderRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let validated = parse(
            r#"{"videoUrl":"https://cdn.example.com/in.mp4","overlays":[{"text":"hi","start":0,"end":2}]}"#,
        )
        .validate()
        .unwrap();
        assert_eq!(validated.video_url().host_str(), Some("cdn.example.com"));
        assert_eq!(validated.overlays().len(), 1);
    }

    #[test]
    fn test_missing_video_url_is_rejected() {
        let err = parse(r#"{"overlays":[]}"#).validate().unwrap_err();
        assert!(matches!(err, RequestError::MissingFields));
        assert_eq!(err.to_string(), "Payload must include videoUrl and overlays array.");
    }

    #[test]
    fn test_blank_video_url_is_rejected() {
        let err = parse(r#"{"videoUrl":"  ","overlays":[]}"#).validate().unwrap_err();
        assert!(matches!(err, RequestError::MissingFields));
    }

    #[test]
    fn test_missing_overlays_is_rejected() {
        let err = parse(r#"{"videoUrl":"https://a.example/v.mp4"}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RequestError::MissingFields));
    }

    #[test]
    fn test_empty_overlays_is_valid() {
        let validated = parse(r#"{"videoUrl":"https://a.example/v.mp4","overlays":[]}"#)
            .validate()
            .unwrap();
        assert!(validated.overlays().is_empty());
    }

    #[test]
    fn test_non_array_overlays_fails_to_deserialize() {
        let result: Result<RenderRequest, _> =
            serde_json::from_str(r#"{"videoUrl":"https://a.example/v.mp4","overlays":"nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = RenderRequest::new("file:///etc/passwd", vec![])
            .validate()
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidVideoUrl(_)));
    }

    #[test]
    fn test_rejects_inverted_time_range() {
        let err = RenderRequest::new(
            "https://a.example/v.mp4",
            vec![Overlay::new("ok", 0.0, 1.0), Overlay::new("bad", 3.0, 2.0)],
        )
        .validate()
        .unwrap_err();
        assert!(matches!(err, RequestError::InvalidTimeRange { index: 1, .. }));
    }

    #[test]
    fn test_rejects_too_many_overlays() {
        let overlays = (0..=MAX_OVERLAYS)
            .map(|i| Overlay::new("x", i as f64, i as f64 + 1.0))
            .collect();
        let err = RenderRequest::new("https://a.example/v.mp4", overlays)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RequestError::TooManyOverlays { .. }));
    }

    #[test]
    fn test_rejects_long_caption() {
        let text = "a".repeat(MAX_CAPTION_CHARS + 1);
        let err = RenderRequest::new("https://a.example/v.mp4", vec![Overlay::new(text, 0.0, 1.0)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, RequestError::CaptionTooLong { index: 0, .. }));
    }
}
