//! Render endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use caption_models::{RenderRequest, RequestError};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RenderResponse {
    pub status: String,
    pub url: String,
}

/// Render captions onto the requested video and return its public URL.
///
/// Blocks until the render is published or fails.
pub async fn render(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> ApiResult<Json<RenderResponse>> {
    let Json(request) = payload.map_err(rejection_to_error)?;

    metrics::render_started();
    let _in_flight = scopeguard::guard((), |_| metrics::render_finished());

    let outcome = state.pipeline.handle(request).await.map_err(|e| {
        warn!(stage = e.stage(), error = %e, "Render request failed");
        ApiError::from(e)
    })?;

    info!(
        run_id = %outcome.run_id,
        style = %outcome.style,
        url = %outcome.url,
        "Render request completed"
    );

    Ok(Json(RenderResponse {
        status: "completed".to_string(),
        url: outcome.url,
    }))
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        // Well-formed JSON with the wrong shape, e.g. `overlays` not an array
        JsonRejection::JsonDataError(_) => {
            ApiError::bad_request(RequestError::MissingFields.to_string())
        }
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            ApiError::PayloadTooLarge(other.body_text())
        }
        other => ApiError::bad_request(other.body_text()),
    }
}
