//! Axum HTTP API for caption overlay rendering.
//!
//! This crate provides:
//! - The render endpoint (`POST /render`, and `POST /` for function-style deployments)
//! - Liveness, readiness and Prometheus metrics endpoints
//! - Request ID, logging, metrics and CORS middleware

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
