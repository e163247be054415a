//! Shared data models for the caption overlay service.
//!
//! This crate provides Serde-serializable types for:
//! - Render requests and timed caption overlays
//! - Request validation and resource limits
//! - The fixed caption style catalog
//! - Run identifiers used to namespace per-job artifacts

pub mod limits;
pub mod overlay;
pub mod request;
pub mod run;
pub mod style;

// Re-export common types
pub use overlay::Overlay;
pub use request::{RenderRequest, RequestError, ValidatedRequest};
pub use run::RunId;
pub use style::{CaptionStyle, ColorMode, Decoration, StyleParseError, StyleSpec};
