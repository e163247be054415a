//! Object storage client for rendered videos.
//!
//! This crate provides:
//! - File upload to an S3-compatible bucket (GCS interoperability endpoint by default)
//! - Public URL construction for published objects
//! - The `Publisher` seam used by the render pipeline

pub mod client;
pub mod error;
pub mod publisher;

pub use client::{BucketClient, BucketConfig};
pub use error::{StorageError, StorageResult};
pub use publisher::{validate_key, Publisher, VIDEO_CONTENT_TYPE};
