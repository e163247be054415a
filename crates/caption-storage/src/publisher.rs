//! Publishing seam between the render pipeline and object storage.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Content type of every published render.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Stores rendered files and hands back a public reference.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload the file at `path` as `destination`, returning its public URL.
    async fn publish(&self, path: &Path, destination: &str) -> StorageResult<String>;

    /// Verify the backing store is reachable.
    async fn check(&self) -> StorageResult<()>;
}

/// Reject keys that could escape the bucket root or are empty.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.trim().is_empty() {
        return Err(StorageError::invalid_key("key is empty"));
    }
    if key.starts_with('/') {
        return Err(StorageError::invalid_key(format!("{} starts with '/'", key)));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::invalid_key(format!("{} contains '..'", key)));
    }
    Ok(())
}
