//! Per-run temporary workspace.
//!
//! Every file a render job touches on local disk is allocated here, under a
//! directory named after the job's run id. [`TempWorkspace::release`] removes
//! all of it; if a workspace is dropped without being released (panic, or the
//! owning future was cancelled) the `Drop` impl performs the same cleanup
//! synchronously.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use caption_models::RunId;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Kind of artifact allocated in a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Local copy of the source video
    Input,
    /// Rendered output video
    Output,
    /// Wrapped caption text for the overlay at this index
    Caption(usize),
}

impl ArtifactKind {
    fn file_name(&self) -> String {
        match self {
            ArtifactKind::Input => "input.mp4".to_string(),
            ArtifactKind::Output => "output.mp4".to_string(),
            ArtifactKind::Caption(index) => format!("caption_{}.txt", index),
        }
    }
}

/// Temporary files owned by a single render job.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: PathBuf,
    tracked: Vec<PathBuf>,
    released: bool,
}

impl TempWorkspace {
    /// Create the run directory `<root>/caption-<run_id>`.
    pub async fn create(root: impl AsRef<Path>, run_id: &RunId) -> MediaResult<Self> {
        let dir = root.as_ref().join(format!("caption-{}", run_id));
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Created run workspace");

        Ok(Self {
            dir,
            tracked: Vec::new(),
            released: false,
        })
    }

    /// Run directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocate a path for an artifact and start tracking it.
    ///
    /// Allocation does not create the file. Allocating the same kind twice
    /// returns the same path.
    pub fn allocate(&mut self, kind: ArtifactKind) -> PathBuf {
        let path = self.dir.join(kind.file_name());
        if !self.tracked.contains(&path) {
            self.tracked.push(path.clone());
        }
        path
    }

    /// Every path allocated so far, in allocation order.
    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Delete every tracked file that exists, then the run directory.
    ///
    /// Missing files are not an error. Returns the number of files removed.
    pub async fn release(mut self) -> usize {
        self.released = true;

        let mut removed = 0;
        for path in &self.tracked {
            match tokio::fs::remove_file(path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove artifact"),
            }
        }

        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %self.dir.display(), error = %e, "Failed to remove run directory"),
        }

        debug!(dir = %self.dir.display(), removed, "Released run workspace");
        removed
    }

    fn release_blocking(&self) {
        for path in &self.tracked {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove artifact");
                }
            }
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != ErrorKind::NotFound {
                warn!(dir = %self.dir.display(), error = %e, "Failed to remove run directory");
            }
        }
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                dir = %self.dir.display(),
                "TempWorkspace dropped without release() - cleaning up synchronously"
            );
            self.release_blocking();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_namespaces_by_run_id() {
        let root = TempDir::new().unwrap();
        let run_id = RunId::from("run-a");
        let ws = TempWorkspace::create(root.path(), &run_id).await.unwrap();

        assert_eq!(ws.dir(), root.path().join("caption-run-a"));
        assert!(ws.dir().is_dir());
        ws.release().await;
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_not_collide() {
        let root = TempDir::new().unwrap();
        let mut a = TempWorkspace::create(root.path(), &RunId::new()).await.unwrap();
        let mut b = TempWorkspace::create(root.path(), &RunId::new()).await.unwrap();

        assert_ne!(a.allocate(ArtifactKind::Input), b.allocate(ArtifactKind::Input));
        a.release().await;
        b.release().await;
    }

    #[tokio::test]
    async fn test_allocate_tracks_each_path_once() {
        let root = TempDir::new().unwrap();
        let mut ws = TempWorkspace::create(root.path(), &RunId::new()).await.unwrap();

        let input = ws.allocate(ArtifactKind::Input);
        let again = ws.allocate(ArtifactKind::Input);
        let caption = ws.allocate(ArtifactKind::Caption(3));

        assert_eq!(input, again);
        assert!(caption.ends_with("caption_3.txt"));
        assert_eq!(ws.tracked().len(), 2);
        assert!(!input.exists(), "allocation must not create the file");
        ws.release().await;
    }

    #[tokio::test]
    async fn test_release_removes_existing_and_ignores_missing() {
        let root = TempDir::new().unwrap();
        let mut ws = TempWorkspace::create(root.path(), &RunId::new()).await.unwrap();

        let input = ws.allocate(ArtifactKind::Input);
        let output = ws.allocate(ArtifactKind::Output);
        let caption = ws.allocate(ArtifactKind::Caption(0));
        tokio::fs::write(&input, b"video").await.unwrap();
        tokio::fs::write(&caption, b"text").await.unwrap();

        let dir = ws.dir().to_path_buf();
        let removed = ws.release().await;

        assert_eq!(removed, 2);
        assert!(!input.exists());
        assert!(!output.exists());
        assert!(!caption.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_release_removes_untracked_leftovers() {
        let root = TempDir::new().unwrap();
        let ws = TempWorkspace::create(root.path(), &RunId::new()).await.unwrap();
        tokio::fs::write(ws.dir().join("stray.log"), b"x").await.unwrap();

        let dir = ws.dir().to_path_buf();
        ws.release().await;
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_drop_without_release_cleans_up() {
        let root = TempDir::new().unwrap();
        let dir;
        let input;
        {
            let mut ws = TempWorkspace::create(root.path(), &RunId::new()).await.unwrap();
            input = ws.allocate(ArtifactKind::Input);
            tokio::fs::write(&input, b"video").await.unwrap();
            dir = ws.dir().to_path_buf();
        }
        assert!(!input.exists());
        assert!(!dir.exists());
    }
}
