//! Workspace lifecycle management
//!
//! Manages the allocation, use, and reclamation of per-job workspace
//! directories, plus the periodic sweep that removes stale directories
//! left behind by crash or leak paths.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Errors that occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace at {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove workspace at {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An exclusive per-job directory
///
/// Owned by exactly one job for its lifetime, never shared or reused.
///
/// # Cleanup
///
/// Always call [`remove()`](Self::remove) explicitly when the job reaches a
/// terminal state. The `Drop` implementation does best-effort removal and
/// logs a warning, but it is a backstop, not the cleanup path.
#[derive(Debug)]
pub struct Workspace {
    /// Job id this workspace belongs to
    id: Uuid,

    /// Path to the workspace directory
    path: PathBuf,

    /// Whether the directory has been removed
    removed: bool,
}

impl Workspace {
    /// Allocate a fresh workspace under `root`.
    ///
    /// The directory is named by a newly generated job id, so it cannot
    /// collide with any other job, past or present.
    #[instrument(skip(root))]
    pub async fn create(root: &Path) -> Result<Self, WorkspaceError> {
        let id = Uuid::new_v4();
        let path = root.join(id.to_string());

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: path.clone(),
                source,
            })?;

        debug!(%id, ?path, "workspace created");

        Ok(Self {
            id,
            path,
            removed: false,
        })
    }

    /// The job id that owns this workspace
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path to the workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Host path of a file inside the workspace
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<PathBuf, WorkspaceError> {
        let path = self.file_path(name);
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| WorkspaceError::Write {
                path: path.clone(),
                source,
            })?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(path)
    }

    /// Remove the workspace directory.
    ///
    /// Idempotent: removing twice, or removing a directory the sweep
    /// already claimed, succeeds. Real removal failures are returned.
    #[must_use = "removal errors should be handled"]
    #[instrument(skip(self))]
    pub async fn remove(&mut self) -> Result<(), WorkspaceError> {
        if self.removed {
            return Ok(());
        }

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            // The sweep and an active job may race on the same directory
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "workspace already gone");
            }
            Err(source) => {
                warn!(path = ?self.path, error = %source, "workspace removal failed");
                return Err(WorkspaceError::Remove {
                    path: self.path.clone(),
                    source,
                });
            }
        }

        self.removed = true;
        debug!(id = %self.id, "workspace removed");
        Ok(())
    }

    /// Check whether the workspace has been removed
    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.removed {
            warn!(
                id = %self.id,
                path = %self.path.display(),
                "Workspace dropped without explicit removal; attempting best-effort cleanup"
            );
            if let Err(e) = std::fs::remove_dir_all(&self.path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %self.path.display(), error = %e, "best-effort cleanup failed");
            }
        }
    }
}

/// Remove workspace directories under `root` older than `max_age`.
///
/// Backstop for crash/leak paths; live jobs remove their own directory
/// synchronously. Tolerates entries that vanish mid-sweep (an active job's
/// own cleanup may race with us) and keeps going past per-entry errors.
/// Returns the number of directories removed.
#[instrument(skip(root))]
pub async fn sweep_stale(root: &Path, max_age: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        // No root yet means nothing to sweep
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!(?root, error = %e, "failed to read workspace root for sweep");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(?root, error = %e, "failed to read sweep entry");
                break;
            }
        };

        let age = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified.elapsed().unwrap_or(Duration::ZERO),
            Err(e) => {
                debug!(path = ?entry.path(), error = %e, "skipping unreadable sweep entry");
                continue;
            }
        };

        if age < max_age {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => {
                debug!(path = ?entry.path(), ?age, "swept stale workspace");
                removed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = ?entry.path(), error = %e, "failed to sweep stale workspace");
            }
        }
    }

    if removed > 0 {
        debug!(removed, "sweep complete");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_root() -> PathBuf {
        std::env::temp_dir()
            .join("parlab-test")
            .join(Uuid::new_v4().to_string())
    }

    #[tokio::test]
    async fn create_and_remove() {
        let root = test_root();
        let mut ws = Workspace::create(&root).await.unwrap();
        assert!(ws.path().exists());
        assert!(ws.path().starts_with(&root));

        ws.remove().await.unwrap();
        assert!(!ws.path().exists());
        assert!(ws.is_removed());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let root = test_root();
        let mut ws = Workspace::create(&root).await.unwrap();
        ws.remove().await.unwrap();
        ws.remove().await.unwrap();

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn remove_tolerates_external_deletion() {
        let root = test_root();
        let mut ws = Workspace::create(&root).await.unwrap();
        // Simulate the sweep winning the race
        std::fs::remove_dir_all(ws.path()).unwrap();
        ws.remove().await.unwrap();

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn workspaces_are_exclusive() {
        let root = test_root();
        let mut a = Workspace::create(&root).await.unwrap();
        let mut b = Workspace::create(&root).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.id(), b.id());

        a.remove().await.unwrap();
        b.remove().await.unwrap();
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn write_file_lands_inside_workspace() {
        let root = test_root();
        let mut ws = Workspace::create(&root).await.unwrap();
        let path = ws.write_file("program.c", b"int main(){}").await.unwrap();
        assert!(path.starts_with(ws.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"int main(){}");

        ws.remove().await.unwrap();
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn sweep_removes_everything_at_zero_age() {
        let root = test_root();
        let ws_a = Workspace::create(&root).await.unwrap();
        let ws_b = Workspace::create(&root).await.unwrap();
        // Suppress the drop warning path: the sweep is about to claim them
        std::mem::forget(ws_a);
        std::mem::forget(ws_b);

        let removed = sweep_stale(&root, Duration::ZERO).await;
        assert_eq!(removed, 2);
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn sweep_spares_fresh_workspaces() {
        let root = test_root();
        let mut ws = Workspace::create(&root).await.unwrap();

        let removed = sweep_stale(&root, Duration::from_secs(3600)).await;
        assert_eq!(removed, 0);
        assert!(ws.path().exists());

        ws.remove().await.unwrap();
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn sweep_tolerates_missing_root() {
        let root = test_root();
        assert_eq!(sweep_stale(&root, Duration::ZERO).await, 0);
    }
}
