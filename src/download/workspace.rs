use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use teloxide::types::UserId;
use uuid::Uuid;

use crate::core::error::AppError;

/// Scoped working directory of one pipeline run.
///
/// Everything a run writes (the fetched file, split parts) lives under this directory.
/// [`RunWorkspace::close`] removes it on normal exits; `Drop` removes it when the run is
/// cancelled or panics before reaching `close`.
#[derive(Debug)]
pub struct RunWorkspace {
    path: PathBuf,
    closed: bool,
}

impl RunWorkspace {
    /// Creates `<root>/run-<user>-<generation>-<uuid>`.
    pub async fn create(root: &Path, user: UserId, generation: u64) -> Result<Self, AppError> {
        let path = root.join(format!("run-{}-{}-{}", user.0, generation, Uuid::new_v4().simple()));
        fs_err::tokio::create_dir_all(&path).await?;
        log::debug!("Created workspace {}", path.display());
        Ok(Self { path, closed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the directory and everything in it.
    pub async fn close(mut self) {
        self.closed = true;
        match fs_err::tokio::remove_dir_all(&self.path).await {
            Ok(()) => log::debug!("Removed workspace {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove workspace: {}", e),
        }
    }
}

impl Drop for RunWorkspace {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match fs_err::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("Removed abandoned workspace {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove abandoned workspace: {}", e),
        }
    }
}
