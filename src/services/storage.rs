use std::path::{Path, PathBuf};

use crate::error::BookError;
use crate::models::Artifact;

/// Writes artifacts under a single output directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the output directory. Called once at the start of a run.
    pub async fn prepare(&self) -> Result<(), BookError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write `artifact`, numbered against the run's chapter count.
    pub async fn write(
        &self,
        artifact: &Artifact,
        chapter_count: usize,
    ) -> Result<PathBuf, BookError> {
        let name = artifact.kind.file_name(chapter_count);
        self.write_bytes(&name, artifact.content.as_bytes()).await
    }

    /// Rename a file already written under the output directory.
    pub async fn rename(&self, from: &str, to: &str) -> Result<PathBuf, BookError> {
        let target = self.root.join(to);
        tokio::fs::rename(self.root.join(from), &target)
            .await
            .map_err(|source| BookError::PersistFailed {
                path: target.clone(),
                source,
            })?;
        Ok(target)
    }

    pub async fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, BookError> {
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| BookError::PersistFailed {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
