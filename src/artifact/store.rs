//! On-disk artifact access for a single page.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::BuildArtifact;
use crate::page::PageError;

/// Reads, writes and deletes `<build.dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for the page with the given display name.
    pub fn for_page(build_dir: &Path, name: &str) -> Self {
        Self::new(build_dir.join(format!("{name}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the artifact.
    ///
    /// `Ok(None)` when no file exists. Unparseable content is
    /// [`PageError::Corrupt`]; deleting the file is left to the caller.
    pub async fn read(&self) -> Result<Option<BuildArtifact>, PageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PageError::io(&self.path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PageError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// Delete the artifact. A missing file is not an error.
    pub async fn remove(&self) -> Result<(), PageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PageError::io(&self.path, e)),
        }
    }
}

// Artifacts are written by the build script; these serve fixtures.
#[cfg(test)]
impl ArtifactStore {
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Write the artifact atomically (temp file + rename).
    pub async fn write(&self, artifact: &BuildArtifact) -> Result<(), PageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PageError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(artifact).map_err(|e| PageError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| PageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PageError::io(&self.path, e))
    }
}
