//! Persisted volcano snapshot.
//!
//! The volcano feed keeps no in-memory history between polls; instead the
//! last raw payload is written to a file and read back on the next cycle
//! (and across restarts). Writes go to a sibling temp file that is then
//! renamed over the target, so a crash mid-write leaves the previous
//! snapshot intact.

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while reading or writing the snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File-backed store for the most recent raw volcano payload.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored payload.
    ///
    /// Returns `Ok(None)` when no snapshot has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the file exists but cannot be read.
    pub async fn load(&self) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replaces the stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the temp file cannot be written
    /// or renamed into place.
    pub async fn save(&self, payload: &str) -> Result<(), PersistenceError> {
        let tmp = self.tmp_path();
        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&tmp, payload).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
