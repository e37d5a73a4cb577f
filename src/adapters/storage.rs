use crate::domain::model::{ArtifactMode, ProbeTarget};
use crate::domain::ports::ArtifactStore;
use crate::utils::error::{Result, ScanError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes artifacts under a local directory. Each write goes to a temp file
/// in the same directory and is renamed into place, so concurrent matches
/// sharing one filename never interleave bytes.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base_path: PathBuf,
    mode: ArtifactMode,
}

impl LocalArtifactStore {
    pub fn new(base_path: impl Into<PathBuf>, mode: ArtifactMode) -> Self {
        Self {
            base_path: base_path.into(),
            mode,
        }
    }

    pub fn path_for(&self, target: &ProbeTarget) -> PathBuf {
        self.base_path.join(self.mode.file_name(target))
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl ArtifactStore for LocalArtifactStore {
    async fn save(&self, target: ProbeTarget, data: Vec<u8>) -> Result<PathBuf> {
        let full_path = self.path_for(&target);
        let write_path = full_path.clone();

        let written = tokio::task::spawn_blocking(move || write_atomic(&write_path, &data))
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|r| r);

        match written {
            Ok(()) => Ok(full_path),
            Err(source) => Err(ScanError::ArtifactWriteError {
                path: full_path,
                source,
            }),
        }
    }
}
