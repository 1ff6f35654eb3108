//! Local copies of transformed images for inspection

use crate::key::StorageKey;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct DebugImageWriter {
    dir: PathBuf,
}

impl DebugImageWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to `<dir>/<file name of key>`, creating the directory
    pub async fn save(&self, key: &StorageKey, bytes: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(key.file_name());
        fs::write(&path, bytes).await?;
        Ok(path)
    }
}
