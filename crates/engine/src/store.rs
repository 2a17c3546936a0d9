use crate::error::{EngineError, Result};
use crate::paths::ProjectPath;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Where file contents come from and where commits go
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn read(&self, path: &ProjectPath) -> Result<String>;

    /// Replace the whole file; readers never observe a partial write
    async fn write(&self, path: &ProjectPath, content: &str) -> Result<()>;
}

/// Filesystem store rooted at a project directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SourceStore for FsStore {
    async fn read(&self, path: &ProjectPath) -> Result<String> {
        let full = path.to_fs_path(&self.root);
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| EngineError::read(full, e))
    }

    async fn write(&self, path: &ProjectPath, content: &str) -> Result<()> {
        let full = path.to_fs_path(&self.root);
        let tmp = temp_sibling(&full);

        if let Err(e) = tokio::fs::write(&tmp, content).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(EngineError::write(full, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(EngineError::write(full, e));
        }
        log::debug!("Committed {} ({} bytes)", path, content.len());
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.nodepatch.tmp"))
}
