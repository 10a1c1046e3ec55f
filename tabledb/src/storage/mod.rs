// Byte-level file access for the document, blocking and async

use crate::error::{Result, TableDbError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

/// Reads and writes the whole document file at one path.
///
/// Writes replace the target in a single rename, so a reader never sees a
/// half-written document.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True only when the path names an existing regular file.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read_all(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| TableDbError::io(&self.path, e))
    }

    pub fn write_all(&self, bytes: &[u8]) -> Result<()> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir).map_err(|e| TableDbError::io(&dir, e))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| TableDbError::io(&dir, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| TableDbError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| TableDbError::io(&self.path, e.error))?;
        Ok(())
    }

    pub async fn exists_async(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    pub async fn read_all_async(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| TableDbError::io(&self.path, e))
    }

    pub async fn write_all_async(&self, bytes: &[u8]) -> Result<()> {
        let dir = self.parent_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| TableDbError::io(&dir, e))?;

        // Removes the temp file on every exit before the rename, including
        // when this future is dropped mid-write.
        let tmp = TempPath::new(self.sibling_temp_path());
        let mut file = tokio::fs::File::create(tmp.path())
            .await
            .map_err(|e| TableDbError::io(tmp.path(), e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| TableDbError::io(tmp.path(), e))?;
        file.sync_all()
            .await
            .map_err(|e| TableDbError::io(tmp.path(), e))?;
        drop(file);

        tokio::fs::rename(tmp.path(), &self.path)
            .await
            .map_err(|e| TableDbError::io(&self.path, e))?;
        tmp.keep();
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn sibling_temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.parent_dir()
            .join(format!(".{file_name}.{}.{seq}.tmp", std::process::id()))
    }
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A temporary file path deleted on drop unless kept.
struct TempPath {
    path: PathBuf,
    keep: bool,
}

impl TempPath {
    fn new(path: PathBuf) -> Self {
        TempPath { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
