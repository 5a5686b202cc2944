use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use docket_core::errors::{DocketError, DocketResult};
use docket_core::traits::ObjectStore;

/// Filesystem-backed blob store rooted at `base_dir`. Paths passed in are
/// always produced by [`docket_core::guard::blob_path`], so `{matter_id}`
/// is always the leading path segment on disk too.
pub struct FilesystemObjectStore {
    base_dir: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> DocketResult<PathBuf> {
        if path.contains("..") {
            return Err(DocketError::invalid_parameter(format!(
                "object path must not contain '..': {path}"
            )));
        }
        Ok(self.base_dir.join(path))
    }
}

fn io_err(e: std::io::Error) -> DocketError {
    DocketError::DatabaseNotConfigured {
        message: format!("object store io error: {e}"),
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> DocketResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        fs::write(&full, bytes).await.map_err(io_err)
    }

    async fn get(&self, path: &str) -> DocketResult<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocketError::ItemNotFound
            } else {
                io_err(e)
            }
        })
    }

    async fn delete(&self, path: &str) -> DocketResult<()> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(e)),
        }
    }

    async fn exists(&self, path: &str) -> DocketResult<bool> {
        let full = self.resolve(path)?;
        Ok(fs::metadata(&full).await.is_ok())
    }
}

impl FilesystemObjectStore {
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStore::new(dir.path());
        store.put("m1/documents/a.pdf", b"%PDF-1.4".to_vec()).await.unwrap();
        assert!(store.exists("m1/documents/a.pdf").await.unwrap());
        assert_eq!(store.get("m1/documents/a.pdf").await.unwrap(), b"%PDF-1.4");
        store.delete("m1/documents/a.pdf").await.unwrap();
        assert!(!store.exists("m1/documents/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStore::new(dir.path());
        let err = store.put("../escape.txt", vec![]).await.unwrap_err();
        assert_eq!(err.kind(), docket_core::errors::ErrorKind::InvalidParameter);
    }
}
