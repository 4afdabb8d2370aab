//! Blob storage for uploaded images.
//!
//! Keys are slash-separated paths (e.g. `uploads/1700000000000-photo.jpg`)
//! mapped onto a directory tree by the local backend.

use crate::db::errors::{DbError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A stored blob, as returned by listings.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
}

/// Trait for blob storage backends
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store content under the given key, overwriting any existing blob
    async fn store(&self, key: &str, content: &[u8]) -> Result<()>;

    /// Retrieve blob content by key
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete a blob by key
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether a blob exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// List blobs, optionally restricted to a key prefix
    async fn list(&self, prefix: Option<&str>, limit: usize) -> Result<Vec<StoredObject>>;
}

/// Local filesystem storage backend - stores blobs under a base directory
pub struct LocalBlobStorage {
    base_path: PathBuf,
}

impl LocalBlobStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Map a key onto a path under the base directory, rejecting anything
    /// that would escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = key.starts_with('/')
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if key.is_empty() || escapes {
            return Err(DbError::Other(anyhow::anyhow!("Invalid storage key: {key}")));
        }

        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn store(&self, key: &str, content: &[u8]) -> Result<()> {
        let full_path = self.resolve(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;

        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(key)?;

        if !full_path.is_file() {
            return Err(DbError::NotFound);
        }

        let mut file = fs::File::open(&full_path).await?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;

        Ok(content)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.resolve(key)?;

        if full_path.is_file() {
            fs::remove_file(&full_path).await?;
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.resolve(key)?;
        Ok(full_path.is_file())
    }

    async fn list(&self, prefix: Option<&str>, limit: usize) -> Result<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        // Iterative walk; keys are the paths relative to the base directory
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(DbError::Other(e.into())),
            };

            while let Some(entry) = entries.next_entry().await.map_err(|e| DbError::Other(e.into()))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| DbError::Other(e.into()))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let key = match path.strip_prefix(&self.base_path) {
                    Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                    Err(_) => continue,
                };
                if let Some(prefix) = prefix {
                    if !key.starts_with(prefix) {
                        continue;
                    }
                }

                let metadata = entry.metadata().await.map_err(|e| DbError::Other(e.into()))?;
                objects.push(StoredObject {
                    key,
                    size: metadata.len(),
                });
            }
        }

        objects.sort_by(|a, b| b.key.cmp(&a.key));
        objects.truncate(limit);
        Ok(objects)
    }
}

/// Create the storage backend, ensuring its directory exists.
pub async fn create_blob_storage(path: &Path) -> Result<Arc<dyn BlobStorage>> {
    tracing::info!("Creating local blob storage backend (path: {:?})", path);
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(DbError::Other(anyhow::anyhow!(
            "Failed to create blob storage directory {:?}: {}",
            path,
            e
        )));
    }
    Ok(Arc::new(LocalBlobStorage::new(path.to_path_buf())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_retrieve_delete_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(temp_dir.path().to_path_buf());

        let content = b"fake image bytes";
        storage.store("uploads/1-photo.jpg", content).await.unwrap();

        assert!(storage.exists("uploads/1-photo.jpg").await.unwrap());

        let retrieved = storage.retrieve("uploads/1-photo.jpg").await.unwrap();
        assert_eq!(retrieved, content);

        storage.delete("uploads/1-photo.jpg").await.unwrap();
        assert!(!storage.exists("uploads/1-photo.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn retrieve_missing_blob_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(temp_dir.path().to_path_buf());

        let result = storage.retrieve("uploads/missing.jpg").await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(temp_dir.path().to_path_buf());

        for key in ["../outside.txt", "/etc/passwd", "uploads/../../outside.txt", ""] {
            assert!(storage.store(key, b"x").await.is_err(), "key {key:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn list_with_prefix_and_limit() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(temp_dir.path().to_path_buf());

        storage.store("uploads/1-a.jpg", b"a").await.unwrap();
        storage.store("uploads/2-b.jpg", b"bb").await.unwrap();
        storage.store("covers/3-c.jpg", b"ccc").await.unwrap();

        let uploads = storage.list(Some("uploads/"), 100).await.unwrap();
        assert_eq!(uploads.len(), 2);
        assert!(uploads.iter().all(|o| o.key.starts_with("uploads/")));

        let all = storage.list(None, 100).await.unwrap();
        assert_eq!(all.len(), 3);

        let limited = storage.list(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
