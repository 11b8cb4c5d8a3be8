use crate::domain::DomainError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Blob storage for uploaded files, addressed by stored file name.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), DomainError>;
    async fn load(&self, name: &str) -> Result<Vec<u8>, DomainError>;
    /// Removes a stored file. A file that is already gone is not an error.
    async fn delete(&self, name: &str) -> Result<(), DomainError>;
}

pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    /// Creates the upload directory if it is missing.
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!("Media stored under {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, DomainError> {
        // stored names are generated server side; refuse anything path-like
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(DomainError::MediaNotFound);
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("Failed to write {}: {}", path.display(), e);
            DomainError::InternalError(e.to_string())
        })
    }

    async fn load(&self, name: &str) -> Result<Vec<u8>, DomainError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DomainError::MediaNotFound),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", path.display(), e);
                Err(DomainError::InternalError(e.to_string()))
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<(), DomainError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::error!("Failed to remove {}: {}", path.display(), e);
                Err(DomainError::InternalError(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saved_bytes_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path()).await.unwrap();

        store.save("a.png", b"png-bytes").await.unwrap();
        assert_eq!(store.load("a.png").await.unwrap(), b"png-bytes");
        assert!(matches!(
            store.load("missing.png").await,
            Err(DomainError::MediaNotFound)
        ));
        assert!(matches!(
            store.load("../etc/passwd").await,
            Err(DomainError::MediaNotFound)
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path()).await.unwrap();

        store.save("b.gif", b"gif").await.unwrap();
        store.delete("b.gif").await.unwrap();
        assert!(!dir.path().join("b.gif").exists());
        store.delete("b.gif").await.unwrap();
    }
}
