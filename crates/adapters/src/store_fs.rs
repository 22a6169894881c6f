//! Filesystem artifact store

use async_trait::async_trait;
use phrasecast_domain::naming::is_artifact_file;
use phrasecast_domain::{ArtifactRef, ArtifactStore, ImageArtifact, StoreError};
use std::path::{Path, PathBuf};

/// Stores artifacts as files in one content directory
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.dir.join(name))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn prepare(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Directory {
                path: self.dir.display().to_string(),
                message: e.to_string(),
            })
    }

    async fn persist(&self, artifact: &ImageArtifact) -> Result<ArtifactRef, StoreError> {
        let name = artifact.file_name();
        let write_error = |message: String| StoreError::Write {
            name: name.clone(),
            message,
        };

        let target = self
            .path_for(&name)
            .ok_or_else(|| write_error("invalid artifact name".to_string()))?;
        // Readers never list dot-files, so they never see a partial write
        let partial = self.dir.join(format!(".{}.partial", name));

        if let Err(e) = tokio::fs::write(&partial, &artifact.bytes).await {
            return Err(write_error(e.to_string()));
        }
        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_error(e.to_string()));
        }

        Ok(ArtifactRef::from_name(name))
    }

    async fn list_all(&self) -> Result<Vec<ArtifactRef>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "Content directory missing, nothing listed");
                return Ok(vec![]);
            }
            Err(e) => return Err(StoreError::List(e.to_string())),
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::List(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            if name.starts_with('.') || !is_artifact_file(&name) {
                continue;
            }

            artifacts.push(ArtifactRef::from_name(name));
        }

        artifacts.sort();
        Ok(artifacts)
    }

    async fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, StoreError> {
        let read_error = |message: String| StoreError::Read {
            name: artifact.name.clone(),
            message,
        };

        let path = self
            .path_for(&artifact.name)
            .ok_or_else(|| read_error("invalid artifact name".to_string()))?;

        tokio::fs::read(&path)
            .await
            .map_err(|e| read_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(index: u32, label: &str, bytes: &[u8]) -> ImageArtifact {
        ImageArtifact {
            sequence_index: index,
            source_text: label.to_lowercase(),
            label: label.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn names(refs: &[ArtifactRef]) -> Vec<&str> {
        refs.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_prepare_creates_nested_directory() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path().join("a/b/content"));

        store.prepare().await.unwrap();

        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_prepare_fails_when_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("content");
        std::fs::write(&blocker, b"x").unwrap();

        let result = FsArtifactStore::new(&blocker).prepare().await;

        assert!(matches!(result, Err(StoreError::Directory { .. })));
    }

    #[tokio::test]
    async fn test_persist_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let stored = store.persist(&artifact(7, "HOLA", b"jpeg")).await.unwrap();

        assert_eq!(stored.name, "0007_HOLA.jpg");
        assert_eq!(stored.sequence_index, Some(7));
        assert_eq!(store.read(&stored).await.unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_persist_overwrites_same_name() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        store.persist(&artifact(1, "A", b"old")).await.unwrap();
        let stored = store.persist(&artifact(1, "A", b"new")).await.unwrap();

        assert_eq!(store.read(&stored).await.unwrap(), b"new");
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_numerically_and_filters() {
        let dir = TempDir::new().unwrap();
        for name in [
            "10_X.jpg",
            "2_X.jpg",
            "cover.JPEG",
            "notes.txt",
            "0001_A.jpg",
            ".0003_C.jpg.partial",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("5_dir.jpg")).unwrap();

        let store = FsArtifactStore::new(dir.path());
        let listed = store.list_all().await.unwrap();

        assert_eq!(
            names(&listed),
            vec!["0001_A.jpg", "2_X.jpg", "10_X.jpg", "cover.JPEG"]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path().join("never-created"));

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let result = store.read(&ArtifactRef::from_name("../etc/passwd.jpg")).await;

        assert!(matches!(result, Err(StoreError::Read { .. })));
    }

    #[tokio::test]
    async fn test_read_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let result = store.read(&ArtifactRef::from_name("0001_GONE.jpg")).await;

        assert!(matches!(result, Err(StoreError::Read { .. })));
    }
}
