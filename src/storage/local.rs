use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{ApiError, Result};
use crate::metadata::UploadRecord;
use crate::storage::StoredFile;

/// Flat directory of uploads. The directory listing is the only record.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        fs::create_dir_all(&base_path).await?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves `name` inside the directory. Anything other than a single
    /// plain file name is refused.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part == name => Some(self.base_path.join(part)),
            _ => None,
        }
    }

    /// Writes `data` under `name`, replacing any file with the same name.
    pub async fn put(&self, name: &str, data: &Bytes) -> Result<()> {
        let file_path = self
            .resolve(name)
            .ok_or_else(|| ApiError::Internal(format!("Invalid file name: {}", name)))?;

        let mut file = fs::File::create(file_path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(())
    }

    pub async fn open(&self, name: &str) -> Result<StoredFile> {
        let file_path = self
            .resolve(name)
            .ok_or_else(|| ApiError::FileNotFound(name.to_string()))?;

        let metadata = match fs::metadata(&file_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ApiError::FileNotFound(name.to_string()));
            }
            Err(e) => return Err(ApiError::Download(e.to_string())),
        };

        if !metadata.is_file() {
            return Err(ApiError::FileNotFound(name.to_string()));
        }

        let file = fs::File::open(&file_path)
            .await
            .map_err(|e| ApiError::Download(e.to_string()))?;

        Ok(StoredFile {
            name: name.to_string(),
            size: metadata.len(),
            file,
        })
    }

    /// Every regular file in the directory, unsorted.
    pub async fn list(&self) -> Result<Vec<UploadRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = fs::metadata(entry.path()).await?;
            if !metadata.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let modified: DateTime<Utc> = metadata.modified()?.into();
            records.push(UploadRecord::new(name, metadata.len(), modified));
        }

        Ok(records)
    }

    /// Total bytes held in the directory.
    pub async fn folder_size(&self) -> Result<u64> {
        Ok(self.list().await?.iter().map(|r| r.size).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_local_storage() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).await.unwrap();

        let name = "IMG_dev_1.jpg";
        let data = Bytes::from("Hello, World!");

        storage.put(name, &data).await.unwrap();

        let mut stored = storage.open(name).await.unwrap();
        assert_eq!(stored.size, data.len() as u64);

        let mut contents = Vec::new();
        stored.file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, data.to_vec());

        let records = storage.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, name);
        assert_eq!(records[0].url, "/download/IMG_dev_1.jpg");
        assert_eq!(storage.folder_size().await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("uploads");
        let storage = LocalStorage::new(&nested).await.unwrap();

        assert!(nested.is_dir());
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).await.unwrap();

        storage.put("same.json", &Bytes::from("first")).await.unwrap();
        storage.put("same.json", &Bytes::from("2nd")).await.unwrap();

        let stored = storage.open("same.json").await.unwrap();
        assert_eq!(stored.size, 3);
    }

    #[tokio::test]
    async fn test_open_refuses_escapes() {
        let temp_dir = TempDir::new().unwrap();
        let inner = temp_dir.path().join("uploads");
        let storage = LocalStorage::new(&inner).await.unwrap();
        std::fs::write(temp_dir.path().join("secret.txt"), "secret").unwrap();
        std::fs::create_dir(inner.join("sub")).unwrap();

        for name in ["../secret.txt", "..", ".", "", "sub", "sub/x", "/etc/passwd", "missing.jpg"] {
            let result = storage.open(name).await;
            assert!(
                matches!(result, Err(ApiError::FileNotFound(_))),
                "expected not found for {:?}",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).await.unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        storage.put("a.m4a", &Bytes::from("abc")).await.unwrap();

        let records = storage.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a.m4a");
    }

    #[tokio::test]
    async fn test_list_fails_when_directory_is_gone() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("uploads");
        let storage = LocalStorage::new(&dir).await.unwrap();
        std::fs::remove_dir(&dir).unwrap();

        assert!(storage.list().await.is_err());
    }
}
