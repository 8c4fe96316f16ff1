use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    application::services::{PendingWrite, StorageService},
    services::error::StorageError,
};

const TEMP_UPLOAD_PREFIX: &str = ".upload-";
const TEMP_UPLOAD_SUFFIX: &str = ".part";

pub fn is_temp_upload_name(name: &str) -> bool {
    name.starts_with(TEMP_UPLOAD_PREFIX) && name.ends_with(TEMP_UPLOAD_SUFFIX)
}

/// Stores uploads as plain files in a single directory.
///
/// Bytes go to a hidden `.upload-<uuid>.part` file first. Commit hard-links the finished
/// temporary file under its final name, so a file under its final name is always complete
/// and an existing file is never replaced. Leftover temporary files are swept at startup.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    directory: PathBuf,
}

impl LocalDiskStorage {
    pub async fn new(directory: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)
            .await
            .map_err(StorageError::io(format!(
                "creating upload directory {}",
                directory.display()
            )))?;

        Ok(Self { directory })
    }

    /// Deletes temporary files left by interrupted uploads. Returns how many were removed.
    pub async fn sweep_stale(&self) -> Result<usize, StorageError> {
        let mut entries = fs::read_dir(&self.directory)
            .await
            .map_err(StorageError::io("listing upload directory"))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(StorageError::io("listing upload directory"))?
        {
            let name = entry.file_name();
            if !is_temp_upload_name(&name.to_string_lossy()) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Cannot remove stale upload {}: {}", entry.path().display(), e),
            }
        }

        Ok(removed)
    }

    fn temp_path(&self) -> PathBuf {
        self.directory.join(format!(
            "{}{}{}",
            TEMP_UPLOAD_PREFIX,
            Uuid::new_v4(),
            TEMP_UPLOAD_SUFFIX
        ))
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn begin(&self) -> Result<Box<dyn PendingWrite>, StorageError> {
        let temp_path = self.temp_path();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(StorageError::io("creating temporary upload file"))?;

        debug!("Opened pending upload {}", temp_path.display());

        Ok(Box::new(LocalPendingWrite {
            directory: self.directory.clone(),
            temp_path,
            file: Some(file),
            finished: false,
        }))
    }

    fn directory(&self) -> &Path {
        &self.directory
    }
}

struct LocalPendingWrite {
    directory: PathBuf,
    temp_path: PathBuf,
    file: Option<File>,
    finished: bool,
}

impl LocalPendingWrite {
    fn validate_name(final_name: &str) -> Result<(), StorageError> {
        let valid = !final_name.is_empty()
            && !final_name.starts_with('.')
            && !final_name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(StorageError::InvalidName(final_name.to_string()));
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StorageError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(StorageError::io("flushing upload"))?;
            file.sync_all()
                .await
                .map_err(StorageError::io("syncing upload"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl PendingWrite for LocalPendingWrite {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let file = self.file.as_mut().ok_or(StorageError::AlreadyFinished)?;
        file.write_all(chunk)
            .await
            .map_err(StorageError::io("writing upload chunk"))
    }

    async fn commit(&mut self, final_name: &str) -> Result<PathBuf, StorageError> {
        if self.finished {
            return Err(StorageError::AlreadyFinished);
        }
        Self::validate_name(final_name)?;
        self.flush().await?;

        // A hard link publishes the complete file in one step and fails on a taken name
        let final_path = self.directory.join(final_name);
        match fs::hard_link(&self.temp_path, &final_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::NameTaken(final_name.to_string()));
            }
            Err(e) => {
                return Err(StorageError::Io {
                    action: "publishing upload".to_string(),
                    source: e,
                });
            }
        }

        if let Err(e) = fs::remove_file(&self.temp_path).await {
            warn!(
                "Cannot remove temporary upload {} after publishing: {}",
                self.temp_path.display(),
                e
            );
        }

        self.finished = true;
        Ok(final_path)
    }

    async fn discard(&mut self) {
        self.file.take();
        if self.finished {
            return;
        }
        self.finished = true;
        match fs::remove_file(&self.temp_path).await {
            Ok(()) => debug!("Discarded pending upload {}", self.temp_path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Cannot remove pending upload {}: {}",
                self.temp_path.display(),
                e
            ),
        }
    }
}

impl Drop for LocalPendingWrite {
    // Covers requests dropped mid-stream, e.g. when the client disconnects.
    // Drop cannot await, so this is a single blocking unlink on the current worker.
    fn drop(&mut self) {
        if !self.finished {
            self.file.take();
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(directory: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(directory)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("uploads").join("company-logos");

        let storage = LocalDiskStorage::new(&target).await.unwrap();

        assert!(target.is_dir());
        assert_eq!(storage.directory(), target.as_path());
    }

    #[tokio::test]
    async fn pending_bytes_are_invisible_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();

        let mut pending = storage.begin().await.unwrap();
        pending.write_chunk(b"hello ").await.unwrap();
        pending.write_chunk(b"world").await.unwrap();

        let listed = names(dir.path());
        assert_eq!(listed.len(), 1);
        assert!(is_temp_upload_name(&listed[0]));

        let path = pending.commit("greeting-1.png").await.unwrap();
        assert_eq!(path, dir.path().join("greeting-1.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
        assert_eq!(names(dir.path()), vec!["greeting-1.png"]);
    }

    #[tokio::test]
    async fn commit_never_replaces_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("logo-1.png"), b"original").unwrap();

        let mut pending = storage.begin().await.unwrap();
        pending.write_chunk(b"newcomer").await.unwrap();

        let err = pending.commit("logo-1.png").await.unwrap_err();
        assert!(matches!(err, StorageError::NameTaken(ref n) if n == "logo-1.png"));
        assert_eq!(std::fs::read(dir.path().join("logo-1.png")).unwrap(), b"original");

        let path = pending.commit("logo-1-1.png").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"newcomer");
    }

    #[tokio::test]
    async fn failed_publish_leaves_nothing_under_the_final_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();

        let mut pending = storage.begin().await.unwrap();
        pending.write_chunk(b"content").await.unwrap();
        let temp = names(dir.path()).remove(0);
        std::fs::remove_file(dir.path().join(&temp)).unwrap();

        let err = pending.commit("logo-1.png").await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(!dir.path().join("logo-1.png").exists());
        pending.discard().await;
        assert!(names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn published_file_is_the_only_entry_and_complete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("logo-1.png"), b"original").unwrap();

        let mut pending = storage.begin().await.unwrap();
        pending.write_chunk(b"newcomer").await.unwrap();
        pending.commit("logo-1.png").await.unwrap_err();

        for name in names(dir.path()) {
            let len = std::fs::metadata(dir.path().join(&name)).unwrap().len();
            assert!(len > 0, "{name} is empty");
        }

        pending.commit("logo-1-1.png").await.unwrap();
        assert_eq!(names(dir.path()), vec!["logo-1-1.png", "logo-1.png"]);
        assert_eq!(
            std::fs::read(dir.path().join("logo-1-1.png")).unwrap(),
            b"newcomer"
        );
    }

    #[tokio::test]
    async fn discard_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();

        let mut pending = storage.begin().await.unwrap();
        pending.write_chunk(b"partial").await.unwrap();
        pending.discard().await;

        assert!(names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn dropping_an_unfinished_write_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();

        let mut pending = storage.begin().await.unwrap();
        pending.write_chunk(b"partial").await.unwrap();
        drop(pending);

        assert!(names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn rejects_names_that_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();
        let mut pending = storage.begin().await.unwrap();

        for name in ["", "../evil.png", "a/b.png", ".hidden.png"] {
            let err = pending.commit(name).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidName(_)), "{name:?}");
        }
        pending.discard().await;
    }

    #[tokio::test]
    async fn sweep_removes_only_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".upload-stale.part"), b"x").unwrap();
        std::fs::write(dir.path().join("logo-1.png"), b"keep").unwrap();
        let storage = LocalDiskStorage::new(dir.path()).await.unwrap();

        let removed = storage.sweep_stale().await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(names(dir.path()), vec!["logo-1.png"]);
    }
}
