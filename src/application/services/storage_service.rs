use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::services::StorageError;

/// Destination for accepted uploads.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Opens a pending write that is invisible under any final name until committed.
    async fn begin(&self) -> Result<Box<dyn PendingWrite>, StorageError>;

    fn directory(&self) -> &Path;
}

#[async_trait]
pub trait PendingWrite: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError>;

    /// Publishes the written bytes under `final_name`. Never replaces an existing
    /// file: an occupied name yields `StorageError::NameTaken` and the pending write
    /// stays usable for another attempt.
    async fn commit(&mut self, final_name: &str) -> Result<PathBuf, StorageError>;

    /// Drops everything written so far.
    async fn discard(&mut self);
}
