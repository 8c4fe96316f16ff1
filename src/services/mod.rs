mod error;
mod local_storage;

pub use error::StorageError;
pub use local_storage::LocalDiskStorage;

use std::{path::Path, sync::Arc};

use tracing::{info, warn};

use crate::application::services::StorageService;

/// Opens the logo directory, creating it when missing, and clears partial uploads
/// left behind by an earlier process.
pub async fn create_storage_service(
    directory: &Path,
) -> Result<Arc<dyn StorageService>, StorageError> {
    let storage = LocalDiskStorage::new(directory).await?;

    match storage.sweep_stale().await {
        Ok(0) => {}
        Ok(removed) => info!(
            "Removed {} stale partial upload(s) from {}",
            removed,
            directory.display()
        ),
        Err(e) => warn!("Failed to sweep stale uploads: {}", e),
    }

    Ok(Arc::new(storage))
}
