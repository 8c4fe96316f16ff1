use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::{
    application::{
        error::{ApplicationError, UploadError},
        services::{
            filename::{derive_file_name, unique_suffix},
            Clock, PendingWrite, StorageService,
        },
    },
    domain::{
        config::upload_policy::UploadPolicy,
        models::file::{IncomingFile, StoredFile},
    },
    services::StorageError,
};

/// Attempts at claiming a free name when uploads land in the same clock tick.
const MAX_NAME_ATTEMPTS: u32 = 16;

/// Validates one upload against the policy and streams it into storage.
///
/// Checks run in a fixed order: declared type first, then the size hint, then the
/// running byte count while streaming. A rejection after the first byte was written
/// discards the pending write, so nothing remains on disk.
#[derive(Clone)]
pub struct UploadService {
    policy: Arc<UploadPolicy>,
    storage: Arc<dyn StorageService>,
    clock: Arc<dyn Clock>,
}

impl UploadService {
    pub fn new(
        policy: Arc<UploadPolicy>,
        storage: Arc<dyn StorageService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            storage,
            clock,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn storage(&self) -> &Arc<dyn StorageService> {
        &self.storage
    }

    /// Filter gate: the extension the stored file will carry, or `InvalidType`.
    pub fn check_type(&self, declared_mime_type: &str) -> Result<&str, UploadError> {
        self.policy
            .extension_for(declared_mime_type)
            .ok_or_else(|| UploadError::invalid_type(declared_mime_type, &self.policy))
    }

    /// Size guard.
    pub fn check_size(&self, byte_size: u64) -> Result<(), UploadError> {
        if byte_size > self.policy.max_bytes() {
            return Err(UploadError::too_large(&self.policy));
        }
        Ok(())
    }

    pub async fn accept<S, E>(
        &self,
        incoming: IncomingFile<S>,
    ) -> Result<StoredFile, ApplicationError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Into<ApplicationError> + Send,
    {
        let IncomingFile {
            declared_mime_type,
            original_name,
            size_hint,
            content,
        } = incoming;

        let extension = match self.check_type(&declared_mime_type) {
            Ok(extension) => extension.to_string(),
            Err(e) => {
                warn!(
                    original_name = %original_name,
                    mime_type = %declared_mime_type,
                    "Upload rejected: content type not accepted"
                );
                return Err(e.into());
            }
        };

        if let Some(size_hint) = size_hint {
            if let Err(e) = self.check_size(size_hint) {
                warn!(
                    original_name = %original_name,
                    size_bytes = size_hint,
                    max_bytes = self.policy.max_bytes(),
                    "Upload rejected: declared size over limit"
                );
                return Err(e.into());
            }
        }

        let mut pending = self.storage.begin().await.map_err(|e| {
            error!("Cannot open pending upload: {}", e);
            UploadError::from(e)
        })?;

        let size_bytes = match self.stream_into(pending.as_mut(), content).await {
            Ok(size_bytes) => size_bytes,
            Err(e) => {
                pending.discard().await;
                return Err(e);
            }
        };

        let millis = self.clock.now_millis();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let final_name =
                derive_file_name(&original_name, &extension, &unique_suffix(millis, attempt));

            match pending.commit(&final_name).await {
                Ok(path) => {
                    info!(
                        final_name = %final_name,
                        mime_type = %declared_mime_type,
                        size_bytes,
                        "Upload stored"
                    );
                    return Ok(StoredFile {
                        final_name,
                        path,
                        size_bytes,
                        mime_type: declared_mime_type,
                        stored_at: Utc::now(),
                    });
                }
                Err(StorageError::NameTaken(name)) => {
                    debug!("Name {} already taken, retrying with next ordinal", name);
                }
                Err(e) => {
                    error!("Cannot commit upload {}: {}", final_name, e);
                    pending.discard().await;
                    return Err(UploadError::from(e).into());
                }
            }
        }

        pending.discard().await;
        error!(
            original_name = %original_name,
            attempts = MAX_NAME_ATTEMPTS,
            "No free destination name for upload"
        );
        Err(UploadError::StorageFailure(format!(
            "no free destination name after {} attempts",
            MAX_NAME_ATTEMPTS
        ))
        .into())
    }

    async fn stream_into<S, E>(
        &self,
        pending: &mut dyn PendingWrite,
        content: S,
    ) -> Result<u64, ApplicationError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Into<ApplicationError> + Send,
    {
        let mut content = std::pin::pin!(content);
        let mut written: u64 = 0;

        while let Some(chunk) = content.next().await {
            let chunk = chunk.map_err(|e| {
                let error: ApplicationError = e.into();
                warn!("Upload stream interrupted: {:?}", error);
                error
            })?;

            written = written.saturating_add(chunk.len() as u64);
            if let Err(e) = self.check_size(written) {
                warn!(
                    received_bytes = written,
                    max_bytes = self.policy.max_bytes(),
                    "Upload rejected: size limit exceeded while streaming"
                );
                return Err(e.into());
            }

            pending.write_chunk(&chunk).await.map_err(|e| {
                error!("Cannot write upload chunk: {}", e);
                UploadError::from(e)
            })?;
        }

        Ok(written)
    }
}
