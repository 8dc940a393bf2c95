use super::gateway::{TranscriptionError, TranscriptionGateway};
use crate::storage::{SigningError, StorageGateway, StoragePath, TRANSCRIPTION_HANDOFF_TTL};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TranscribeError {
    /// A temporary URL could not be minted; the provider is never invoked.
    #[error("could not prepare media for transcription: {0}")]
    Signing(#[from] SigningError),

    /// The provider failed or returned no usable text.
    #[error(transparent)]
    Provider(#[from] TranscriptionError),
}

/// Drives the strict store → sign → transcribe pipeline for one persisted
/// media reference.
///
/// Fails closed: without a valid accessible URL there is no transcription
/// attempt. No retry is performed automatically; retries are caller
/// initiated.
pub struct TranscriptionOrchestrator {
    storage: Arc<dyn StorageGateway>,
    gateway: Arc<dyn TranscriptionGateway>,
}

impl TranscriptionOrchestrator {
    pub fn new(storage: Arc<dyn StorageGateway>, gateway: Arc<dyn TranscriptionGateway>) -> Self {
        Self { storage, gateway }
    }

    /// Obtain transcript text for a previously stored media binary.
    ///
    /// Attaching the result to the story asset graph is the caller's
    /// responsibility.
    pub async fn transcribe(&self, media: &StoragePath) -> Result<String, TranscribeError> {
        let access = self
            .storage
            .create_temporary_access_url(media, TRANSCRIPTION_HANDOFF_TTL)
            .await?;
        debug!("transcription handoff url minted, expires {}", access.expires_at);

        let text = self.gateway.transcribe(&access.url).await?;
        info!("transcription succeeded for {media} ({} chars)", text.len());
        Ok(text)
    }
}
