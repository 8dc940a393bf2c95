use super::asset::{AssetType, NewStoryAsset, StoryAsset, StorySession};
use super::graph::{AssetGraphError, StoryGraph};
use super::store::{StoryStore, StoryStoreError};
use crate::capture::media::{probe_media, MediaBlob};
use crate::capture::mime::extension_for_mime;
use crate::storage::{StorageError, StorageGateway, StoragePath};
use crate::transcription::{TranscriptionGateway, TranscriptionOrchestrator};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How a call site wants transcription failures handled.
///
/// The same orchestrator serves both dispositions; the divergent try/catch
/// behavior lives here instead of being re-implemented at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Transcription is the point of the user action: report its failure.
    Surface,
    /// Transcription is best-effort enrichment: log and continue.
    Suppress,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Graph(#[from] AssetGraphError),

    #[error(transparent)]
    Store(#[from] StoryStoreError),
}

/// What happened to the transcription step of a save.
///
/// A transcription failure never un-saves the committed media asset, so it
/// is reported alongside the saved outcome rather than replacing it.
#[derive(Debug, Clone)]
pub enum TranscriptOutcome {
    Attached(StoryAsset),
    /// No transcription was attempted (non-media asset, or a suppressed
    /// failure).
    Skipped,
    /// Transcription failed under the `Surface` policy; carries the
    /// underlying reason verbatim.
    Failed(String),
}

impl TranscriptOutcome {
    pub fn transcript(&self) -> Option<&StoryAsset> {
        match self {
            TranscriptOutcome::Attached(asset) => Some(asset),
            _ => None,
        }
    }
}

/// Result of the primary record-and-save flow.
#[derive(Debug)]
pub struct SavedStory {
    pub session: StorySession,
    pub media_asset: StoryAsset,
    pub transcript: TranscriptOutcome,
}

/// Result of the secondary upload flow.
#[derive(Debug)]
pub struct UploadedAsset {
    pub asset: StoryAsset,
    pub transcript: TranscriptOutcome,
}

/// Metadata for a story session about to be created.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStory {
    pub title: String,
    pub created_by_user_id: Option<Uuid>,
}

/// An uploaded file handed to the secondary attach flow.
#[derive(Debug)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub created_by_user_id: Option<Uuid>,
}

/// Orchestrates the save flows feeding the story asset graph.
///
/// All flows share the same ordering guarantee: the media asset row is
/// committed before any transcription is attempted, so a transcript can
/// never exist without the source asset it decorates. Network steps for a
/// single save run strictly sequentially (store, then sign, then
/// transcribe); independent saves may be in flight concurrently.
pub struct StoryCapturePipeline {
    graph: StoryGraph,
    storage: Arc<dyn StorageGateway>,
    orchestrator: TranscriptionOrchestrator,
}

impl StoryCapturePipeline {
    pub fn new(
        store: Arc<dyn StoryStore>,
        storage: Arc<dyn StorageGateway>,
        transcriber: Arc<dyn TranscriptionGateway>,
    ) -> Self {
        Self {
            graph: StoryGraph::new(store),
            storage: Arc::clone(&storage),
            orchestrator: TranscriptionOrchestrator::new(storage, transcriber),
        }
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    /// Primary path: the user finalized title and metadata and saved a
    /// freshly recorded take.
    ///
    /// A storage failure is fatal to the save, but an already-created
    /// session row is left in place so the user can retry the failed step
    /// instead of redoing the whole capture.
    pub async fn save_recorded_story(
        &self,
        new_story: NewStory,
        blob: MediaBlob,
        policy: FailurePolicy,
    ) -> Result<SavedStory, PipelineError> {
        let created_by = new_story.created_by_user_id;
        let session = self
            .graph
            .create_session(new_story.title, created_by)
            .await?;

        let (media_asset, transcript) = self
            .attach_recorded_media(session.id, blob, created_by, policy)
            .await?;

        info!(
            "story {} saved with media asset {}",
            session.id, media_asset.id
        );
        Ok(SavedStory {
            session,
            media_asset,
            transcript,
        })
    }

    /// Attach a recorded take to an existing story (additional recordings
    /// after the initial save).
    pub async fn attach_recorded_media(
        &self,
        story_session_id: Uuid,
        blob: MediaBlob,
        created_by_user_id: Option<Uuid>,
        policy: FailurePolicy,
    ) -> Result<(StoryAsset, TranscriptOutcome), PipelineError> {
        let asset_type = AssetType::from_mime(&blob.mime_type);
        let storage_path = self.store_blob(story_session_id, &blob).await?;

        let media_asset = self
            .graph
            .attach_asset(
                story_session_id,
                NewStoryAsset::recorded_media(
                    asset_type,
                    storage_path,
                    blob.mime_type.clone(),
                    created_by_user_id,
                ),
            )
            .await?;

        let transcript = self
            .enrich_with_transcript(&media_asset, created_by_user_id, policy)
            .await;
        Ok((media_asset, transcript))
    }

    /// Secondary path: attach an uploaded file to an existing story.
    ///
    /// Transcription here is best-effort by convention; callers pass
    /// `Suppress` unless the upload screen explicitly promises a
    /// transcript.
    pub async fn attach_uploaded_media(
        &self,
        story_session_id: Uuid,
        upload: MediaUpload,
        policy: FailurePolicy,
    ) -> Result<UploadedAsset, PipelineError> {
        let asset_type = AssetType::from_mime(&upload.mime_type);

        if asset_type.is_transcribable_media() {
            // Advisory only: a probe failure never blocks the upload.
            match probe_media(&upload.bytes, Some(extension_for_mime(&upload.mime_type))) {
                Ok(probe_info) => debug!(
                    "upload probe: duration {:?}s, {:?} Hz",
                    probe_info.duration_seconds, probe_info.sample_rate
                ),
                Err(e) => debug!("upload probe failed: {e:#}"),
            }
        }

        let key = self.object_key(story_session_id, &upload.mime_type);
        let storage_path = self
            .storage
            .store(&upload.bytes, &key, &upload.mime_type)
            .await?;

        let asset = self
            .graph
            .attach_asset(
                story_session_id,
                NewStoryAsset::uploaded(
                    asset_type,
                    storage_path,
                    upload.mime_type.clone(),
                    upload.created_by_user_id,
                ),
            )
            .await?;

        let transcript = if asset_type.is_transcribable_media() {
            self.enrich_with_transcript(&asset, upload.created_by_user_id, policy)
                .await
        } else {
            TranscriptOutcome::Skipped
        };

        Ok(UploadedAsset { asset, transcript })
    }

    /// Attach a user-written note. Notes never trigger transcription.
    pub async fn attach_note(
        &self,
        story_session_id: Uuid,
        text: String,
        created_by_user_id: Option<Uuid>,
    ) -> Result<StoryAsset, PipelineError> {
        Ok(self
            .graph
            .attach_asset(story_session_id, NewStoryAsset::note(text, created_by_user_id))
            .await?)
    }

    /// Caller-initiated re-transcription of an already-saved media asset.
    /// The prior transcript, if any, is replaced rather than duplicated.
    pub async fn retranscribe(
        &self,
        story_session_id: Uuid,
        media_asset_id: Uuid,
        policy: FailurePolicy,
    ) -> Result<TranscriptOutcome, PipelineError> {
        let media_asset = self
            .graph
            .transcribable_media_asset(story_session_id, media_asset_id)
            .await?;
        Ok(self
            .enrich_with_transcript(&media_asset, media_asset.created_by_user_id, policy)
            .await)
    }

    /// Tombstone a story. Assets and binaries remain; nothing in this
    /// pipeline hard-deletes.
    pub async fn delete_story(&self, story_session_id: Uuid) -> Result<(), PipelineError> {
        Ok(self.graph.soft_delete_session(story_session_id).await?)
    }

    /// Run the sign-then-transcribe pipeline for a committed media asset
    /// and attach the result, honoring the call site's failure policy.
    async fn enrich_with_transcript(
        &self,
        media_asset: &StoryAsset,
        created_by_user_id: Option<Uuid>,
        policy: FailurePolicy,
    ) -> TranscriptOutcome {
        let Some(storage_path) = media_asset.storage_path.as_ref() else {
            // Committed media always carries a storage path; guard anyway.
            warn!("media asset {} has no storage path; skipping transcription", media_asset.id);
            return TranscriptOutcome::Skipped;
        };

        let result = self.orchestrator.transcribe(storage_path).await;
        match result {
            Ok(text) => {
                match self
                    .graph
                    .attach_transcript(media_asset.story_session_id, text, created_by_user_id)
                    .await
                {
                    Ok(transcript) => TranscriptOutcome::Attached(transcript),
                    Err(e) => self.transcript_failure(media_asset, policy, e.to_string()),
                }
            }
            Err(e) => self.transcript_failure(media_asset, policy, e.to_string()),
        }
    }

    fn transcript_failure(
        &self,
        media_asset: &StoryAsset,
        policy: FailurePolicy,
        reason: String,
    ) -> TranscriptOutcome {
        match policy {
            FailurePolicy::Surface => TranscriptOutcome::Failed(reason),
            FailurePolicy::Suppress => {
                warn!(
                    "transcription of asset {} failed (suppressed): {reason}",
                    media_asset.id
                );
                TranscriptOutcome::Skipped
            }
        }
    }

    async fn store_blob(
        &self,
        story_session_id: Uuid,
        blob: &MediaBlob,
    ) -> Result<StoragePath, PipelineError> {
        let key = self.object_key(story_session_id, &blob.mime_type);
        Ok(self
            .storage
            .store(&blob.bytes, &key, &blob.mime_type)
            .await?)
    }

    fn object_key(&self, story_session_id: Uuid, mime_type: &str) -> String {
        format!(
            "{story_session_id}/{}.{}",
            Utc::now().timestamp_millis(),
            extension_for_mime(mime_type)
        )
    }
}
