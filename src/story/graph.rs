use super::asset::{AssetType, NewStoryAsset, SourceType, StoryAsset, StorySession};
use super::store::{StoryStore, StoryStoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Integrity violations in the story/asset parent-child structure. These
/// guard against programming errors in call ordering, not user mistakes.
#[derive(Debug, Error)]
pub enum AssetGraphError {
    /// A transcript needs a committed audio/video asset on the same story.
    /// Attaching an orphaned transcript would be a silent data-integrity
    /// bug.
    #[error("story {0} has no audio/video asset to attach a transcript to")]
    OrphanTranscript(Uuid),

    #[error("transcription assets carry text content, not a storage path")]
    TranscriptShape,

    #[error("binary asset is missing its storage path")]
    MissingStoragePath,

    #[error("text asset is missing its text content")]
    MissingTextContent,

    #[error("story {0} has been deleted")]
    SessionDeleted(Uuid),

    #[error(transparent)]
    Store(#[from] StoryStoreError),
}

/// Application-layer invariants over story sessions and their assets.
///
/// The storage layer does not enforce these; workflow code must route every
/// attach through here.
pub struct StoryGraph {
    store: Arc<dyn StoryStore>,
}

impl StoryGraph {
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    pub async fn create_session(
        &self,
        title: String,
        created_by_user_id: Option<Uuid>,
    ) -> Result<StorySession, AssetGraphError> {
        let session = self.store.create_session(title, created_by_user_id).await?;
        info!("story session {} created", session.id);
        Ok(session)
    }

    pub async fn get_session(&self, id: Uuid) -> Result<StorySession, AssetGraphError> {
        Ok(self.store.get_session(id).await?)
    }

    pub async fn soft_delete_session(&self, id: Uuid) -> Result<(), AssetGraphError> {
        self.store.soft_delete_session(id).await?;
        info!("story session {id} tombstoned");
        Ok(())
    }

    /// Attach one asset to a story, enforcing shape and parentage
    /// invariants.
    pub async fn attach_asset(
        &self,
        story_session_id: Uuid,
        descriptor: NewStoryAsset,
    ) -> Result<StoryAsset, AssetGraphError> {
        let session = self.store.get_session(story_session_id).await?;
        if session.is_deleted() {
            return Err(AssetGraphError::SessionDeleted(story_session_id));
        }

        self.check_shape(story_session_id, &descriptor).await?;

        let asset = StoryAsset {
            id: Uuid::new_v4(),
            story_session_id,
            asset_type: descriptor.asset_type,
            source_type: descriptor.source_type,
            storage_path: descriptor.storage_path,
            text_content: descriptor.text_content,
            mime_type: descriptor.mime_type,
            created_by_user_id: descriptor.created_by_user_id,
            created_at: Utc::now(),
        };
        let asset = self.store.insert_asset(asset).await?;
        debug!(
            "attached {:?}/{:?} asset {} to story {story_session_id}",
            asset.asset_type, asset.source_type, asset.id
        );
        Ok(asset)
    }

    /// Attach a transcript, replacing any prior transcript on the story.
    ///
    /// Replace-on-retry keeps re-transcription idempotent in effect: a
    /// retry updates the companion text instead of accumulating duplicates.
    pub async fn attach_transcript(
        &self,
        story_session_id: Uuid,
        text: String,
        created_by_user_id: Option<Uuid>,
    ) -> Result<StoryAsset, AssetGraphError> {
        // Validate before touching anything: a rejected attach must not
        // have deleted the transcript it was meant to replace.
        let session = self.store.get_session(story_session_id).await?;
        if session.is_deleted() {
            return Err(AssetGraphError::SessionDeleted(story_session_id));
        }
        let existing = self.store.assets_for_session(story_session_id).await?;
        if !existing.iter().any(|a| a.asset_type.is_transcribable_media()) {
            return Err(AssetGraphError::OrphanTranscript(story_session_id));
        }

        for stale in existing.iter().filter(|a| a.is_companion_transcript()) {
            self.store.delete_asset(stale.id).await?;
            debug!("replaced stale transcript {} on story {story_session_id}", stale.id);
        }

        self.attach_asset(
            story_session_id,
            NewStoryAsset::transcript(text, created_by_user_id),
        )
        .await
    }

    /// A media asset on the given story, validated as transcribable.
    pub async fn transcribable_media_asset(
        &self,
        story_session_id: Uuid,
        asset_id: Uuid,
    ) -> Result<StoryAsset, AssetGraphError> {
        let assets = self.store.assets_for_session(story_session_id).await?;
        let asset = assets
            .into_iter()
            .find(|a| a.id == asset_id)
            .ok_or(StoryStoreError::AssetNotFound(asset_id))?;
        if !asset.asset_type.is_transcribable_media() || asset.storage_path.is_none() {
            return Err(AssetGraphError::OrphanTranscript(story_session_id));
        }
        Ok(asset)
    }

    /// Assets rendered as standalone content blocks, in display order:
    /// media first, then photos, external links, and notes. Companion
    /// transcripts are excluded; they render alongside their source media.
    pub async fn primary_assets(
        &self,
        story_session_id: Uuid,
    ) -> Result<Vec<StoryAsset>, AssetGraphError> {
        let mut assets: Vec<StoryAsset> = self
            .store
            .assets_for_session(story_session_id)
            .await?
            .into_iter()
            .filter(|a| !a.is_companion_transcript())
            .collect();
        assets.sort_by_key(|a| (display_rank(a.asset_type), a.created_at));
        Ok(assets)
    }

    /// Resolve the companion transcript for a media asset on the same
    /// story, if one exists. Non-media assets have no companion.
    pub async fn companion_transcript(
        &self,
        media_asset_id: Uuid,
    ) -> Result<Option<StoryAsset>, AssetGraphError> {
        let media = self.store.get_asset(media_asset_id).await?;
        if !media.asset_type.is_transcribable_media() {
            return Ok(None);
        }
        let assets = self
            .store
            .assets_for_session(media.story_session_id)
            .await?;
        Ok(assets.into_iter().find(|a| a.is_companion_transcript()))
    }

    async fn check_shape(
        &self,
        story_session_id: Uuid,
        descriptor: &NewStoryAsset,
    ) -> Result<(), AssetGraphError> {
        if descriptor.source_type == SourceType::Transcription {
            if descriptor.text_content.is_none() || descriptor.storage_path.is_some() {
                return Err(AssetGraphError::TranscriptShape);
            }
            let assets = self.store.assets_for_session(story_session_id).await?;
            if !assets.iter().any(|a| a.asset_type.is_transcribable_media()) {
                return Err(AssetGraphError::OrphanTranscript(story_session_id));
            }
            return Ok(());
        }

        match descriptor.asset_type {
            AssetType::Text => {
                if descriptor.text_content.is_none() {
                    return Err(AssetGraphError::MissingTextContent);
                }
            }
            _ => {
                if descriptor.storage_path.is_none() {
                    return Err(AssetGraphError::MissingStoragePath);
                }
            }
        }
        Ok(())
    }
}

fn display_rank(asset_type: AssetType) -> u8 {
    match asset_type {
        AssetType::Audio | AssetType::Video => 0,
        AssetType::Photo => 1,
        AssetType::ExternalMedia => 2,
        AssetType::Text => 3,
    }
}
