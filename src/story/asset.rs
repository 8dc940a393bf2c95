use crate::storage::StoragePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of content an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Audio,
    Video,
    Photo,
    Text,
    ExternalMedia,
}

impl AssetType {
    /// Whether this asset can be the source of a transcript.
    pub fn is_transcribable_media(self) -> bool {
        matches!(self, AssetType::Audio | AssetType::Video)
    }

    /// Classify an uploaded file by its declared MIME type.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("audio/") {
            AssetType::Audio
        } else if mime_type.starts_with("video/") {
            AssetType::Video
        } else if mime_type.starts_with("image/") {
            AssetType::Photo
        } else {
            AssetType::ExternalMedia
        }
    }
}

/// Where an asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    BrowserRecording,
    FileUpload,
    Transcription,
    Text,
    ExternalLink,
}

/// One piece of content attached to a story session.
///
/// Exactly one of `storage_path` / `text_content` is populated: binary
/// assets carry a storage reference, text and transcript assets carry their
/// content inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryAsset {
    pub id: Uuid,
    pub story_session_id: Uuid,
    pub asset_type: AssetType,
    pub source_type: SourceType,
    pub storage_path: Option<StoragePath>,
    pub text_content: Option<String>,
    pub mime_type: Option<String>,
    pub created_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl StoryAsset {
    /// Transcripts are side-channel companions of their source media, never
    /// standalone primary content.
    pub fn is_companion_transcript(&self) -> bool {
        self.source_type == SourceType::Transcription
    }
}

/// Descriptor for an asset about to be attached.
#[derive(Debug, Clone)]
pub struct NewStoryAsset {
    pub asset_type: AssetType,
    pub source_type: SourceType,
    pub storage_path: Option<StoragePath>,
    pub text_content: Option<String>,
    pub mime_type: Option<String>,
    pub created_by_user_id: Option<Uuid>,
}

impl NewStoryAsset {
    /// A freshly recorded take, already persisted to storage.
    pub fn recorded_media(
        asset_type: AssetType,
        storage_path: StoragePath,
        mime_type: String,
        created_by_user_id: Option<Uuid>,
    ) -> Self {
        Self {
            asset_type,
            source_type: SourceType::BrowserRecording,
            storage_path: Some(storage_path),
            text_content: None,
            mime_type: Some(mime_type),
            created_by_user_id,
        }
    }

    /// An uploaded file, already persisted to storage.
    pub fn uploaded(
        asset_type: AssetType,
        storage_path: StoragePath,
        mime_type: String,
        created_by_user_id: Option<Uuid>,
    ) -> Self {
        Self {
            asset_type,
            source_type: SourceType::FileUpload,
            storage_path: Some(storage_path),
            text_content: None,
            mime_type: Some(mime_type),
            created_by_user_id,
        }
    }

    /// A transcript derived from an audio/video asset on the same story.
    pub fn transcript(text: String, created_by_user_id: Option<Uuid>) -> Self {
        Self {
            asset_type: AssetType::Text,
            source_type: SourceType::Transcription,
            storage_path: None,
            text_content: Some(text),
            mime_type: None,
            created_by_user_id,
        }
    }

    /// A user-written note.
    pub fn note(text: String, created_by_user_id: Option<Uuid>) -> Self {
        Self {
            asset_type: AssetType::Text,
            source_type: SourceType::Text,
            storage_path: None,
            text_content: Some(text),
            mime_type: None,
            created_by_user_id,
        }
    }
}

/// The durable parent record representing one user-authored memory.
///
/// Sessions are soft-deleted via the tombstone timestamp, never hard
/// deleted by this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySession {
    pub id: Uuid,
    pub title: String,
    pub created_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StorySession {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
