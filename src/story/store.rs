use super::asset::{StoryAsset, StorySession};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoryStoreError {
    #[error("story session {0} not found")]
    SessionNotFound(Uuid),

    #[error("story asset {0} not found")]
    AssetNotFound(Uuid),

    #[error("story store unavailable: {0}")]
    Unavailable(String),
}

/// Relational store boundary for story sessions and their assets.
///
/// The schema and the database itself belong to an external collaborator;
/// this trait is the surface the pipeline needs from it.
#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn create_session(
        &self,
        title: String,
        created_by_user_id: Option<Uuid>,
    ) -> Result<StorySession, StoryStoreError>;

    async fn get_session(&self, id: Uuid) -> Result<StorySession, StoryStoreError>;

    async fn insert_asset(&self, asset: StoryAsset) -> Result<StoryAsset, StoryStoreError>;

    async fn get_asset(&self, id: Uuid) -> Result<StoryAsset, StoryStoreError>;

    async fn delete_asset(&self, id: Uuid) -> Result<(), StoryStoreError>;

    /// Assets for one session, ordered by creation time. Insertion order is
    /// not semantically meaningful; display order derives from asset type
    /// and creation time.
    async fn assets_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<StoryAsset>, StoryStoreError>;

    /// Tombstone a session. The row and its assets remain.
    async fn soft_delete_session(&self, id: Uuid) -> Result<(), StoryStoreError>;
}

/// In-memory reference implementation, used in development wiring and
/// tests.
#[derive(Default)]
pub struct InMemoryStoryStore {
    sessions: RwLock<HashMap<Uuid, StorySession>>,
    assets: RwLock<HashMap<Uuid, StoryAsset>>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All sessions, tombstoned ones included.
    pub async fn list_sessions(&self) -> Vec<StorySession> {
        let mut sessions: Vec<StorySession> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        sessions
    }
}

#[async_trait]
impl StoryStore for InMemoryStoryStore {
    async fn create_session(
        &self,
        title: String,
        created_by_user_id: Option<Uuid>,
    ) -> Result<StorySession, StoryStoreError> {
        let session = StorySession {
            id: Uuid::new_v4(),
            title,
            created_by_user_id,
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<StorySession, StoryStoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoryStoreError::SessionNotFound(id))
    }

    async fn insert_asset(&self, asset: StoryAsset) -> Result<StoryAsset, StoryStoreError> {
        if !self.sessions.read().await.contains_key(&asset.story_session_id) {
            return Err(StoryStoreError::SessionNotFound(asset.story_session_id));
        }
        self.assets.write().await.insert(asset.id, asset.clone());
        Ok(asset)
    }

    async fn get_asset(&self, id: Uuid) -> Result<StoryAsset, StoryStoreError> {
        self.assets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoryStoreError::AssetNotFound(id))
    }

    async fn delete_asset(&self, id: Uuid) -> Result<(), StoryStoreError> {
        self.assets
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoryStoreError::AssetNotFound(id))
    }

    async fn assets_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<StoryAsset>, StoryStoreError> {
        let mut assets: Vec<StoryAsset> = self
            .assets
            .read()
            .await
            .values()
            .filter(|a| a.story_session_id == session_id)
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(assets)
    }

    async fn soft_delete_session(&self, id: Uuid) -> Result<(), StoryStoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or(StoryStoreError::SessionNotFound(id))?;
        if session.deleted_at.is_none() {
            session.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}
