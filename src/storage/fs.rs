use super::gateway::{SigningError, StorageError, StorageGateway, StoragePath, TemporaryUrl};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Filesystem-backed storage gateway for development and self-hosted
/// deployments.
///
/// Binaries live under a root directory. Temporary access is granted
/// through single-purpose uuid tokens kept in memory; the HTTP layer serves
/// unexpired grants at `/media/{token}`.
pub struct FsStorageGateway {
    root: PathBuf,
    public_base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
    grants: RwLock<HashMap<String, MediaGrant>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    file_path: PathBuf,
    mime_type: String,
}

/// One unexpired temporary-access grant.
#[derive(Debug, Clone)]
pub struct MediaGrant {
    pub file_path: PathBuf,
    pub mime_type: String,
    pub expires_at: DateTime<Utc>,
}

impl FsStorageGateway {
    pub fn new(root: impl Into<PathBuf>, public_base_url: String) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::Write {
            key: root.display().to_string(),
            source: e,
        })?;

        info!("media storage rooted at {}", root.display());

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
            grants: RwLock::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a grant token, dropping it if expired. Consumed by the
    /// `/media/{token}` route.
    pub async fn resolve_grant(&self, token: &str) -> Option<MediaGrant> {
        let mut grants = self.grants.write().await;
        match grants.get(token) {
            Some(grant) if grant.expires_at > Utc::now() => Some(grant.clone()),
            Some(_) => {
                grants.remove(token);
                None
            }
            None => None,
        }
    }

    fn validate_key(key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let sane = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !sane {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(relative.to_path_buf())
    }
}

#[async_trait]
impl StorageGateway for FsStorageGateway {
    async fn store(
        &self,
        bytes: &[u8],
        key: &str,
        mime_type: &str,
    ) -> Result<StoragePath, StorageError> {
        let relative = Self::validate_key(key)?;
        let file_path = self.root.join(&relative);

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Write {
                    key: key.to_string(),
                    source: e,
                })?;
        }
        tokio::fs::write(&file_path, bytes)
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                source: e,
            })?;

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                file_path,
                mime_type: mime_type.to_string(),
            },
        );

        info!("stored {} bytes at {key} ({mime_type})", bytes.len());
        Ok(StoragePath(key.to_string()))
    }

    async fn create_temporary_access_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<TemporaryUrl, SigningError> {
        let object = {
            let objects = self.objects.read().await;
            objects
                .get(path.as_str())
                .cloned()
                .ok_or_else(|| SigningError::UnknownObject(path.clone()))?
        };

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| SigningError::Backend(e.to_string()))?;
        let expires_at = Utc::now() + ttl;
        let token = Uuid::new_v4().simple().to_string();

        {
            let mut grants = self.grants.write().await;
            let now = Utc::now();
            grants.retain(|_, grant| grant.expires_at > now);
            grants.insert(
                token.clone(),
                MediaGrant {
                    file_path: object.file_path,
                    mime_type: object.mime_type,
                    expires_at,
                },
            );
        }

        debug!("minted access grant for {path} (expires {expires_at})");
        Ok(TemporaryUrl {
            url: format!("{}/media/{token}", self.public_base_url),
            expires_at,
        })
    }
}
