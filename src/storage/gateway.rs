use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// TTL for handing media to the transcription provider: long enough to
/// complete the remote call, short enough to bound exposure.
pub const TRANSCRIPTION_HANDOFF_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for in-app playback links.
pub const PLAYBACK_TTL: Duration = Duration::from_secs(60 * 60);

/// Addressable reference to a previously stored binary (not the binary
/// itself).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoragePath(pub String);

impl StoragePath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-limited URL granting short-lived read access to an otherwise
/// private binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporaryUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("failed to write object {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("no stored object at {0}")]
    UnknownObject(StoragePath),

    #[error("failed to sign access url: {0}")]
    Backend(String),
}

/// Durable binary storage boundary.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Durably store a binary under the caller-chosen key, returning its
    /// addressable reference. Overwriting an existing key is acceptable.
    ///
    /// Keys follow `<storySessionId>/<timestamp>.<extension>`, with the
    /// extension and declared MIME type matching the actual encoding.
    async fn store(
        &self,
        bytes: &[u8],
        key: &str,
        mime_type: &str,
    ) -> Result<StoragePath, StorageError>;

    /// Mint a short-lived URL for handing the binary to an external reader.
    async fn create_temporary_access_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<TemporaryUrl, SigningError>;
}
