use crate::capture::{CaptureBackendFactory, CaptureMode, DeviceManager, RecordingSession};
use crate::storage::FsStorageGateway;
use crate::story::StoryCapturePipeline;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Active recording sessions (capture_id → session).
    pub captures: Arc<RwLock<HashMap<Uuid, Arc<Mutex<RecordingSession>>>>>,

    pub pipeline: Arc<StoryCapturePipeline>,

    pub devices: Arc<DeviceManager>,

    /// Grant resolution for the `/media/{token}` route.
    pub media: Arc<FsStorageGateway>,

    pub backends: Arc<dyn CaptureBackendFactory>,

    /// Optional override of the audio container preference order, for
    /// deployments whose backend speaks a different set.
    pub audio_preferences: Option<Vec<String>>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<StoryCapturePipeline>,
        devices: Arc<DeviceManager>,
        media: Arc<FsStorageGateway>,
        backends: Arc<dyn CaptureBackendFactory>,
        audio_preferences: Option<Vec<String>>,
    ) -> Self {
        Self {
            captures: Arc::new(RwLock::new(HashMap::new())),
            pipeline,
            devices,
            media,
            backends,
            audio_preferences,
        }
    }

    pub(super) fn new_session(
        &self,
        mode: CaptureMode,
        device_id: Option<String>,
    ) -> RecordingSession {
        let session = RecordingSession::new(mode, device_id);
        match &self.audio_preferences {
            Some(preferences) => session.with_audio_preferences(preferences.clone()),
            None => session,
        }
    }
}
