use super::CaptureError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// What a recording session captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Audio,
    Video,
}

/// One encoded fragment delivered by a capture backend. Fragments are
/// ordered; their concatenation is a well-formed media stream of the
/// negotiated MIME type.
pub type MediaChunk = Vec<u8>;

/// Parameters for opening a capture.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub mode: CaptureMode,
    /// Explicit device, or `None` for the platform's implicit default.
    pub device_id: Option<String>,
    /// Negotiated container type; the backend reported it as supported.
    pub mime_type: String,
}

/// Capture backend boundary.
///
/// Opening a capture acquires an exclusive lock on the underlying device;
/// closing releases it. The underlying device can only be held by one
/// active session at a time, so a backend must release before it can be
/// acquired elsewhere.
#[async_trait]
pub trait CaptureBackend: Send {
    /// Whether the backend can encode the given MIME type.
    fn supports_mime(&self, mime_type: &str) -> bool;

    /// Default container for video capture on this platform.
    fn default_video_mime(&self) -> &str {
        "video/webm"
    }

    /// Acquire the device and start delivering chunks.
    ///
    /// Returns a channel receiver for encoded fragments. Acquisition
    /// failure (permission denied, device busy) leaves no lock held.
    async fn open(
        &mut self,
        request: &CaptureRequest,
    ) -> Result<mpsc::Receiver<MediaChunk>, CaptureError>;

    /// Release the device. Must be safe to call after a failed `open`.
    async fn close(&mut self) -> Result<(), CaptureError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Creates a fresh backend for each recording attempt.
///
/// A backend instance is single-use: the recording session moves it into
/// its drain task, which releases the device on every exit path.
pub trait CaptureBackendFactory: Send + Sync {
    fn create(&self, mode: CaptureMode) -> Result<Box<dyn CaptureBackend>, CaptureError>;
}
