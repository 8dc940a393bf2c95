//! Story capture: device selection, recording lifecycle, media finalization.
//!
//! This module provides the capture side of the pipeline:
//! - Input device enumeration, filtering, and ranking
//! - The `RecordingSession` state machine (record / review / save)
//! - MIME negotiation against the capture backend
//! - The finished `MediaBlob` handed to the save flow

pub mod backend;
pub mod device;
pub mod file;
pub mod media;
pub mod mime;
pub mod session;

use thiserror::Error;

pub use backend::{CaptureBackend, CaptureBackendFactory, CaptureMode, CaptureRequest, MediaChunk};
pub use device::{DeviceDescriptor, DeviceEnumerator, DeviceKind, DeviceManager, StaticDeviceEnumerator};
pub use file::{WavCaptureFactory, WavFileBackend};
pub use media::{probe_media, MediaBlob, MediaInfo};
pub use mime::{extension_for_mime, select_mime_type, AUDIO_MIME_PREFERENCES};
pub use session::RecordingSession;

/// Errors raised while acquiring devices or driving a recording session.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Device access denied or unavailable. Fatal to this attempt, but
    /// recoverable: the user may retry after fixing permissions.
    #[error("capture device unavailable: {0}")]
    PermissionDenied(String),

    /// No acceptable MIME type among the preference list. Failing fast here
    /// beats silently recording in an unplayable format.
    #[error("no supported capture encoding among {candidates:?}")]
    EncodingUnsupported { candidates: Vec<String> },

    /// A lifecycle method was called in a state that does not permit it.
    #[error("invalid capture transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
