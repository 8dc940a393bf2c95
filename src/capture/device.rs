use super::CaptureError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Kind of input device to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Audio,
    Video,
}

/// Normalized metadata for one input device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    /// Human-readable label as reported by the platform.
    pub label: String,
}

/// Platform device enumeration boundary.
///
/// Implementations wrap whatever the host platform exposes (Core Audio,
/// PipeWire, a remote agent). The manager owns filtering and ranking so
/// every enumerator benefits from the same policy.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    async fn enumerate(&self, kind: DeviceKind) -> Result<Vec<DeviceDescriptor>, CaptureError>;
}

/// Label fragments identifying audio-routing artifacts that produce silent
/// or looped captures, not real microphones.
const EXCLUDED_LABEL_PATTERNS: &[&str] = &["virtual", "teams", "stereo mix"];

/// Enumerates, filters, and ranks capture devices.
pub struct DeviceManager {
    enumerator: Arc<dyn DeviceEnumerator>,
}

impl DeviceManager {
    pub fn new(enumerator: Arc<dyn DeviceEnumerator>) -> Self {
        Self { enumerator }
    }

    /// List usable input devices, most-likely-to-work first.
    ///
    /// Enumeration failure (e.g. permission not yet granted) yields an empty
    /// list; capture then falls back to the platform's implicit default
    /// device rather than failing outright.
    pub async fn list_input_devices(&self, kind: DeviceKind) -> Vec<DeviceDescriptor> {
        match self.enumerator.enumerate(kind).await {
            Ok(devices) => {
                let ranked = filter_and_rank(devices);
                debug!("found {} usable {:?} input devices", ranked.len(), kind);
                ranked
            }
            Err(e) => {
                warn!("device enumeration failed, falling back to implicit default: {e}");
                Vec::new()
            }
        }
    }
}

/// Drop virtual/loopback devices, then sort by label rank. The sort is
/// stable, so devices keep their enumeration order within a rank.
pub(crate) fn filter_and_rank(devices: Vec<DeviceDescriptor>) -> Vec<DeviceDescriptor> {
    let mut usable: Vec<DeviceDescriptor> = devices
        .into_iter()
        .filter(|d| !is_excluded_label(&d.label))
        .collect();
    usable.sort_by_key(|d| label_rank(&d.label));
    usable
}

fn is_excluded_label(label: &str) -> bool {
    let label = label.to_lowercase();
    EXCLUDED_LABEL_PATTERNS.iter().any(|p| label.contains(p))
}

/// "default" devices first, then "built-in", then the rest. Biases toward
/// devices most likely to work without additional configuration.
fn label_rank(label: &str) -> u8 {
    let label = label.to_lowercase();
    if label.contains("default") {
        0
    } else if label.contains("built-in") {
        1
    } else {
        2
    }
}

/// Fixed-list enumerator for embedders that already know their devices, and
/// for tests.
pub struct StaticDeviceEnumerator {
    audio: Vec<DeviceDescriptor>,
    video: Vec<DeviceDescriptor>,
}

impl StaticDeviceEnumerator {
    pub fn new(audio: Vec<DeviceDescriptor>, video: Vec<DeviceDescriptor>) -> Self {
        Self { audio, video }
    }
}

#[async_trait]
impl DeviceEnumerator for StaticDeviceEnumerator {
    async fn enumerate(&self, kind: DeviceKind) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        Ok(match kind {
            DeviceKind::Audio => self.audio.clone(),
            DeviceKind::Video => self.video.clone(),
        })
    }
}
