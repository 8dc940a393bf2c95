use super::backend::{CaptureBackend, CaptureBackendFactory, CaptureMode, CaptureRequest, MediaChunk};
use super::CaptureError;
use async_trait::async_trait;
use hound::WavReader;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Streams a WAV file from disk as if it were a live input device.
///
/// Used for development and batch processing where no physical device is
/// available. The file is validated up front so a bad path reads as a
/// failed device acquisition, not a mid-recording error.
pub struct WavFileBackend {
    path: PathBuf,
    chunk_bytes: usize,
    feeder: Option<JoinHandle<()>>,
}

impl WavFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_bytes: 32 * 1024,
            feeder: None,
        }
    }
}

#[async_trait]
impl CaptureBackend for WavFileBackend {
    fn supports_mime(&self, mime_type: &str) -> bool {
        matches!(mime_type, "audio/wav" | "audio/x-wav")
    }

    async fn open(
        &mut self,
        _request: &CaptureRequest,
    ) -> Result<mpsc::Receiver<MediaChunk>, CaptureError> {
        let reader = WavReader::open(&self.path)
            .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
        let spec = reader.spec();
        let duration_secs = reader.duration() as f64 / spec.sample_rate as f64;
        drop(reader);

        info!(
            "streaming WAV capture from {}: {:.1}s, {} Hz, {} channels",
            self.path.display(),
            duration_secs,
            spec.sample_rate,
            spec.channels
        );

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
        let chunk_bytes = self.chunk_bytes;

        let (tx, rx) = mpsc::channel(16);
        self.feeder = Some(tokio::spawn(async move {
            for chunk in bytes.chunks(chunk_bytes) {
                if tx.send(chunk.to_vec()).await.is_err() {
                    break;
                }
            }
        }));

        Ok(rx)
    }

    async fn close(&mut self) -> Result<(), CaptureError> {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

/// Factory producing a fresh [`WavFileBackend`] per recording attempt.
pub struct WavCaptureFactory {
    source_path: PathBuf,
}

impl WavCaptureFactory {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
        }
    }
}

impl CaptureBackendFactory for WavCaptureFactory {
    fn create(&self, mode: CaptureMode) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        match mode {
            CaptureMode::Audio => Ok(Box::new(WavFileBackend::new(self.source_path.clone()))),
            CaptureMode::Video => Err(CaptureError::PermissionDenied(
                "video capture is not available on the file backend".to_string(),
            )),
        }
    }
}
