use super::backend::{CaptureBackend, CaptureMode, CaptureRequest, MediaChunk};
use super::media::MediaBlob;
use super::mime::{select_mime_type, AUDIO_MIME_PREFERENCES};
use super::CaptureError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const STATE_IDLE: &str = "Idle";
const STATE_RECORDING: &str = "Recording";
const STATE_REVIEWING: &str = "Reviewing";
const STATE_SAVING: &str = "Saving";
const STATE_FAILED: &str = "Failed";

/// A recording session owning the record / review / save lifecycle for a
/// single take.
///
/// The state machine is explicit: `Idle → Recording → Reviewing → Saving →
/// (Idle | Failed)`, with `cancel()` (Recording → Idle) and `retake()`
/// (Reviewing → Idle) discarding the take. Illegal transitions are reported
/// as [`CaptureError::InvalidTransition`], never silently ignored.
///
/// The device lock is scoped to the `Recording` state. The backend is moved
/// into the chunk drain task, which releases the device on every exit path:
/// explicit stop, upstream channel closure, or session teardown.
pub struct RecordingSession {
    mode: CaptureMode,
    device_id: Option<String>,
    audio_preferences: Vec<String>,
    state: SessionState,
}

enum SessionState {
    Idle,
    Recording(ActiveCapture),
    Reviewing { blob: MediaBlob },
    Saving,
    Failed { reason: String },
}

/// Ephemeral capture state, destroyed when the take is finalized or
/// abandoned.
struct ActiveCapture {
    mime_type: String,
    chunks: Arc<Mutex<Vec<MediaChunk>>>,
    elapsed_seconds: Arc<AtomicU64>,
    stop_tx: watch::Sender<bool>,
    drain: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

impl RecordingSession {
    pub fn new(mode: CaptureMode, device_id: Option<String>) -> Self {
        Self {
            mode,
            device_id,
            audio_preferences: AUDIO_MIME_PREFERENCES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            state: SessionState::Idle,
        }
    }

    /// Override the audio container preference order. Selection remains
    /// order-preserving first-match over whatever list is supplied.
    pub fn with_audio_preferences(mut self, preferences: Vec<String>) -> Self {
        self.audio_preferences = preferences;
        self
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn state_name(&self) -> &'static str {
        state_name(&self.state)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording(_))
    }

    /// Wall-clock seconds since recording started, driven by the 1 s tick.
    pub fn elapsed_seconds(&self) -> u64 {
        match &self.state {
            SessionState::Recording(active) => active.elapsed_seconds.load(Ordering::SeqCst),
            _ => 0,
        }
    }

    /// Negotiated container type, available while recording.
    pub fn mime_type(&self) -> Option<&str> {
        match &self.state {
            SessionState::Recording(active) => Some(&active.mime_type),
            SessionState::Reviewing { blob } => Some(&blob.mime_type),
            _ => None,
        }
    }

    /// The finished take, available while reviewing.
    pub fn blob(&self) -> Option<&MediaBlob> {
        match &self.state {
            SessionState::Reviewing { blob } => Some(blob),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Acquire the device and start recording.
    ///
    /// MIME negotiation happens first and fails fast; a backend that cannot
    /// encode any acceptable container never acquires the device. An
    /// acquisition failure leaves the session `Idle` so the user can retry
    /// after adjusting permissions.
    pub async fn start(&mut self, mut backend: Box<dyn CaptureBackend>) -> Result<(), CaptureError> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(self.invalid_transition(STATE_RECORDING));
        }

        let mime_type = self.negotiate_mime(backend.as_ref())?;

        let request = CaptureRequest {
            mode: self.mode,
            device_id: self.device_id.clone(),
            mime_type: mime_type.clone(),
        };
        let chunk_rx = backend.open(&request).await?;

        let chunks: Arc<Mutex<Vec<MediaChunk>>> = Arc::new(Mutex::new(Vec::new()));
        let elapsed_seconds = Arc::new(AtomicU64::new(0));
        let (stop_tx, stop_rx) = watch::channel(false);

        let drain = tokio::spawn(drain_capture(
            backend,
            chunk_rx,
            Arc::clone(&chunks),
            stop_rx,
        ));

        let tick_counter = Arc::clone(&elapsed_seconds);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; skip it so the counter
            // increments once per elapsed second.
            interval.tick().await;
            loop {
                interval.tick().await;
                tick_counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        info!("recording started ({mime_type})");
        self.state = SessionState::Recording(ActiveCapture {
            mime_type,
            chunks,
            elapsed_seconds,
            stop_tx,
            drain,
            ticker,
        });
        Ok(())
    }

    /// Stop recording and finalize the take for review.
    ///
    /// The elapsed ticker is canceled deterministically and the device is
    /// released exactly once; repeated `stop()` calls are no-ops. A stop in
    /// the same tick as `start()` yields a valid, empty blob.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        let previous = std::mem::replace(&mut self.state, SessionState::Idle);
        let active = match previous {
            SessionState::Recording(active) => active,
            SessionState::Reviewing { blob } => {
                // Already finalized; the device was released on the first
                // stop.
                self.state = SessionState::Reviewing { blob };
                return Ok(());
            }
            other => {
                let err = invalid_transition_from(&other, STATE_REVIEWING);
                self.state = other;
                return Err(err);
            }
        };

        let blob = finalize_capture(active).await;
        info!(
            "recording finished: {} bytes, {}s ({})",
            blob.len(),
            blob.duration_seconds,
            blob.mime_type
        );
        self.state = SessionState::Reviewing { blob };
        Ok(())
    }

    /// Abandon an in-flight recording without producing output.
    pub async fn cancel(&mut self) -> Result<(), CaptureError> {
        let previous = std::mem::replace(&mut self.state, SessionState::Idle);
        let active = match previous {
            SessionState::Recording(active) => active,
            other => {
                let err = invalid_transition_from(&other, STATE_IDLE);
                self.state = other;
                return Err(err);
            }
        };

        let _ = finalize_capture(active).await;
        info!("recording canceled; no output produced");
        Ok(())
    }

    /// Discard the reviewed take and return to idle for another attempt.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        match self.state {
            SessionState::Reviewing { .. } => {
                self.state = SessionState::Idle;
                Ok(())
            }
            _ => Err(self.invalid_transition(STATE_IDLE)),
        }
    }

    /// Transfer the finished blob to the save flow. The session enters
    /// `Saving` until the caller reports the outcome.
    pub fn take_blob(&mut self) -> Result<MediaBlob, CaptureError> {
        let previous = std::mem::replace(&mut self.state, SessionState::Saving);
        match previous {
            SessionState::Reviewing { blob } => Ok(blob),
            other => {
                let err = invalid_transition_from(&other, STATE_SAVING);
                self.state = other;
                Err(err)
            }
        }
    }

    pub fn mark_saved(&mut self) -> Result<(), CaptureError> {
        match self.state {
            SessionState::Saving => {
                self.state = SessionState::Idle;
                Ok(())
            }
            _ => Err(self.invalid_transition(STATE_IDLE)),
        }
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), CaptureError> {
        match self.state {
            SessionState::Saving => {
                self.state = SessionState::Failed {
                    reason: reason.into(),
                };
                Ok(())
            }
            _ => Err(self.invalid_transition(STATE_FAILED)),
        }
    }

    /// Clear a failed save so the user can retry.
    pub fn reset(&mut self) -> Result<(), CaptureError> {
        match self.state {
            SessionState::Failed { .. } => {
                self.state = SessionState::Idle;
                Ok(())
            }
            _ => Err(self.invalid_transition(STATE_IDLE)),
        }
    }

    fn negotiate_mime(&self, backend: &dyn CaptureBackend) -> Result<String, CaptureError> {
        let candidates: Vec<&str> = match self.mode {
            CaptureMode::Audio => self.audio_preferences.iter().map(String::as_str).collect(),
            CaptureMode::Video => vec![backend.default_video_mime()],
        };

        select_mime_type(&candidates, |m| backend.supports_mime(m))
            .map(str::to_string)
            .ok_or_else(|| CaptureError::EncodingUnsupported {
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            })
    }

    fn invalid_transition(&self, to: &'static str) -> CaptureError {
        invalid_transition_from(&self.state, to)
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let SessionState::Recording(active) = &self.state {
            // Torn down mid-recording. The drain task still owns the
            // backend and releases the device once signaled; a dangling
            // open device would be a resource leak and a privacy concern.
            active.ticker.abort();
            let _ = active.stop_tx.send(true);
            warn!("recording session dropped while recording; device release signaled");
        }
    }
}

/// Accumulates chunks until stopped or the source closes, then releases the
/// device. Owning the backend here guarantees release on every exit path.
async fn drain_capture(
    mut backend: Box<dyn CaptureBackend>,
    mut chunk_rx: mpsc::Receiver<MediaChunk>,
    chunks: Arc<Mutex<Vec<MediaChunk>>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            chunk = chunk_rx.recv() => match chunk {
                Some(chunk) => chunks.lock().await.push(chunk),
                None => break,
            },
        }
    }

    // Collect fragments already queued when the stop arrived.
    while let Ok(chunk) = chunk_rx.try_recv() {
        chunks.lock().await.push(chunk);
    }

    if let Err(e) = backend.close().await {
        warn!("failed to release capture device: {e}");
    }
}

/// Tear down an active capture and concatenate its fragments.
async fn finalize_capture(active: ActiveCapture) -> MediaBlob {
    active.ticker.abort();
    let _ = active.stop_tx.send(true);
    if let Err(e) = active.drain.await {
        warn!("capture drain task failed: {e}");
    }

    let fragments = {
        let mut guard = active.chunks.lock().await;
        std::mem::take(&mut *guard)
    };
    let mut bytes = Vec::with_capacity(fragments.iter().map(Vec::len).sum());
    for fragment in &fragments {
        bytes.extend_from_slice(fragment);
    }

    MediaBlob {
        bytes,
        mime_type: active.mime_type,
        duration_seconds: active.elapsed_seconds.load(Ordering::SeqCst),
    }
}

fn state_name(state: &SessionState) -> &'static str {
    match state {
        SessionState::Idle => STATE_IDLE,
        SessionState::Recording(_) => STATE_RECORDING,
        SessionState::Reviewing { .. } => STATE_REVIEWING,
        SessionState::Saving => STATE_SAVING,
        SessionState::Failed { .. } => STATE_FAILED,
    }
}

fn invalid_transition_from(state: &SessionState, to: &'static str) -> CaptureError {
    CaptureError::InvalidTransition {
        from: state_name(state),
        to,
    }
}
