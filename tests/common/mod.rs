// Shared fakes for integration tests. Each gateway boundary gets a
// scripted in-memory stand-in so tests can observe call counts and inject
// failures deterministically.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use story_capture::capture::{CaptureBackend, CaptureError, CaptureRequest, MediaChunk};
use story_capture::storage::{
    SigningError, StorageError, StorageGateway, StoragePath, TemporaryUrl,
};
use story_capture::story::{InMemoryStoryStore, StoryCapturePipeline};
use story_capture::transcription::{TranscriptionError, TranscriptionGateway};
use tokio::sync::{mpsc, Mutex};

/// Capture backend that delivers a scripted chunk sequence and counts
/// device releases.
pub struct ScriptedCaptureBackend {
    supported: Vec<String>,
    chunks: Vec<MediaChunk>,
    fail_open: Option<String>,
    /// Keep the chunk channel open until closed, for teardown tests.
    hold_open: bool,
    held_tx: Option<mpsc::Sender<MediaChunk>>,
    close_count: Arc<AtomicUsize>,
}

impl ScriptedCaptureBackend {
    pub fn new(supported: &[&str], chunks: Vec<MediaChunk>) -> (Self, Arc<AtomicUsize>) {
        let close_count = Arc::new(AtomicUsize::new(0));
        (
            Self {
                supported: supported.iter().map(|s| s.to_string()).collect(),
                chunks,
                fail_open: None,
                hold_open: false,
                held_tx: None,
                close_count: Arc::clone(&close_count),
            },
            close_count,
        )
    }

    /// Backend whose chunk stream never ends on its own.
    pub fn held_open(supported: &[&str], chunks: Vec<MediaChunk>) -> (Self, Arc<AtomicUsize>) {
        let (mut backend, close_count) = Self::new(supported, chunks);
        backend.hold_open = true;
        (backend, close_count)
    }

    /// Backend whose device acquisition fails.
    pub fn denied(message: &str) -> Self {
        let (mut backend, _) = Self::new(&["audio/mp4"], Vec::new());
        backend.fail_open = Some(message.to_string());
        backend
    }
}

#[async_trait]
impl CaptureBackend for ScriptedCaptureBackend {
    fn supports_mime(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|s| s == mime_type)
    }

    async fn open(
        &mut self,
        _request: &CaptureRequest,
    ) -> Result<mpsc::Receiver<MediaChunk>, CaptureError> {
        if let Some(message) = &self.fail_open {
            return Err(CaptureError::PermissionDenied(message.clone()));
        }

        let (tx, rx) = mpsc::channel(self.chunks.len().max(1));
        for chunk in self.chunks.drain(..) {
            tx.send(chunk).await.expect("scripted channel has capacity");
        }
        if self.hold_open {
            self.held_tx = Some(tx);
        }
        Ok(rx)
    }

    async fn close(&mut self) -> Result<(), CaptureError> {
        self.held_tx = None;
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// In-memory storage gateway with injectable failures and a signing call
/// counter.
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_store: bool,
    pub fail_sign: bool,
    pub sign_calls: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_store() -> Self {
        Self {
            fail_store: true,
            ..Self::default()
        }
    }

    pub fn failing_sign() -> Self {
        Self {
            fail_sign: true,
            ..Self::default()
        }
    }

    pub async fn object_keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl StorageGateway for MemoryStorage {
    async fn store(
        &self,
        bytes: &[u8],
        key: &str,
        _mime_type: &str,
    ) -> Result<StoragePath, StorageError> {
        if self.fail_store {
            return Err(StorageError::Unavailable("storage offline".to_string()));
        }
        self.objects
            .lock()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(StoragePath(key.to_string()))
    }

    async fn create_temporary_access_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<TemporaryUrl, SigningError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign {
            return Err(SigningError::Backend("signer offline".to_string()));
        }
        if !self.objects.lock().await.contains_key(path.as_str()) {
            return Err(SigningError::UnknownObject(path.clone()));
        }
        let ttl = chrono::Duration::from_std(ttl).expect("test ttl fits");
        Ok(TemporaryUrl {
            url: format!("https://media.test/{path}"),
            expires_at: Utc::now() + ttl,
        })
    }
}

/// Transcription gateway that answers from a script and counts calls.
pub struct ScriptedTranscriber {
    responses: Mutex<VecDeque<Result<String, String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub fn answering(text: &str) -> Self {
        Self::scripted(vec![Ok(text.to_string())])
    }

    pub fn failing(message: &str) -> Self {
        Self::scripted(vec![Err(message.to_string())])
    }

    pub fn scripted(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionGateway for ScriptedTranscriber {
    async fn transcribe(&self, _audio_url: &str) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .await
            .pop_front()
            .expect("transcriber script exhausted");
        response.map_err(TranscriptionError::Provider)
    }
}

/// Pipeline wired to an in-memory store and the given gateway fakes.
pub fn pipeline_with(
    storage: Arc<MemoryStorage>,
    transcriber: Arc<ScriptedTranscriber>,
) -> (Arc<InMemoryStoryStore>, StoryCapturePipeline) {
    let store = Arc::new(InMemoryStoryStore::new());
    let pipeline = StoryCapturePipeline::new(store.clone(), storage, transcriber);
    (store, pipeline)
}
