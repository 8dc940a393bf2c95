// Integration tests for the transcription orchestrator: the strict
// sign-then-transcribe pipeline and its fail-closed behavior.

mod common;

use common::{MemoryStorage, ScriptedTranscriber};
use std::sync::Arc;
use story_capture::storage::{StorageGateway, StoragePath};
use story_capture::transcription::{TranscribeError, TranscriptionOrchestrator};

#[tokio::test]
async fn signing_failure_never_invokes_the_provider() {
    let storage = Arc::new(MemoryStorage::failing_sign());
    let transcriber = Arc::new(ScriptedTranscriber::answering("should never be used"));
    let orchestrator = TranscriptionOrchestrator::new(storage, transcriber.clone());

    let err = orchestrator
        .transcribe(&StoragePath("story/123.m4a".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::Signing(_)));
    assert_eq!(transcriber.call_count(), 0);
}

#[tokio::test]
async fn unknown_media_reference_fails_closed() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::answering("unused"));
    let orchestrator = TranscriptionOrchestrator::new(storage, transcriber.clone());

    let err = orchestrator
        .transcribe(&StoragePath("story/missing.m4a".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::Signing(_)));
    assert_eq!(transcriber.call_count(), 0);
}

#[tokio::test]
async fn provider_error_is_carried_verbatim() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .store(b"media-bytes", "story/123.m4a", "audio/mp4")
        .await
        .unwrap();
    let transcriber = Arc::new(ScriptedTranscriber::failing("timeout"));
    let orchestrator = TranscriptionOrchestrator::new(storage, transcriber.clone());

    let err = orchestrator
        .transcribe(&StoragePath("story/123.m4a".to_string()))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "timeout");
    assert_eq!(transcriber.call_count(), 1);
}

#[tokio::test]
async fn successful_transcription_returns_text_only() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .store(b"media-bytes", "story/123.m4a", "audio/mp4")
        .await
        .unwrap();
    let transcriber = Arc::new(ScriptedTranscriber::answering("it was a warm summer evening"));
    let orchestrator = TranscriptionOrchestrator::new(storage.clone(), transcriber.clone());

    let text = orchestrator
        .transcribe(&StoragePath("story/123.m4a".to_string()))
        .await
        .unwrap();

    assert_eq!(text, "it was a warm summer evening");
    assert_eq!(storage.sign_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(transcriber.call_count(), 1);
}

#[tokio::test]
async fn each_retry_is_caller_initiated_and_independent() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .store(b"media-bytes", "story/123.m4a", "audio/mp4")
        .await
        .unwrap();
    let transcriber = Arc::new(ScriptedTranscriber::scripted(vec![
        Err("provider hiccup".to_string()),
        Ok("second attempt".to_string()),
    ]));
    let orchestrator = TranscriptionOrchestrator::new(storage, transcriber.clone());
    let path = StoragePath("story/123.m4a".to_string());

    // No automatic retry: the first call fails and stops there.
    let err = orchestrator.transcribe(&path).await.unwrap_err();
    assert_eq!(err.to_string(), "provider hiccup");
    assert_eq!(transcriber.call_count(), 1);

    // A caller-initiated retry is a fresh exchange.
    let text = orchestrator.transcribe(&path).await.unwrap();
    assert_eq!(text, "second attempt");
    assert_eq!(transcriber.call_count(), 2);
}
