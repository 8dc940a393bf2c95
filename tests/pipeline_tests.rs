// Integration tests for the save pipeline: call-site failure policies,
// ordering guarantees, and the committed-media-survives-enrichment rule.

mod common;

use common::{pipeline_with, MemoryStorage, ScriptedTranscriber};
use std::sync::Arc;
use story_capture::capture::MediaBlob;
use story_capture::story::{
    AssetType, FailurePolicy, MediaUpload, NewStory, PipelineError, SourceType, StoryStore,
    TranscriptOutcome,
};

fn audio_blob() -> MediaBlob {
    MediaBlob {
        bytes: b"recorded-audio".to_vec(),
        mime_type: "audio/mp4".to_string(),
        duration_seconds: 12,
    }
}

fn new_story(title: &str) -> NewStory {
    NewStory {
        title: title.to_string(),
        created_by_user_id: None,
    }
}

#[tokio::test]
async fn primary_save_attaches_media_and_transcript() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::answering("once upon a time"));
    let (store, pipeline) = pipeline_with(storage.clone(), transcriber.clone());

    let saved = pipeline
        .save_recorded_story(new_story("First story"), audio_blob(), FailurePolicy::Surface)
        .await
        .unwrap();

    assert_eq!(saved.media_asset.asset_type, AssetType::Audio);
    assert_eq!(saved.media_asset.source_type, SourceType::BrowserRecording);

    let transcript = saved.transcript.transcript().expect("transcript attached");
    assert_eq!(transcript.text_content.as_deref(), Some("once upon a time"));

    // Storage key is <storySessionId>/<timestamp>.<extension> with the
    // extension matching the captured encoding.
    let keys = storage.object_keys().await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with(&saved.session.id.to_string()));
    assert!(keys[0].ends_with(".m4a"));

    // The media row was committed before transcription ran.
    let assets = store.assets_for_session(saved.session.id).await.unwrap();
    assert_eq!(assets.len(), 2);
}

#[tokio::test]
async fn primary_save_survives_transcription_failure() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::failing("timeout"));
    let (store, pipeline) = pipeline_with(storage, transcriber.clone());

    let saved = pipeline
        .save_recorded_story(new_story("Resilient story"), audio_blob(), FailurePolicy::Surface)
        .await
        .unwrap();

    // The story and its audio asset are persisted and visible.
    let assets = store.assets_for_session(saved.session.id).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].asset_type, AssetType::Audio);

    // The user sees an error specific to transcription, not a save
    // failure.
    match &saved.transcript {
        TranscriptOutcome::Failed(reason) => assert_eq!(reason, "timeout"),
        other => panic!("expected surfaced transcription failure, got {other:?}"),
    }
}

#[tokio::test]
async fn secondary_upload_suppresses_transcription_failure() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::failing("provider unavailable"));
    let (store, pipeline) = pipeline_with(storage, transcriber.clone());

    let session = pipeline
        .graph()
        .create_session("Upload story".to_string(), None)
        .await
        .unwrap();

    let uploaded = pipeline
        .attach_uploaded_media(
            session.id,
            MediaUpload {
                bytes: b"uploaded-audio".to_vec(),
                mime_type: "audio/mpeg".to_string(),
                created_by_user_id: None,
            },
            FailurePolicy::Suppress,
        )
        .await
        .unwrap();

    // Overall success from the user's point of view; the failure was only
    // logged.
    assert!(matches!(uploaded.transcript, TranscriptOutcome::Skipped));
    assert_eq!(transcriber.call_count(), 1);

    let assets = store.assets_for_session(session.id).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].source_type, SourceType::FileUpload);
}

#[tokio::test]
async fn storage_failure_is_fatal_but_session_row_remains() {
    let storage = Arc::new(MemoryStorage::failing_store());
    let transcriber = Arc::new(ScriptedTranscriber::answering("unused"));
    let (store, pipeline) = pipeline_with(storage, transcriber.clone());

    let err = pipeline
        .save_recorded_story(new_story("Doomed save"), audio_blob(), FailurePolicy::Surface)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Storage(_)));
    assert_eq!(transcriber.call_count(), 0);

    // No automatic rollback: the session record stays so the user can
    // retry the failed step instead of redoing the capture.
    let sessions = store.list_sessions().await;
    assert_eq!(sessions.len(), 1);
    let assets = store.assets_for_session(sessions[0].id).await.unwrap();
    assert!(assets.is_empty());
}

#[tokio::test]
async fn photo_uploads_never_attempt_transcription() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::answering("unused"));
    let (_store, pipeline) = pipeline_with(storage, transcriber.clone());

    let session = pipeline
        .graph()
        .create_session("Photo story".to_string(), None)
        .await
        .unwrap();

    let uploaded = pipeline
        .attach_uploaded_media(
            session.id,
            MediaUpload {
                bytes: vec![0u8; 64],
                mime_type: "image/png".to_string(),
                created_by_user_id: None,
            },
            FailurePolicy::Suppress,
        )
        .await
        .unwrap();

    assert_eq!(uploaded.asset.asset_type, AssetType::Photo);
    assert!(matches!(uploaded.transcript, TranscriptOutcome::Skipped));
    assert_eq!(transcriber.call_count(), 0);
}

#[tokio::test]
async fn retranscribe_replaces_the_prior_transcript() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::scripted(vec![
        Ok("first draft".to_string()),
        Ok("cleaned up draft".to_string()),
    ]));
    let (store, pipeline) = pipeline_with(storage, transcriber.clone());

    let saved = pipeline
        .save_recorded_story(new_story("Evolving story"), audio_blob(), FailurePolicy::Surface)
        .await
        .unwrap();

    let outcome = pipeline
        .retranscribe(saved.session.id, saved.media_asset.id, FailurePolicy::Surface)
        .await
        .unwrap();
    let transcript = outcome.transcript().expect("replacement attached");
    assert_eq!(transcript.text_content.as_deref(), Some("cleaned up draft"));

    // One media asset, one transcript; retries do not accumulate
    // duplicates.
    let assets = store.assets_for_session(saved.session.id).await.unwrap();
    assert_eq!(assets.len(), 2);

    let companion = pipeline
        .graph()
        .companion_transcript(saved.media_asset.id)
        .await
        .unwrap()
        .expect("companion resolves");
    assert_eq!(companion.text_content.as_deref(), Some("cleaned up draft"));
}

#[tokio::test]
async fn retranscribe_surfaces_failure_without_touching_the_prior_transcript() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::scripted(vec![
        Ok("original transcript".to_string()),
        Err("quota exceeded".to_string()),
    ]));
    let (_store, pipeline) = pipeline_with(storage, transcriber);

    let saved = pipeline
        .save_recorded_story(new_story("Quota story"), audio_blob(), FailurePolicy::Surface)
        .await
        .unwrap();

    let outcome = pipeline
        .retranscribe(saved.session.id, saved.media_asset.id, FailurePolicy::Surface)
        .await
        .unwrap();
    match outcome {
        TranscriptOutcome::Failed(reason) => assert_eq!(reason, "quota exceeded"),
        other => panic!("expected surfaced failure, got {other:?}"),
    }

    // The failed retry never got as far as replacing the old transcript.
    let companion = pipeline
        .graph()
        .companion_transcript(saved.media_asset.id)
        .await
        .unwrap()
        .expect("original transcript intact");
    assert_eq!(
        companion.text_content.as_deref(),
        Some("original transcript")
    );
}

#[tokio::test]
async fn note_attachment_is_plain_text() {
    let storage = Arc::new(MemoryStorage::new());
    let transcriber = Arc::new(ScriptedTranscriber::answering("unused"));
    let (_store, pipeline) = pipeline_with(storage, transcriber.clone());

    let session = pipeline
        .graph()
        .create_session("Note story".to_string(), None)
        .await
        .unwrap();

    let note = pipeline
        .attach_note(session.id, "A reflection on the day".to_string(), None)
        .await
        .unwrap();

    assert_eq!(note.asset_type, AssetType::Text);
    assert_eq!(note.source_type, SourceType::Text);
    assert_eq!(transcriber.call_count(), 0);
}
