use super::state::AppState;
use crate::capture::{CaptureError, CaptureMode, DeviceKind, RecordingSession};
use crate::story::{
    FailurePolicy, MediaUpload, NewStory, StoryAsset, TranscriptOutcome,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCaptureRequest {
    pub mode: CaptureMode,

    /// Explicit input device, or None for the platform default.
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptureStatusResponse {
    pub capture_id: Uuid,
    pub status: &'static str,
    pub elapsed_seconds: u64,
    pub mime_type: Option<String>,
    /// Present once a take is finalized for review.
    pub blob_bytes: Option<usize>,
    pub blob_duration_seconds: Option<u64>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveStoryRequest {
    pub title: String,
    pub created_by_user_id: Option<Uuid>,
    /// Defaults to surfacing transcription failures: saving a recording is
    /// the record-and-transcribe screen's primary action.
    pub on_failure: Option<FailurePolicy>,
}

#[derive(Debug, Serialize)]
pub struct SaveStoryResponse {
    pub story_session_id: Uuid,
    pub media_asset_id: Uuid,
    pub transcript: TranscriptView,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub mime_type: String,
    /// File bytes, base64-encoded.
    pub data: String,
    pub created_by_user_id: Option<Uuid>,
    /// Defaults to suppressing transcription failures: uploads are a
    /// secondary path where transcription is best-effort.
    pub on_failure: Option<FailurePolicy>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub asset_id: Uuid,
    pub transcript: TranscriptView,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub text: String,
    pub created_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RetranscribeRequest {
    pub on_failure: Option<FailurePolicy>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptView {
    pub status: &'static str,
    pub text: Option<String>,
    pub error: Option<String>,
}

impl From<&TranscriptOutcome> for TranscriptView {
    fn from(outcome: &TranscriptOutcome) -> Self {
        match outcome {
            TranscriptOutcome::Attached(asset) => Self {
                status: "attached",
                text: asset.text_content.clone(),
                error: None,
            },
            TranscriptOutcome::Skipped => Self {
                status: "skipped",
                text: None,
                error: None,
            },
            TranscriptOutcome::Failed(reason) => Self {
                status: "failed",
                text: None,
                error: Some(reason.clone()),
            },
        }
    }
}

/// One primary asset plus its companion transcript, ready for rendering.
#[derive(Debug, Serialize)]
pub struct AssetView {
    pub id: Uuid,
    pub asset_type: crate::story::AssetType,
    pub source_type: crate::story::SourceType,
    pub storage_path: Option<String>,
    pub text_content: Option<String>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Companion transcript text for audio/video assets.
    pub transcript_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn capture_error_response(e: CaptureError) -> axum::response::Response {
    let status = match &e {
        CaptureError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CaptureError::EncodingUnsupported { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CaptureError::InvalidTransition { .. } => StatusCode::CONFLICT,
    };
    error_response(status, e.to_string())
}

async fn find_capture(
    state: &AppState,
    capture_id: Uuid,
) -> Option<Arc<Mutex<RecordingSession>>> {
    state.captures.read().await.get(&capture_id).cloned()
}

fn status_body(capture_id: Uuid, session: &RecordingSession) -> CaptureStatusResponse {
    CaptureStatusResponse {
        capture_id,
        status: session.state_name(),
        elapsed_seconds: session.elapsed_seconds(),
        mime_type: session.mime_type().map(str::to_string),
        blob_bytes: session.blob().map(|b| b.len()),
        blob_duration_seconds: session.blob().map(|b| b.duration_seconds),
        failure_reason: session.failure_reason().map(str::to_string),
    }
}

// ============================================================================
// Capture lifecycle
// ============================================================================

/// POST /captures/start
pub async fn start_capture(
    State(state): State<AppState>,
    Json(req): Json<StartCaptureRequest>,
) -> impl IntoResponse {
    let capture_id = Uuid::new_v4();
    info!("starting {:?} capture {capture_id}", req.mode);

    let backend = match state.backends.create(req.mode) {
        Ok(backend) => backend,
        Err(e) => return capture_error_response(e),
    };

    let mut session = state.new_session(req.mode, req.device_id);
    if let Err(e) = session.start(backend).await {
        error!("failed to start capture: {e}");
        return capture_error_response(e);
    }

    let body = status_body(capture_id, &session);
    state
        .captures
        .write()
        .await
        .insert(capture_id, Arc::new(Mutex::new(session)));

    (StatusCode::OK, Json(body)).into_response()
}

/// GET /captures/:capture_id/status
pub async fn capture_status(
    State(state): State<AppState>,
    Path(capture_id): Path<Uuid>,
) -> impl IntoResponse {
    match find_capture(&state, capture_id).await {
        Some(session) => {
            let session = session.lock().await;
            (StatusCode::OK, Json(status_body(capture_id, &session))).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("capture {capture_id} not found")),
    }
}

/// POST /captures/:capture_id/stop
pub async fn stop_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<Uuid>,
) -> impl IntoResponse {
    match find_capture(&state, capture_id).await {
        Some(session) => {
            let mut session = session.lock().await;
            match session.stop().await {
                Ok(()) => (StatusCode::OK, Json(status_body(capture_id, &session))).into_response(),
                Err(e) => capture_error_response(e),
            }
        }
        None => error_response(StatusCode::NOT_FOUND, format!("capture {capture_id} not found")),
    }
}

/// POST /captures/:capture_id/cancel
pub async fn cancel_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<Uuid>,
) -> impl IntoResponse {
    let session = {
        let mut captures = state.captures.write().await;
        captures.remove(&capture_id)
    };

    match session {
        Some(session) => {
            let mut session = session.lock().await;
            match session.cancel().await {
                Ok(()) => (StatusCode::OK, Json(status_body(capture_id, &session))).into_response(),
                Err(e) => capture_error_response(e),
            }
        }
        None => error_response(StatusCode::NOT_FOUND, format!("capture {capture_id} not found")),
    }
}

/// POST /captures/:capture_id/retake
pub async fn retake_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<Uuid>,
) -> impl IntoResponse {
    match find_capture(&state, capture_id).await {
        Some(session) => {
            let mut session = session.lock().await;
            match session.retake() {
                Ok(()) => (StatusCode::OK, Json(status_body(capture_id, &session))).into_response(),
                Err(e) => capture_error_response(e),
            }
        }
        None => error_response(StatusCode::NOT_FOUND, format!("capture {capture_id} not found")),
    }
}

/// POST /captures/:capture_id/save
///
/// The primary save path. A storage failure is fatal and surfaced; a
/// transcription failure is reported alongside the saved story, because the
/// committed media must never be lost to a failed enrichment step.
pub async fn save_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<Uuid>,
    Json(req): Json<SaveStoryRequest>,
) -> impl IntoResponse {
    let Some(session) = find_capture(&state, capture_id).await else {
        return error_response(StatusCode::NOT_FOUND, format!("capture {capture_id} not found"));
    };

    let mut session = session.lock().await;
    let blob = match session.take_blob() {
        Ok(blob) => blob,
        Err(e) => return capture_error_response(e),
    };

    let policy = req.on_failure.unwrap_or(FailurePolicy::Surface);
    let new_story = NewStory {
        title: req.title,
        created_by_user_id: req.created_by_user_id,
    };

    match state
        .pipeline
        .save_recorded_story(new_story, blob, policy)
        .await
    {
        Ok(saved) => {
            let _ = session.mark_saved();
            drop(session);
            state.captures.write().await.remove(&capture_id);

            (
                StatusCode::OK,
                Json(SaveStoryResponse {
                    story_session_id: saved.session.id,
                    media_asset_id: saved.media_asset.id,
                    transcript: TranscriptView::from(&saved.transcript),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("failed to save story: {e}");
            let _ = session.mark_failed(e.to_string());
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Story assets
// ============================================================================

/// POST /stories/:story_id/uploads
pub async fn upload_asset(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Json(req): Json<UploadRequest>,
) -> impl IntoResponse {
    let bytes = match BASE64.decode(&req.data) {
        Ok(bytes) => bytes,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("invalid upload payload: {e}")),
    };

    let policy = req.on_failure.unwrap_or(FailurePolicy::Suppress);
    let upload = MediaUpload {
        bytes,
        mime_type: req.mime_type,
        created_by_user_id: req.created_by_user_id,
    };

    match state
        .pipeline
        .attach_uploaded_media(story_id, upload, policy)
        .await
    {
        Ok(uploaded) => (
            StatusCode::OK,
            Json(UploadResponse {
                asset_id: uploaded.asset.id,
                transcript: TranscriptView::from(&uploaded.transcript),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("failed to attach upload: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /stories/:story_id/notes
pub async fn add_note(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> impl IntoResponse {
    match state
        .pipeline
        .attach_note(story_id, req.text, req.created_by_user_id)
        .await
    {
        Ok(asset) => (StatusCode::OK, Json(serde_json::json!({ "asset_id": asset.id }))).into_response(),
        Err(e) => {
            error!("failed to attach note: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /stories/:story_id/assets/:asset_id/transcribe
pub async fn retranscribe_asset(
    State(state): State<AppState>,
    Path((story_id, asset_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RetranscribeRequest>,
) -> impl IntoResponse {
    let policy = req.on_failure.unwrap_or(FailurePolicy::Surface);

    match state.pipeline.retranscribe(story_id, asset_id, policy).await {
        Ok(outcome) => (StatusCode::OK, Json(TranscriptView::from(&outcome))).into_response(),
        Err(e) => {
            error!("failed to retranscribe asset {asset_id}: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /stories/:story_id/assets
///
/// Assets in display order. Companion transcripts are folded into their
/// source media asset rather than appearing as standalone blocks.
pub async fn list_assets(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> impl IntoResponse {
    let graph = state.pipeline.graph();
    let assets = match graph.primary_assets(story_id).await {
        Ok(assets) => assets,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut views = Vec::with_capacity(assets.len());
    for asset in assets {
        let transcript_text = if asset.asset_type.is_transcribable_media() {
            match graph.companion_transcript(asset.id).await {
                Ok(companion) => companion.and_then(|t| t.text_content),
                Err(e) => {
                    error!("failed to resolve companion transcript: {e}");
                    None
                }
            }
        } else {
            None
        };
        views.push(asset_view(asset, transcript_text));
    }

    (StatusCode::OK, Json(views)).into_response()
}

/// DELETE /stories/:story_id
pub async fn delete_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.pipeline.delete_story(story_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn asset_view(asset: StoryAsset, transcript_text: Option<String>) -> AssetView {
    AssetView {
        id: asset.id,
        asset_type: asset.asset_type,
        source_type: asset.source_type,
        storage_path: asset.storage_path.map(|p| p.0),
        text_content: asset.text_content,
        mime_type: asset.mime_type,
        created_at: asset.created_at,
        transcript_text,
    }
}

// ============================================================================
// Devices and media
// ============================================================================

/// GET /devices/:kind
pub async fn list_devices(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> impl IntoResponse {
    let kind = match kind.as_str() {
        "audio" => DeviceKind::Audio,
        "video" => DeviceKind::Video,
        other => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("unknown device kind {other:?}"),
            )
        }
    };

    let devices = state.devices.list_input_devices(kind).await;
    (StatusCode::OK, Json(devices)).into_response()
}

/// GET /media/:token
///
/// Serves an unexpired temporary-access grant. Unknown and expired tokens
/// are indistinguishable to the caller.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match state.media.resolve_grant(&token).await {
        Some(grant) => match tokio::fs::read(&grant.file_path).await {
            Ok(bytes) => ([(header::CONTENT_TYPE, grant.mime_type)], bytes).into_response(),
            Err(e) => {
                error!("failed to read granted media: {e}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "media unavailable")
            }
        },
        None => error_response(StatusCode::NOT_FOUND, "unknown or expired media token"),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
