//! HTTP API for driving the capture pipeline.
//!
//! This module provides a REST API over the core flows:
//! - POST /captures/start - Start a recording session
//! - POST /captures/:id/stop - Finalize a take for review
//! - POST /captures/:id/cancel - Abandon an in-flight recording
//! - POST /captures/:id/retake - Discard a reviewed take
//! - POST /captures/:id/save - Persist the take as a new story
//! - GET /captures/:id/status - Query session state
//! - POST /stories/:id/uploads - Attach an uploaded file
//! - POST /stories/:id/notes - Attach a written note
//! - POST /stories/:id/assets/:asset_id/transcribe - Re-run transcription
//! - GET /stories/:id/assets - Assets in display order with companions
//! - DELETE /stories/:id - Tombstone a story
//! - GET /devices/:kind - Usable input devices
//! - GET /media/:token - Serve an unexpired temporary-access grant
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
