use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Capture lifecycle
        .route("/captures/start", post(handlers::start_capture))
        .route("/captures/:capture_id/status", get(handlers::capture_status))
        .route("/captures/:capture_id/stop", post(handlers::stop_capture))
        .route("/captures/:capture_id/cancel", post(handlers::cancel_capture))
        .route("/captures/:capture_id/retake", post(handlers::retake_capture))
        .route("/captures/:capture_id/save", post(handlers::save_capture))
        // Story assets
        .route("/stories/:story_id/uploads", post(handlers::upload_asset))
        .route("/stories/:story_id/notes", post(handlers::add_note))
        .route(
            "/stories/:story_id/assets/:asset_id/transcribe",
            post(handlers::retranscribe_asset),
        )
        .route("/stories/:story_id/assets", get(handlers::list_assets))
        .route("/stories/:story_id", delete(handlers::delete_story))
        // Devices and media grants
        .route("/devices/:kind", get(handlers::list_devices))
        .route("/media/:token", get(handlers::serve_media))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
