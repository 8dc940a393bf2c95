use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use story_capture::capture::{DeviceManager, StaticDeviceEnumerator, WavCaptureFactory};
use story_capture::transcription::HttpTranscriptionGateway;
use story_capture::{AppState, Config, FsStorageGateway, InMemoryStoryStore, StoryCapturePipeline};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "story-capture", about = "Story capture & transcription service")]
struct Args {
    /// Path to the configuration file (extension inferred)
    #[arg(long, default_value = "config/story-capture")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);

    let storage = Arc::new(FsStorageGateway::new(
        &cfg.storage.root_path,
        cfg.storage.public_base_url.clone(),
    )?);
    let transcriber = Arc::new(HttpTranscriptionGateway::from_config(&cfg.transcription));
    let store = Arc::new(InMemoryStoryStore::new());
    let pipeline = Arc::new(StoryCapturePipeline::new(
        store,
        storage.clone(),
        transcriber,
    ));

    // Platform device enumeration belongs to the embedder; the service
    // binary starts with none registered and capture falls back to the
    // implicit default device.
    let devices = Arc::new(DeviceManager::new(Arc::new(StaticDeviceEnumerator::new(
        Vec::new(),
        Vec::new(),
    ))));
    let backends = Arc::new(WavCaptureFactory::new(&cfg.capture.source_path));

    let state = AppState::new(
        pipeline,
        devices,
        storage,
        backends,
        cfg.capture.audio_mime_preferences.clone(),
    );
    let router = story_capture::create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}
