pub mod capture;
pub mod config;
pub mod http;
pub mod storage;
pub mod story;
pub mod transcription;

pub use capture::{
    CaptureBackend, CaptureBackendFactory, CaptureError, CaptureMode, DeviceDescriptor,
    DeviceEnumerator, DeviceKind, DeviceManager, MediaBlob, RecordingSession,
    StaticDeviceEnumerator, WavCaptureFactory,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use storage::{FsStorageGateway, SigningError, StorageError, StorageGateway, StoragePath, TemporaryUrl};
pub use story::{
    AssetGraphError, AssetType, FailurePolicy, InMemoryStoryStore, NewStory, SourceType,
    StoryAsset, StoryCapturePipeline, StoryGraph, StorySession, StoryStore, TranscriptOutcome,
};
pub use transcription::{
    HttpTranscriptionGateway, TranscribeError, TranscriptionError, TranscriptionGateway,
    TranscriptionOrchestrator,
};
