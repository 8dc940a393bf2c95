//! Story sessions and their asset graph.
//!
//! A story session is the durable parent record for one user-authored
//! memory; story assets are the pieces of content attached to it. This
//! module owns the application-layer invariants over that parent/child
//! structure and the save flows that feed it.

pub mod asset;
pub mod graph;
pub mod pipeline;
pub mod store;

pub use asset::{AssetType, NewStoryAsset, SourceType, StoryAsset, StorySession};
pub use graph::{AssetGraphError, StoryGraph};
pub use pipeline::{
    FailurePolicy, MediaUpload, NewStory, PipelineError, SavedStory, StoryCapturePipeline,
    TranscriptOutcome, UploadedAsset,
};
pub use store::{InMemoryStoryStore, StoryStore, StoryStoreError};
