//! Best-effort transcription of persisted media.
//!
//! Transcription is enrichment, not the primary deliverable: the recorded
//! media is. The orchestrator drives the strict sign-then-transcribe
//! pipeline and hands the text back; attaching it to a story is the call
//! site's job, because call sites differ in failure policy.

pub mod gateway;
pub mod orchestrator;

pub use gateway::{HttpTranscriptionGateway, TranscriptionError, TranscriptionGateway};
pub use orchestrator::{TranscribeError, TranscriptionOrchestrator};
