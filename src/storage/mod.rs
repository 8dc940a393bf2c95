//! Asset persistence boundary.
//!
//! The pipeline only needs two things from the storage tier: durably store
//! a binary under a caller-chosen key, and mint a short-lived access URL so
//! a private binary can be handed to an external reader without becoming
//! permanently public.

pub mod fs;
pub mod gateway;

pub use fs::{FsStorageGateway, MediaGrant};
pub use gateway::{
    SigningError, StorageError, StorageGateway, StoragePath, TemporaryUrl, PLAYBACK_TTL,
    TRANSCRIPTION_HANDOFF_TTL,
};
