//! MIME negotiation for recording starts.
//!
//! The container is chosen once, at recording start, by probing a fixed
//! preference order and taking the first type the capture backend supports.

/// Audio container preference, most broadly playable first.
pub const AUDIO_MIME_PREFERENCES: &[&str] =
    &["audio/mp4", "audio/webm;codecs=opus", "audio/webm"];

/// Order-preserving first-match selection over a preference list.
///
/// Returns the first candidate the probe accepts; a later entry is never
/// selected while an earlier one is supported.
pub fn select_mime_type<'a>(
    candidates: &[&'a str],
    supports: impl Fn(&str) -> bool,
) -> Option<&'a str> {
    candidates.iter().copied().find(|m| supports(m))
}

/// File extension for a storage key, matching the declared encoding.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let base = mime_type.split(';').next().unwrap_or(mime_type).trim();
    match base {
        "audio/mp4" => "m4a",
        "audio/webm" | "video/webm" => "webm",
        "video/mp4" => "mp4",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "text/plain" => "txt",
        _ => "bin",
    }
}
