use anyhow::{anyhow, Context, Result};
use std::io::Cursor;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Finished, immutable recording output.
///
/// Produced once when a recording session finalizes; ownership transfers to
/// the save flow and the bytes are never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Wall-clock seconds counted while recording. The encoder's own notion
    /// of duration may diverge slightly; callers must not assume equality.
    pub duration_seconds: u64,
}

impl MediaBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Advisory metadata recovered from an uploaded media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub duration_seconds: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
}

/// Probe an uploaded media buffer for duration and format details.
///
/// Best-effort: the result only enriches logs and metadata, so callers
/// treat errors as advisory rather than fatal to the upload.
pub fn probe_media(bytes: &[u8], extension_hint: Option<&str>) -> Result<MediaInfo> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("unrecognized media container")?;

    let format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("media has no default track"))?;
    let params = &track.codec_params;

    let duration_seconds = match (params.time_base, params.n_frames) {
        (Some(time_base), Some(frames)) => {
            let time = time_base.calc_time(frames);
            Some(time.seconds as f64 + time.frac)
        }
        _ => None,
    };

    let info = MediaInfo {
        duration_seconds,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
    };
    debug!(
        "probed media: duration {:?}s, {:?} Hz, {:?} channels",
        info.duration_seconds, info.sample_rate, info.channels
    );

    Ok(info)
}
