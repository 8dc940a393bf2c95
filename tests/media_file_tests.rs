// Integration tests for the media probe and the WAV file capture backend.

use std::path::Path;
use std::time::Duration;
use story_capture::capture::{
    probe_media, CaptureError, CaptureMode, RecordingSession, WavCaptureFactory, WavFileBackend,
};
use story_capture::CaptureBackendFactory;
use tempfile::TempDir;

fn write_wav(path: &Path, seconds: f64) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let samples = (seconds * 16000.0) as usize;
    for i in 0..samples {
        writer.write_sample(((i % 100) as i16) * 50).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn probe_reports_duration_and_format() {
    let temp = TempDir::new().unwrap();
    let wav_path = temp.path().join("sample.wav");
    write_wav(&wav_path, 1.0);

    let bytes = std::fs::read(&wav_path).unwrap();
    let info = probe_media(&bytes, Some("wav")).unwrap();

    let duration = info.duration_seconds.expect("wav reports duration");
    assert!(
        (duration - 1.0).abs() < 0.05,
        "expected ~1s, got {duration}s"
    );
    assert_eq!(info.sample_rate, Some(16000));
    assert_eq!(info.channels, Some(1));
}

#[test]
fn probe_rejects_garbage() {
    assert!(probe_media(&[0u8; 32], Some("wav")).is_err());
}

#[tokio::test]
async fn wav_backend_streams_the_whole_file() {
    let temp = TempDir::new().unwrap();
    let wav_path = temp.path().join("take.wav");
    write_wav(&wav_path, 0.5);
    let expected = std::fs::read(&wav_path).unwrap();

    let backend = WavFileBackend::new(&wav_path);
    let mut session = RecordingSession::new(CaptureMode::Audio, None)
        .with_audio_preferences(vec!["audio/wav".to_string()]);

    session.start(Box::new(backend)).await.unwrap();
    // Let the feeder deliver the file before stopping.
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.stop().await.unwrap();

    let blob = session.blob().expect("finalized take");
    assert_eq!(blob.mime_type, "audio/wav");
    assert_eq!(blob.bytes, expected);
}

#[tokio::test]
async fn missing_file_reads_as_failed_acquisition() {
    let backend = WavFileBackend::new("/nonexistent/take.wav");
    let mut session = RecordingSession::new(CaptureMode::Audio, None)
        .with_audio_preferences(vec!["audio/wav".to_string()]);

    let err = session.start(Box::new(backend)).await.unwrap_err();
    assert!(matches!(err, CaptureError::PermissionDenied(_)));
    assert_eq!(session.state_name(), "Idle");
}

#[tokio::test]
async fn factory_refuses_video_mode() {
    let factory = WavCaptureFactory::new("unused.wav");
    assert!(factory.create(CaptureMode::Video).is_err());
    assert!(factory.create(CaptureMode::Audio).is_ok());
}
